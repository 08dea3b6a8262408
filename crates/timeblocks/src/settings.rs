//! TOML settings file.
//!
//! ```toml
//! [default]
//! hashing = "sha384"
//! publish = ["git", "shell"]
//! force_publish = false
//! log_file = "timestampblocks.log"
//! ignore_file = ".gitignore"
//! extra_ignore = ["*.tmp"]
//!
//! [channels.anchor]
//! protocol = "command"
//! program = "anchor-cli"
//! args = ["submit"]
//! ```
//!
//! `publish` also accepts a single space-separated string (`"git shell"`).

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use timeblocks_core::{HashAlgorithm, HistoryMode};
use timeblocks_publish::{Channel, PublisherRegistry};

use crate::config::{EngineConfig, DEFAULT_IGNORE_FILE, DEFAULT_LOG_FILE};
use crate::error::{EngineError, Result};

/// Default settings location, relative to the tree root.
pub const DEFAULT_SETTINGS_PATH: &str = ".timestampblocks/config.toml";

/// Top-level settings, parsed from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[default]` section.
    pub default: DefaultSection,
    /// `[channels.<name>]` tables.
    pub channels: BTreeMap<String, Channel>,
}

/// `[default]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSection {
    pub hashing: HashAlgorithm,
    #[serde(deserialize_with = "publish_list")]
    pub publish: Vec<String>,
    pub force_publish: bool,
    pub log_file: PathBuf,
    pub ignore_file: PathBuf,
    pub extra_ignore: Vec<String>,
    pub history: HistoryMode,
    pub lock_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

impl Default for DefaultSection {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            hashing: config.algorithm,
            publish: config.channels,
            force_publish: config.force_publish,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            ignore_file: PathBuf::from(DEFAULT_IGNORE_FILE),
            extra_ignore: Vec::new(),
            history: HistoryMode::default(),
            lock_timeout_secs: config.lock_timeout.as_secs(),
            publish_timeout_secs: config.publish_timeout.as_secs(),
        }
    }
}

fn publish_list<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Spaced(String),
        List(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Spaced(text) => text.split_whitespace().map(String::from).collect(),
        Raw::List(names) => names,
    })
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| EngineError::Configuration(e.to_string()))
    }

    /// Load settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = Self::from_toml(&text)?;
        debug!(path = %path.display(), channels = settings.channels.len(), "loaded settings");
        Ok(settings)
    }

    /// Load settings from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match path.try_exists() {
            Ok(true) => Self::load(path),
            Ok(false) => Ok(Self::default()),
            Err(e) => Err(EngineError::Configuration(format!(
                "cannot access {}: {e}",
                path.display()
            ))),
        }
    }

    /// Write the settings to `path`, creating its directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        write_file(path, &text).map_err(|e| {
            EngineError::Configuration(format!("cannot write {}: {e}", path.display()))
        })
    }

    /// Validate the configured channels and build the engine configuration.
    pub fn to_config(&self, root_dir: impl Into<PathBuf>) -> Result<EngineConfig> {
        for (name, channel) in &self.channels {
            channel
                .validate(name)
                .map_err(|e| EngineError::Configuration(e.to_string()))?;
        }

        let d = &self.default;
        Ok(EngineConfig {
            root_dir: root_dir.into(),
            algorithm: d.hashing,
            channels: d.publish.clone(),
            force_publish: d.force_publish,
            dry_run: false,
            log_path: d.log_file.clone(),
            ignore_path: d.ignore_file.clone(),
            extra_ignore: d.extra_ignore.clone(),
            history_mode: d.history,
            lock_timeout: Duration::from_secs(d.lock_timeout_secs),
            publish_timeout: Duration::from_secs(d.publish_timeout_secs),
        })
    }

    /// Builtin channels plus every `[channels.<name>]` table.
    pub fn registry(&self) -> Result<PublisherRegistry> {
        let mut registry = PublisherRegistry::with_builtins();
        for (name, channel) in &self.channels {
            registry
                .register_channel(name, channel.clone())
                .map_err(|e| EngineError::Configuration(e.to_string()))?;
        }
        Ok(registry)
    }
}

fn write_file(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full() {
        let settings = Settings::from_toml(
            r#"
            [default]
            hashing = "SHA384"
            publish = ["git", "anchor"]
            force_publish = true
            extra_ignore = ["*.tmp"]
            history = "all-tokens"

            [channels.anchor]
            protocol = "command"
            program = "anchor-cli"
            args = ["submit"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.default.hashing, HashAlgorithm::Sha384);
        assert_eq!(settings.default.publish, vec!["git", "anchor"]);
        assert!(settings.default.force_publish);
        assert_eq!(settings.default.history, HistoryMode::AllTokens);
        assert_eq!(settings.default.log_file, PathBuf::from(DEFAULT_LOG_FILE));
        assert_eq!(
            settings.channels["anchor"],
            Channel::Command {
                program: "anchor-cli".into(),
                args: vec!["submit".into()]
            }
        );

        let registry = settings.registry().unwrap();
        assert!(registry.contains("anchor"));
        assert!(registry.contains("git"));
    }

    #[test]
    fn test_space_separated_publish() {
        let settings = Settings::from_toml("[default]\npublish = \"git shell\"\n").unwrap();
        assert_eq!(settings.default.publish, vec!["git", "shell"]);
    }

    #[test]
    fn test_unknown_algorithm_is_configuration_error() {
        let err = Settings::from_toml("[default]\nhashing = \"md5\"\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_command_without_program_rejected() {
        let settings = Settings::from_toml(
            "[channels.broken]\nprotocol = \"command\"\nprogram = \"\"\n",
        )
        .unwrap();
        assert!(matches!(
            settings.to_config("."),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_PATH);

        let mut settings = Settings::default();
        settings.default.hashing = HashAlgorithm::Blake3;
        settings.channels.insert(
            "mirror".into(),
            Channel::Git {
                push: false,
                remote: Some("backup".into()),
            },
        );
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_to_config() {
        let config = Settings::default().to_config("/tree").unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/tree"));
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert!(!config.dry_run);
    }
}
