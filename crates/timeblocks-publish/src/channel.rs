//! Channel definitions: the closed set of builtin publish protocols.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::CommandPublisher;
use crate::error::{PublishError, Result};
use crate::git::GitPublisher;
use crate::publisher::Publisher;
use crate::shell::ShellPublisher;

/// A builtin publish protocol and its options.
///
/// In settings files this is the body of a `[channels.<name>]` table, tagged
/// by its `protocol` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "kebab-case")]
pub enum Channel {
    /// Print the block report.
    Shell,

    /// Commit the tree and log, then optionally push.
    Git {
        #[serde(default = "default_push")]
        push: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remote: Option<String>,
    },

    /// Run an external program with the block in its environment.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

fn default_push() -> bool {
    true
}

impl Channel {
    /// The channel a bare builtin name refers to.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "shell" => Some(Channel::Shell),
            "git" => Some(Channel::Git {
                push: true,
                remote: None,
            }),
            _ => None,
        }
    }

    /// Protocol name as written in settings.
    pub fn protocol(&self) -> &'static str {
        match self {
            Channel::Shell => "shell",
            Channel::Git { .. } => "git",
            Channel::Command { .. } => "command",
        }
    }

    /// Check the options without building anything.
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            Channel::Command { program, .. } if program.trim().is_empty() => {
                Err(PublishError::InvalidChannel {
                    name: name.to_owned(),
                    reason: "command protocol needs a program".to_owned(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Build the publisher for this channel, registered as `name`.
    pub fn into_publisher(self, name: &str) -> Result<Arc<dyn Publisher>> {
        self.validate(name)?;
        Ok(match self {
            Channel::Shell => Arc::new(ShellPublisher::new(name)),
            Channel::Git { push, remote } => {
                Arc::new(GitPublisher::new(name).push(push).remote(remote))
            }
            Channel::Command { program, args } => {
                Arc::new(CommandPublisher::new(name, program, args))
            }
        })
    }
}
