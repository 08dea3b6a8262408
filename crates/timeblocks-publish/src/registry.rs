//! Name-to-publisher registry.
//!
//! Builtin channels are registered up front; anything else (a ledger
//! client, a test double) comes in through [`PublisherRegistry::register`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::channel::Channel;
use crate::error::{PublishError, Result};
use crate::publisher::Publisher;

/// Publishers by channel name.
#[derive(Clone, Default)]
pub struct PublisherRegistry {
    publishers: BTreeMap<String, Arc<dyn Publisher>>,
}

impl PublisherRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `shell` and `git` channels.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for name in ["shell", "git"] {
            if let Some(channel) = Channel::builtin(name) {
                // Builtin channels always validate.
                if let Ok(publisher) = channel.into_publisher(name) {
                    registry.register(publisher);
                }
            }
        }
        registry
    }

    /// Register `publisher` under its own name, replacing any previous one.
    pub fn register(&mut self, publisher: Arc<dyn Publisher>) -> Option<Arc<dyn Publisher>> {
        let name = publisher.name().to_owned();
        debug!(channel = %name, "registered publisher");
        self.publishers.insert(name, publisher)
    }

    /// Build and register a configured channel.
    pub fn register_channel(&mut self, name: &str, channel: Channel) -> Result<()> {
        let publisher = channel.into_publisher(name)?;
        self.register(publisher);
        Ok(())
    }

    /// Whether a channel is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.publishers.contains_key(name)
    }

    /// Registered channel names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.publishers.keys().map(String::as_str)
    }

    /// Look up every name, in order. Fails on the first unknown name.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<dyn Publisher>>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.publishers
                    .get(name)
                    .cloned()
                    .ok_or_else(|| PublishError::UnknownChannel(name.to_owned()))
            })
            .collect()
    }
}

impl std::fmt::Debug for PublisherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.publishers.keys()).finish()
    }
}
