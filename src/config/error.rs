//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Fold several validation messages into one error.
    pub(crate) fn from_messages(messages: Vec<String>) -> Option<Self> {
        match messages.len() {
            0 => None,
            1 => messages.into_iter().next().map(Self::Validation),
            _ => {
                let list = messages
                    .iter()
                    .map(|m| format!("\n  - {m}"))
                    .collect::<String>();
                Some(Self::Validation(format!("{} problems:{list}", messages.len())))
            }
        }
    }
}
