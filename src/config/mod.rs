//! Configuration module for Warnguard.
//!
//! Process configuration comes from environment variables. Moderation
//! settings, captions and the trigger rule sets come from JSON files and
//! can be reloaded as a whole while the bot is running.

mod captions;
mod context;
mod settings;
mod triggers;

pub use captions::Captions;
pub use context::{ConfigContext, Snapshot};
pub use settings::{ReplyFormat, Settings};
pub use triggers::{IllegalTrigger, Trigger};

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    MissingVar(&'static str),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    // Data files
    pub settings_path: PathBuf,
    pub triggers_path: PathBuf,
    pub illegal_triggers_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path_var = |name: &str, default: &str| {
            PathBuf::from(env::var(name).unwrap_or_else(|_| default.to_string()))
        };

        Ok(Self {
            bot_token: env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingVar("BOT_TOKEN"))?,
            mongodb_uri: env::var("MONGODB_URI")
                .map_err(|_| ConfigError::MissingVar("MONGODB_URI"))?,
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "warnguard".to_string()),
            settings_path: path_var("SETTINGS_PATH", "data/settings.json"),
            triggers_path: path_var("TRIGGERS_PATH", "data/triggers.json"),
            illegal_triggers_path: path_var("ILLEGAL_TRIGGERS_PATH", "data/illegal_triggers.json"),
        })
    }
}
