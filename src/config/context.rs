//! Reloadable moderation configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::{Config, ConfigError, IllegalTrigger, Settings, Trigger};

/// One consistent view of settings and rule sets.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub settings: Settings,
    pub triggers: Vec<Trigger>,
    pub illegal_triggers: Vec<IllegalTrigger>,
}

/// Holds the current [`Snapshot`] and swaps it atomically on reload.
///
/// Readers take an `Arc` to the snapshot, so a reload never changes the
/// rules in the middle of processing one event.
#[derive(Debug)]
pub struct ConfigContext {
    current: RwLock<Arc<Snapshot>>,
    paths: Option<Paths>,
}

#[derive(Debug)]
struct Paths {
    settings: PathBuf,
    triggers: PathBuf,
    illegal_triggers: PathBuf,
}

impl ConfigContext {
    /// Load settings and rule sets from the files named in `config`.
    pub fn load(config: &Config) -> Result<Self, ConfigError> {
        let paths = Paths {
            settings: config.settings_path.clone(),
            triggers: config.triggers_path.clone(),
            illegal_triggers: config.illegal_triggers_path.clone(),
        };
        let snapshot = read_snapshot(&paths)?;

        Ok(Self {
            current: RwLock::new(Arc::new(snapshot)),
            paths: Some(paths),
        })
    }

    /// Build a context from in-memory values (no reload source).
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            paths: None,
        }
    }

    /// Get the current snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Re-read every file and swap the snapshot.
    ///
    /// On error the previous snapshot stays active.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };

        let snapshot = read_snapshot(paths)?;
        info!(
            "Configuration reloaded: {} triggers, {} illegal triggers, {} registered chats",
            snapshot.triggers.len(),
            snapshot.illegal_triggers.len(),
            snapshot.settings.registered_chats.len()
        );
        *self.current.write() = Arc::new(snapshot);
        Ok(())
    }
}

fn read_snapshot(paths: &Paths) -> Result<Snapshot, ConfigError> {
    Ok(Snapshot {
        settings: read_json_or_default(&paths.settings)?,
        triggers: read_json_or_default(&paths.triggers)?,
        illegal_triggers: read_json_or_default(&paths.illegal_triggers)?,
    })
}

/// Missing files yield the default value; unreadable or invalid ones fail.
fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{} not found, using defaults", path.display());
            return Ok(T::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
