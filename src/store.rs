//! Small persistent key-value store and the lifetime burn counter kept in it

use crate::error::{PhotoBurnError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key under which the lifetime number of burned items is stored
pub const BURN_COUNT_KEY: &str = "burntPhotos";

/// String-valued storage that survives restarts
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store backed by a JSON object on disk (~/.config/photoburn/store.json)
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("photoburn").join("store.json"))
    }

    /// Opens the store at the platform config location
    pub fn open_default() -> Result<Self> {
        let path = Self::default_path().ok_or_else(|| {
            PhotoBurnError::ConfigError("Could not determine config directory".to_string())
        })?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            PhotoBurnError::ConfigError(format!("Failed to read store file: {}", e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            PhotoBurnError::ConfigError(format!("Failed to parse store file: {}", e))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking every later write
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PhotoBurnError::ConfigError(format!("Failed to create store directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(&entries).map_err(|e| {
            PhotoBurnError::ConfigError(format!("Failed to serialize store: {}", e))
        })?;

        fs::write(&self.path, contents).map_err(|e| {
            PhotoBurnError::ConfigError(format!("Failed to write store file: {}", e))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Lifetime count of burned items.
///
/// Storage problems never interrupt swiping: unreadable values count as zero
/// and failed writes are logged.
pub struct BurnCounter {
    store: Box<dyn KeyValueStore + Send>,
    count: u64,
}

impl BurnCounter {
    pub fn load(store: Box<dyn KeyValueStore + Send>) -> Self {
        let count = match store.get(BURN_COUNT_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                warn!(value = %raw, error = %e, "Ignoring unreadable burn count");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!(error = %e, "Could not load burn count");
                0
            }
        };
        debug!(count, "Loaded burn count");

        Self { store, count }
    }

    pub fn in_memory() -> Self {
        Self::load(Box::new(MemoryStore::default()))
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Bumps the count and writes it through
    pub fn increment(&mut self) -> u64 {
        self.count = self.count.saturating_add(1);
        if let Err(e) = self.store.set(BURN_COUNT_KEY, &self.count.to_string()) {
            warn!(error = %e, "Could not persist burn count");
        }
        self.count
    }
}
