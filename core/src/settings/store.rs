use crate::prelude::{SafetyError, SafetyResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// String key-value persistence that survives across sessions.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> SafetyResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> SafetyResult<()>;
}

/// Volatile store used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> SafetyError {
    SafetyError::Storage("store lock poisoned".into())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> SafetyResult<Option<String>> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SafetyResult<()> {
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store kept as a single JSON object on disk. Every write rewrites the file
/// through a sibling temp file so a crash never leaves it half written.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store, starting empty when the file is missing.
    pub fn open<P: AsRef<Path>>(path: P) -> SafetyResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                SafetyError::Storage(format!("parsing {}: {}", path.display(), err))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(SafetyError::Storage(format!(
                    "reading {}: {}",
                    path.display(),
                    err
                )))
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> SafetyResult<()> {
        let io_err =
            |err: std::io::Error| SafetyError::Storage(format!("{}: {}", self.path.display(), err));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let encoded = serde_json::to_string_pretty(entries)
            .map_err(|err| SafetyError::Storage(err.to_string()))?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, encoded).map_err(io_err)?;
        fs::rename(&staging, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> SafetyResult<Option<String>> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SafetyResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}
