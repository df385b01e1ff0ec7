use crate::prelude::{SafetyError, SafetyResult};
use crate::settings::contacts::ContactSettings;
use crate::settings::store::KeyValueStore;
use crate::telemetry::LogManager;
use std::sync::Arc;

pub const CONTACTS_KEY: &str = "safetrack_contacts_v1";
pub const LOG_KEY: &str = "safetrack_log_v1";

/// Text shown before any alert has been logged.
pub const EMPTY_LOG: &str = "No emergency sent yet.";

/// Owner of the contact settings and of the single retained alert log.
/// Writes replace the stored value outright; the last writer wins.
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
    logger: LogManager,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            logger: LogManager::new("settings"),
        }
    }

    /// Current contacts; a missing, unreadable or unparsable record yields defaults.
    pub fn load_contacts(&self) -> ContactSettings {
        let raw = match self.backend.get(CONTACTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ContactSettings::default(),
            Err(err) => {
                self.logger.warn(&format!("reading contacts: {}", err));
                return ContactSettings::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            self.logger
                .warn(&format!("discarding unparsable contacts record: {}", err));
            ContactSettings::default()
        })
    }

    pub fn save_contacts(&self, settings: &ContactSettings) -> SafetyResult<()> {
        let encoded =
            serde_json::to_string(settings).map_err(|err| SafetyError::Storage(err.to_string()))?;
        self.backend.set(CONTACTS_KEY, &encoded)
    }

    pub fn last_log(&self) -> Option<String> {
        self.backend.get(LOG_KEY).ok().flatten()
    }

    pub fn load_last_log(&self) -> String {
        self.last_log().unwrap_or_else(|| EMPTY_LOG.to_string())
    }

    /// Replaces the retained log with `text`.
    pub fn replace_log(&self, text: &str) -> SafetyResult<()> {
        self.backend.set(LOG_KEY, text)
    }

    /// Appends `line` to whatever log is stored now and returns the new text.
    pub fn append_log(&self, line: &str) -> SafetyResult<String> {
        let updated = format!("{}{}", self.load_last_log(), line);
        self.replace_log(&updated)?;
        Ok(updated)
    }
}
