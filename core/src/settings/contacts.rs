use serde::{Deserialize, Serialize};

/// Message used when none is configured.
pub const DEFAULT_MESSAGE: &str = "I need help. My location:";

/// Contact configuration as persisted: recipient lists stay in their
/// comma-separated form and are parsed on use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactSettings {
    pub emails: String,
    pub tele_ids: String,
    pub message: String,
    pub auto_send_backend: bool,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            emails: String::new(),
            tele_ids: String::new(),
            message: DEFAULT_MESSAGE.to_string(),
            auto_send_backend: false,
        }
    }
}

impl ContactSettings {
    /// Builds settings from raw form input, trimming every text field.
    pub fn from_form(emails: &str, tele_ids: &str, message: &str, auto_send_backend: bool) -> Self {
        Self {
            emails: emails.trim().to_string(),
            tele_ids: tele_ids.trim().to_string(),
            message: message.trim().to_string(),
            auto_send_backend,
        }
    }

    pub fn email_recipients(&self) -> Vec<String> {
        parse_recipients(&self.emails)
    }

    pub fn telegram_recipients(&self) -> Vec<String> {
        parse_recipients(&self.tele_ids)
    }

    /// Configured message, or the built-in one when left blank.
    pub fn message_or_default(&self) -> &str {
        if self.message.is_empty() {
            DEFAULT_MESSAGE
        } else {
            &self.message
        }
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
/// Order and duplicates are kept; entries are not validated.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
