use crate::prelude::SafetyResult;

pub const ALERT_SUBJECT: &str = "EMERGENCY - Need Help";

/// Pre-filled message handed to the platform mail client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailDraft {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl MailDraft {
    pub fn alert(recipients: Vec<String>, body: String) -> Self {
        Self {
            recipients,
            subject: ALERT_SUBJECT.to_string(),
            body,
        }
    }

    /// `mailto:` URI with recipients, subject and body component-encoded.
    pub fn to_mailto_uri(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            encode_component(&self.recipients.join(",")),
            encode_component(&self.subject),
            encode_component(&self.body)
        )
    }
}

/// One-way handoff to the mail-composition surface. Success only means the
/// draft was handed over; whether it is sent is never observed.
pub trait MailHandoff: Send + Sync {
    fn hand_off(&self, draft: &MailDraft) -> SafetyResult<()>;
}

/// Percent-encodes everything outside the URI component unreserved set.
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
