pub mod composer;
pub mod mail;
pub mod message;
pub mod notify;
pub mod relay;

pub use composer::{AlertChannels, AlertComposer, AlertReport, RelayOutcome};
pub use mail::{MailDraft, MailHandoff, ALERT_SUBJECT};
pub use message::AlertLogEntry;
pub use notify::Notifier;
pub use relay::{HttpRelay, RelayClient, RelayConfig, RelayCoords, RelayRequest};
