pub mod contacts;
pub mod persisted;
pub mod store;

pub use contacts::{parse_recipients, ContactSettings, DEFAULT_MESSAGE};
pub use persisted::{SettingsStore, EMPTY_LOG};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
