//! Core of the safetrack personal-safety client.
//!
//! A session follows the device position, keeps the latest fix in a single
//! slot, and on demand composes an emergency alert that is logged locally
//! before it is handed to the mail client and, optionally, a backend relay.

pub mod alert;
pub mod location;
pub mod prelude;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod tracking;

#[cfg(test)]
pub(crate) mod testing;

pub use prelude::{BoxFuture, SafetyError, SafetyResult};
pub use session::{SafetySession, SessionContext};
