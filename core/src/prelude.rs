use std::future::Future;
use std::pin::Pin;

pub use crate::alert::{AlertComposer, AlertReport, MailHandoff, Notifier, RelayClient};
pub use crate::location::{LocationOptions, LocationProvider, PositionSample};
pub use crate::settings::{ContactSettings, KeyValueStore, SettingsStore};
pub use crate::tracking::{MapPresenter, PositionTracker, ReverseGeocoder, TrackingMode};

/// Boxed future returned by the asynchronous collaborator seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Common error type for tracking, alerting and persistence.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SafetyError {
    #[error("location capability unavailable")]
    CapabilityUnavailable,
    #[error("location request timed out after {0} ms")]
    LocationTimeout(u64),
    #[error("location error: {0}")]
    LocationError(String),
    #[error("location unavailable: {0}")]
    LocationUnavailable(String),
    #[error("reverse geocode lookup failed: {0}")]
    GeocodeLookupFailed(String),
    #[error("relay failed: {0}")]
    RelayFailed(String),
    #[error("mail handoff failed: {0}")]
    MailHandoff(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type SafetyResult<T> = Result<T, SafetyError>;
