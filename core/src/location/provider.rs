use crate::location::sample::{LocationOptions, PositionSample};
use crate::prelude::{BoxFuture, SafetyResult};
use tokio::sync::mpsc;

/// Stream of readings from a continuous subscription. Dropping the receiver
/// cancels the subscription.
pub type PositionStream = mpsc::Receiver<SafetyResult<PositionSample>>;

/// Buffered readings held for a slow consumer before the provider waits.
pub const STREAM_CAPACITY: usize = 16;

/// Platform location capability.
pub trait LocationProvider: Send + Sync {
    fn is_available(&self) -> bool;

    /// Starts a continuous subscription. Faults are delivered in-band so a
    /// failed reading does not end the stream.
    fn watch(&self, options: LocationOptions) -> SafetyResult<PositionStream>;

    /// Resolves a single reading.
    fn current_position(
        &self,
        options: LocationOptions,
    ) -> BoxFuture<'_, SafetyResult<PositionSample>>;
}
