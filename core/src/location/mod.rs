pub mod provider;
pub mod replay;
pub mod sample;

pub use provider::{LocationProvider, PositionStream};
pub use replay::{ReplayProvider, ReplayStep, ReplayTrack};
pub use sample::{LocationOptions, PositionSample};
