pub mod geocode;
pub mod presenter;
pub mod tracker;

pub use geocode::{DisabledGeocoder, GeocoderConfig, NominatimGeocoder, ReverseGeocoder};
pub use presenter::{MapPresenter, MapView};
pub use tracker::{LatestPosition, PositionTracker, TrackingMode};
