use crate::location::PositionSample;

/// Zoom used while following a live fix.
pub const FOLLOW_ZOOM: u8 = 16;

/// Map centre and zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

impl MapView {
    /// Fallback view shown before any position is known.
    pub const DEFAULT: MapView = MapView {
        latitude: 23.6102,
        longitude: 85.2799,
        zoom: 7,
    };

    pub fn follow(sample: &PositionSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            zoom: FOLLOW_ZOOM,
        }
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Rendering surface for the map, the position marker and the status labels.
pub trait MapPresenter: Send + Sync {
    fn set_tracking(&self, active: bool);
    fn show_position(&self, sample: &PositionSample);
    fn show_address(&self, label: &str);
    fn set_view(&self, view: MapView);
}
