use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Display format used for capture times shown to the user.
pub const TIME_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single position reading. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: Option<f64>) -> Self {
        Self::captured(latitude, longitude, accuracy_m, Utc::now())
    }

    pub fn captured(
        latitude: f64,
        longitude: f64,
        accuracy_m: Option<f64>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            captured_at,
        }
    }

    /// Accuracy in whole metres, or `None` when the reading carries no usable value.
    pub fn rounded_accuracy(&self) -> Option<i64> {
        self.accuracy_m
            .filter(|acc| acc.is_finite() && *acc > 0.0)
            .map(|acc| acc.round() as i64)
    }

    /// `"lat, lon (±Nm)"` with six decimals, as shown next to the map.
    pub fn coordinate_label(&self) -> String {
        match self.rounded_accuracy() {
            Some(acc) => format!(
                "{:.6}, {:.6} (±{}m)",
                self.latitude, self.longitude, acc
            ),
            None => format!("{:.6}, {:.6}", self.latitude, self.longitude),
        }
    }

    pub fn time_label(&self) -> String {
        self.captured_at
            .with_timezone(&Local)
            .format(TIME_LABEL_FORMAT)
            .to_string()
    }

    pub fn age(&self) -> Duration {
        (Utc::now() - self.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Request policy passed to the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    #[serde(with = "millis")]
    pub maximum_age: Duration,
    #[serde(with = "millis")]
    pub timeout: Duration,
}

impl LocationOptions {
    /// Continuous subscription: high accuracy, cached fixes up to 1 s, 10 s per reading.
    pub fn watch() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::from_millis(1000),
            timeout: Duration::from_millis(10_000),
        }
    }

    /// One-off request made when an alert fires without a known position.
    pub fn single_shot() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::ZERO,
            timeout: Duration::from_millis(10_000),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self::watch()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_label_rounds_accuracy() {
        let sample = PositionSample::new(23.6102, 85.2799, Some(14.6));
        assert_eq!(sample.coordinate_label(), "23.610200, 85.279900 (±15m)");
    }

    #[test]
    fn zero_accuracy_counts_as_unknown() {
        let sample = PositionSample::new(1.0, 2.0, Some(0.0));
        assert_eq!(sample.rounded_accuracy(), None);
        assert_eq!(sample.coordinate_label(), "1.000000, 2.000000");
    }

    #[test]
    fn presets_match_request_policy() {
        let watch = LocationOptions::watch();
        assert!(watch.high_accuracy);
        assert_eq!(watch.maximum_age, Duration::from_millis(1000));
        assert_eq!(watch.timeout, Duration::from_millis(10_000));
        assert_eq!(LocationOptions::single_shot().maximum_age, Duration::ZERO);
    }

    #[test]
    fn options_deserialize_from_milliseconds() {
        let opts: LocationOptions =
            serde_yaml::from_str("high_accuracy: false\nmaximum_age: 500\ntimeout: 2000\n")
                .unwrap();
        assert!(!opts.high_accuracy);
        assert_eq!(opts.timeout, Duration::from_secs(2));
    }
}
