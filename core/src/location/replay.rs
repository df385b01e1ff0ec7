use crate::location::provider::{LocationProvider, PositionStream, STREAM_CAPACITY};
use crate::location::sample::{LocationOptions, PositionSample};
use crate::prelude::{BoxFuture, SafetyError, SafetyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

fn default_interval_ms() -> u64 {
    1000
}

/// One scripted event of a replayed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayStep {
    Fix {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        accuracy: Option<f64>,
    },
    Error {
        message: String,
    },
    /// No reading for the given time; long enough gaps trip the reading timeout.
    Silence {
        millis: u64,
    },
}

/// A recorded or synthetic track, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayTrack {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    pub steps: Vec<ReplayStep>,
}

impl ReplayTrack {
    pub fn new(interval: Duration, steps: Vec<ReplayStep>) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            steps,
        }
    }

    pub fn from_fixes(interval: Duration, fixes: &[(f64, f64, Option<f64>)]) -> Self {
        let steps = fixes
            .iter()
            .map(|&(latitude, longitude, accuracy)| ReplayStep::Fix {
                latitude,
                longitude,
                accuracy,
            })
            .collect();
        Self::new(interval, steps)
    }

    pub fn from_yaml_str(contents: &str) -> SafetyResult<Self> {
        serde_yaml::from_str(contents)
            .map_err(|err| SafetyError::LocationError(format!("invalid track: {}", err)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SafetyResult<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            SafetyError::LocationError(format!("reading track {}: {}", path_ref.display(), err))
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Location provider that replays a scripted track at a fixed interval.
pub struct ReplayProvider {
    track: ReplayTrack,
    available: bool,
    last_fix: Arc<Mutex<Option<PositionSample>>>,
}

impl ReplayProvider {
    pub fn new(track: ReplayTrack) -> Self {
        Self {
            track,
            available: true,
            last_fix: Arc::new(Mutex::new(None)),
        }
    }

    /// A provider standing in for a device without location support.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(ReplayTrack::new(Duration::ZERO, Vec::new()))
        }
    }

    pub fn track(&self) -> &ReplayTrack {
        &self.track
    }

    fn cached_fix(&self, maximum_age: Duration) -> Option<PositionSample> {
        if maximum_age.is_zero() {
            return None;
        }
        let guard = self.last_fix.lock().ok()?;
        guard
            .as_ref()
            .filter(|sample| sample.age() <= maximum_age)
            .cloned()
    }
}

fn remember(slot: &Mutex<Option<PositionSample>>, sample: &PositionSample) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(sample.clone());
    }
}

impl LocationProvider for ReplayProvider {
    fn is_available(&self) -> bool {
        self.available
    }

    fn watch(&self, _options: LocationOptions) -> SafetyResult<PositionStream> {
        if !self.available {
            return Err(SafetyError::CapabilityUnavailable);
        }

        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        let steps = self.track.steps.clone();
        let interval = self.track.interval();
        let last_fix = self.last_fix.clone();

        tokio::spawn(async move {
            for step in steps {
                tokio::time::sleep(interval).await;
                let item = match step {
                    ReplayStep::Fix {
                        latitude,
                        longitude,
                        accuracy,
                    } => {
                        let sample = PositionSample::new(latitude, longitude, accuracy);
                        remember(&last_fix, &sample);
                        Ok(sample)
                    }
                    ReplayStep::Error { message } => Err(SafetyError::LocationError(message)),
                    ReplayStep::Silence { millis } => {
                        tokio::time::sleep(Duration::from_millis(millis)).await;
                        continue;
                    }
                };
                if tx.send(item).await.is_err() {
                    // subscriber went away
                    return;
                }
            }
        });

        Ok(rx)
    }

    fn current_position(
        &self,
        options: LocationOptions,
    ) -> BoxFuture<'_, SafetyResult<PositionSample>> {
        Box::pin(async move {
            if !self.available {
                return Err(SafetyError::CapabilityUnavailable);
            }
            if let Some(cached) = self.cached_fix(options.maximum_age) {
                return Ok(cached);
            }

            tokio::time::sleep(self.track.interval()).await;
            for step in &self.track.steps {
                match step {
                    ReplayStep::Fix {
                        latitude,
                        longitude,
                        accuracy,
                    } => {
                        let sample = PositionSample::new(*latitude, *longitude, *accuracy);
                        remember(&self.last_fix, &sample);
                        return Ok(sample);
                    }
                    ReplayStep::Error { message } => {
                        return Err(SafetyError::LocationError(message.clone()));
                    }
                    ReplayStep::Silence { millis } => {
                        tokio::time::sleep(Duration::from_millis(*millis)).await;
                    }
                }
            }
            Err(SafetyError::LocationError("no fix available".into()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watch_replays_fixes_and_faults_in_order() {
        let track = ReplayTrack::new(
            Duration::from_millis(1),
            vec![
                ReplayStep::Fix {
                    latitude: 1.0,
                    longitude: 2.0,
                    accuracy: Some(5.0),
                },
                ReplayStep::Error {
                    message: "signal lost".into(),
                },
                ReplayStep::Fix {
                    latitude: 3.0,
                    longitude: 4.0,
                    accuracy: None,
                },
            ],
        );
        let provider = ReplayProvider::new(track);
        let mut stream = provider.watch(LocationOptions::watch()).unwrap();

        assert_eq!(stream.recv().await.unwrap().unwrap().latitude, 1.0);
        assert_eq!(
            stream.recv().await.unwrap().unwrap_err(),
            SafetyError::LocationError("signal lost".into())
        );
        assert_eq!(stream.recv().await.unwrap().unwrap().longitude, 4.0);
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn unavailable_provider_refuses_both_requests() {
        let provider = ReplayProvider::unavailable();
        assert!(!provider.is_available());
        assert_eq!(
            provider.watch(LocationOptions::watch()).unwrap_err(),
            SafetyError::CapabilityUnavailable
        );
        assert_eq!(
            provider
                .current_position(LocationOptions::single_shot())
                .await
                .unwrap_err(),
            SafetyError::CapabilityUnavailable
        );
    }

    #[tokio::test]
    async fn single_shot_reuses_recent_fix_within_maximum_age() {
        let provider = ReplayProvider::new(ReplayTrack::from_fixes(
            Duration::ZERO,
            &[(10.0, 20.0, Some(3.0))],
        ));
        let first = provider
            .current_position(LocationOptions::single_shot())
            .await
            .unwrap();
        let cached = provider
            .current_position(LocationOptions::watch())
            .await
            .unwrap();
        assert_eq!(first, cached);
    }

    #[test]
    fn track_parses_tagged_yaml_steps() {
        let yaml = "interval_ms: 250\nsteps:\n  - kind: fix\n    latitude: 23.6\n    longitude: 85.2\n    accuracy: 12\n  - kind: silence\n    millis: 15000\n  - kind: error\n    message: denied\n";
        let track = ReplayTrack::from_yaml_str(yaml).unwrap();
        assert_eq!(track.interval(), Duration::from_millis(250));
        assert_eq!(track.steps.len(), 3);
        assert_eq!(track.steps[1], ReplayStep::Silence { millis: 15000 });
    }
}
