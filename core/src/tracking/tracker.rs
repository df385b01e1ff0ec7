use crate::alert::Notifier;
use crate::location::{LocationOptions, LocationProvider, PositionSample, PositionStream};
use crate::prelude::{SafetyError, SafetyResult};
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::tracking::geocode::{ReverseGeocoder, ADDRESS_PLACEHOLDER};
use crate::tracking::presenter::{MapPresenter, MapView};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    Idle,
    Tracking,
}

/// Shared single-slot holder of the most recent fix.
pub type LatestPosition = watch::Receiver<Option<PositionSample>>;

/// Follows the provider's position stream and keeps only the newest sample.
pub struct PositionTracker {
    provider: Arc<dyn LocationProvider>,
    options: LocationOptions,
    mode: TrackingMode,
    task: Option<JoinHandle<()>>,
    sink: UpdateSink,
}

/// Everything the subscription task needs to apply one reading.
#[derive(Clone)]
struct UpdateSink {
    latest: Arc<watch::Sender<Option<PositionSample>>>,
    presenter: Arc<dyn MapPresenter>,
    geocoder: Arc<dyn ReverseGeocoder>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl PositionTracker {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        presenter: Arc<dyn MapPresenter>,
        geocoder: Arc<dyn ReverseGeocoder>,
        notifier: Arc<dyn Notifier>,
        options: LocationOptions,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            provider,
            options,
            mode: TrackingMode::Idle,
            task: None,
            sink: UpdateSink {
                latest: Arc::new(latest),
                presenter,
                geocoder,
                notifier,
                metrics,
                logger: LogManager::new("tracker"),
            },
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    pub fn latest(&self) -> Option<PositionSample> {
        self.sink.latest.borrow().clone()
    }

    /// Receiver observing every overwrite of the latest sample.
    pub fn subscribe(&self) -> LatestPosition {
        self.sink.latest.subscribe()
    }

    /// Starts the subscription. Must be called inside a tokio runtime.
    pub fn start(&mut self) -> SafetyResult<()> {
        if self.mode == TrackingMode::Tracking {
            return Ok(());
        }
        if !self.provider.is_available() {
            self.sink.logger.warn("location capability missing");
            self.sink.notifier.notify("Geolocation not supported");
            return Err(SafetyError::CapabilityUnavailable);
        }

        let stream = match self.provider.watch(self.options) {
            Ok(stream) => stream,
            Err(err) => {
                self.sink.fault(&err);
                return Err(err);
            }
        };

        self.sink.presenter.set_tracking(true);
        self.task = Some(tokio::spawn(follow(
            stream,
            self.sink.clone(),
            self.options.timeout,
        )));
        self.mode = TrackingMode::Tracking;
        self.sink.logger.record("tracking started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if self.mode == TrackingMode::Tracking {
            self.mode = TrackingMode::Idle;
            self.sink.presenter.set_tracking(false);
            self.sink.logger.record("tracking stopped");
        }
    }

    pub fn toggle(&mut self) -> SafetyResult<TrackingMode> {
        match self.mode {
            TrackingMode::Idle => self.start()?,
            TrackingMode::Tracking => self.stop(),
        }
        Ok(self.mode)
    }

    /// Centres the map on the latest fix, or on the default view when none is known.
    pub fn recenter(&self) -> MapView {
        let view = self
            .latest()
            .map(|sample| MapView::follow(&sample))
            .unwrap_or_default();
        self.sink.presenter.set_view(view);
        view
    }

    /// Clears the held sample.
    pub fn reset(&self) {
        self.sink.latest.send_replace(None);
    }

    #[cfg(test)]
    pub(crate) fn apply(&self, sample: PositionSample) {
        self.sink.accept(sample);
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn follow(mut stream: PositionStream, sink: UpdateSink, reading_timeout: Duration) {
    loop {
        match tokio::time::timeout(reading_timeout, stream.recv()).await {
            Ok(Some(Ok(sample))) => sink.accept(sample),
            Ok(Some(Err(err))) => sink.fault(&err),
            Ok(None) => {
                sink.logger.record("position stream closed");
                break;
            }
            Err(_) => sink.fault(&SafetyError::LocationTimeout(
                reading_timeout.as_millis() as u64,
            )),
        }
    }
}

impl UpdateSink {
    fn accept(&self, sample: PositionSample) {
        self.metrics.record_sample();
        self.latest.send_replace(Some(sample.clone()));
        self.presenter.show_position(&sample);
        self.presenter.set_view(MapView::follow(&sample));

        let geocoder = self.geocoder.clone();
        let presenter = self.presenter.clone();
        let logger = self.logger.clone();
        tokio::spawn(async move {
            let label = match geocoder.lookup(sample.latitude, sample.longitude).await {
                Ok(name) => name,
                Err(err) => {
                    logger.detail(&err.to_string());
                    ADDRESS_PLACEHOLDER.to_string()
                }
            };
            presenter.show_address(&label);
        });
    }

    fn fault(&self, err: &SafetyError) {
        self.metrics.record_location_fault();
        self.logger.warn(&err.to_string());
        self.notifier
            .notify(&format!("Error getting location: {}", err));
    }
}
