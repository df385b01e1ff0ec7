use crate::alert::{AlertChannels, AlertComposer, AlertReport, MailHandoff, Notifier, RelayClient};
use crate::location::{LocationOptions, LocationProvider, PositionSample};
use crate::prelude::SafetyResult;
use crate::settings::{ContactSettings, KeyValueStore, SettingsStore};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use crate::tracking::{MapPresenter, MapView, PositionTracker, ReverseGeocoder, TrackingMode};
use std::sync::Arc;

pub const SAVED_NOTICE: &str = "Saved contacts & settings.";

/// Collaborators a session is built from.
#[derive(Clone)]
pub struct SessionContext {
    pub provider: Arc<dyn LocationProvider>,
    pub presenter: Arc<dyn MapPresenter>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub notifier: Arc<dyn Notifier>,
    pub mail: Arc<dyn MailHandoff>,
    pub relay: Arc<dyn RelayClient>,
    pub store: Arc<dyn KeyValueStore>,
    pub watch_options: LocationOptions,
    pub single_shot_options: LocationOptions,
}

/// One running client: the tracker, the alert composer and the settings they share.
pub struct SafetySession {
    tracker: PositionTracker,
    composer: AlertComposer,
    settings: SettingsStore,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl SafetySession {
    pub fn new(context: SessionContext) -> Self {
        let metrics = Arc::new(MetricsRecorder::new());
        let settings = SettingsStore::new(context.store);
        let tracker = PositionTracker::new(
            context.provider.clone(),
            context.presenter,
            context.geocoder,
            context.notifier.clone(),
            context.watch_options,
            metrics.clone(),
        );
        let composer = AlertComposer::new(
            context.provider,
            tracker.subscribe(),
            settings.clone(),
            AlertChannels {
                notifier: context.notifier.clone(),
                mail: context.mail,
                relay: context.relay,
            },
            metrics.clone(),
        )
        .with_single_shot(context.single_shot_options);

        Self {
            tracker,
            composer,
            settings,
            notifier: context.notifier,
            metrics,
            logger: LogManager::new("session"),
        }
    }

    pub fn start_tracking(&mut self) -> SafetyResult<()> {
        self.tracker.start()
    }

    pub fn stop_tracking(&mut self) {
        self.tracker.stop();
    }

    pub fn toggle_tracking(&mut self) -> SafetyResult<TrackingMode> {
        self.tracker.toggle()
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.tracker.mode()
    }

    pub fn latest_position(&self) -> Option<PositionSample> {
        self.tracker.latest()
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn recenter(&self) -> MapView {
        self.tracker.recenter()
    }

    pub async fn trigger_alert(&self) -> SafetyResult<AlertReport> {
        self.composer.trigger_alert().await
    }

    pub fn contacts(&self) -> ContactSettings {
        self.settings.load_contacts()
    }

    /// Persists `contacts` and confirms to the user.
    pub fn save_contacts(&self, contacts: &ContactSettings) -> SafetyResult<()> {
        self.settings.save_contacts(contacts)?;
        self.notifier.notify(SAVED_NOTICE);
        Ok(())
    }

    pub fn last_log(&self) -> String {
        self.settings.load_last_log()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stops tracking and drops the held sample. Alerts already in flight keep running.
    pub fn shutdown(mut self) -> MetricsSnapshot {
        self.tracker.stop();
        self.tracker.reset();
        let snapshot = self.metrics.snapshot();
        self.logger.record(&format!(
            "session closed: {} samples, {} alerts",
            snapshot.samples_received, snapshot.alerts_triggered
        ));
        snapshot
    }
}
