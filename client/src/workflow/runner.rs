use crate::console::relay_sink::RelaySink;
use crate::console::surface::{ConsoleNotifier, ConsolePresenter, MailtoLauncher};
use crate::generator::profile::{build_walk, load_track};
use crate::workflow::config::ClientConfig;
use anyhow::Context;
use safetrackcore::alert::{HttpRelay, RelayOutcome};
use safetrackcore::location::{ReplayProvider, ReplayStep, ReplayTrack};
use safetrackcore::settings::{ContactSettings, JsonFileStore};
use safetrackcore::telemetry::MetricsSnapshot;
use safetrackcore::tracking::{DisabledGeocoder, NominatimGeocoder, ReverseGeocoder};
use safetrackcore::{SafetySession, SessionContext};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct AlertSummary {
    pub mail_handed_off: bool,
    pub relay: Option<RelayOutcome>,
    pub log: String,
}

pub struct TrackSummary {
    pub fixes: usize,
    pub metrics: MetricsSnapshot,
    pub alert: Option<AlertSummary>,
}

/// Changes requested for the stored contacts; `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct ContactsUpdate {
    pub emails: Option<String>,
    pub tele_ids: Option<String>,
    pub message: Option<String>,
    pub auto_send_backend: Option<bool>,
}

impl ContactsUpdate {
    pub fn apply(self, current: ContactSettings) -> ContactSettings {
        ContactSettings::from_form(
            &self.emails.unwrap_or(current.emails),
            &self.tele_ids.unwrap_or(current.tele_ids),
            &self.message.unwrap_or(current.message),
            self.auto_send_backend.unwrap_or(current.auto_send_backend),
        )
    }
}

#[derive(Clone)]
pub struct Runner {
    config: ClientConfig,
}

impl Runner {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    fn replay(&self, track: Option<&Path>) -> anyhow::Result<ReplayTrack> {
        match track {
            Some(path) => load_track(path),
            None => build_walk(&self.config.walk),
        }
    }

    fn session(&self, track: ReplayTrack, open_mail: bool) -> anyhow::Result<SafetySession> {
        let store = JsonFileStore::open(&self.config.store_path).with_context(|| {
            format!("opening store {}", self.config.store_path.display())
        })?;
        let geocoder: Arc<dyn ReverseGeocoder> = if self.config.geocoder.enabled {
            Arc::new(
                NominatimGeocoder::new(&self.config.geocoder).context("building geocoder")?,
            )
        } else {
            Arc::new(DisabledGeocoder)
        };
        let relay = HttpRelay::new(&self.config.relay).context("building relay client")?;

        Ok(SafetySession::new(SessionContext {
            provider: Arc::new(ReplayProvider::new(track)),
            presenter: Arc::new(ConsolePresenter),
            geocoder,
            notifier: Arc::new(ConsoleNotifier),
            mail: Arc::new(MailtoLauncher::new(open_mail)),
            relay: Arc::new(relay),
            store: Arc::new(store),
            watch_options: self.config.location.watch,
            single_shot_options: self.config.location.single_shot,
        }))
    }

    fn idle_session(&self) -> anyhow::Result<SafetySession> {
        self.session(ReplayTrack::new(Duration::ZERO, Vec::new()), false)
    }

    async fn fire(session: &SafetySession) -> anyhow::Result<AlertSummary> {
        let report = session.trigger_alert().await.context("triggering alert")?;
        let mail_handed_off = report.mail_handed_off;
        let relay = report.settle().await;
        Ok(AlertSummary {
            mail_handed_off,
            relay,
            log: session.last_log(),
        })
    }

    /// Follows a track until every fix is applied or Ctrl+C, optionally
    /// raising an alert once `alert_after` fixes have arrived.
    pub async fn track(
        &self,
        track: Option<&Path>,
        alert_after: Option<usize>,
        open_mail: bool,
    ) -> anyhow::Result<TrackSummary> {
        let replay = self.replay(track)?;
        let expected = replay
            .steps
            .iter()
            .filter(|step| matches!(step, ReplayStep::Fix { .. }))
            .count();

        let mut session = self.session(replay, open_mail)?;
        let mut latest = session.tracker().subscribe();
        session.start_tracking().context("starting tracking")?;

        let mut fixes = 0;
        let mut alert = None;
        while fixes < expected {
            tokio::select! {
                changed = latest.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    fixes = session.metrics().samples_received;
                    if alert.is_none() && alert_after.is_some_and(|n| fixes >= n) {
                        alert = Some(Self::fire(&session).await?);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("Interrupted, stopping tracking.");
                    break;
                }
            }
        }

        let metrics = session.shutdown();
        Ok(TrackSummary {
            fixes,
            metrics,
            alert,
        })
    }

    /// Raises one alert, resolving the position with a single request.
    pub async fn alert(&self, track: Option<&Path>, open_mail: bool) -> anyhow::Result<AlertSummary> {
        let session = self.session(self.replay(track)?, open_mail)?;
        Self::fire(&session).await
    }

    pub fn contacts(&self) -> anyhow::Result<ContactSettings> {
        Ok(self.idle_session()?.contacts())
    }

    pub fn update_contacts(&self, update: ContactsUpdate) -> anyhow::Result<ContactSettings> {
        let session = self.idle_session()?;
        let merged = update.apply(session.contacts());
        session
            .save_contacts(&merged)
            .context("saving contacts")?;
        Ok(merged)
    }

    pub fn last_log(&self) -> anyhow::Result<String> {
        Ok(self.idle_session()?.last_log())
    }

    pub async fn serve_relay(&self, bind: SocketAddr, reject: bool) -> anyhow::Result<usize> {
        let sink = RelaySink::new(reject);
        sink.run(bind).await?;
        Ok(sink.snapshot().len())
    }
}
