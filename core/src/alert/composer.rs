use crate::alert::mail::{MailDraft, MailHandoff};
use crate::alert::message::{alert_body, relay_failure_line, relay_success_line, AlertLogEntry};
use crate::alert::notify::Notifier;
use crate::alert::relay::{RelayClient, RelayRequest};
use crate::location::sample::TIME_LABEL_FORMAT;
use crate::location::{LocationOptions, LocationProvider, PositionSample};
use crate::prelude::{SafetyError, SafetyResult};
use crate::settings::SettingsStore;
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::tracking::LatestPosition;
use chrono::Local;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const LOCATION_UNAVAILABLE_NOTICE: &str =
    "Unable to get location. Please enable location & try again.";
pub const CAPTURED_NOTICE: &str =
    "Emergency captured locally. Sending options will now be attempted.";
pub const RELAY_SUCCESS_NOTICE: &str = "Server send successful (email/telegram).";

/// Delivery surfaces used by the composer.
#[derive(Clone)]
pub struct AlertChannels {
    pub notifier: Arc<dyn Notifier>,
    pub mail: Arc<dyn MailHandoff>,
    pub relay: Arc<dyn RelayClient>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Delivered(Value),
    Failed(String),
}

/// What one alert invocation did locally, plus the detached relay task.
#[derive(Debug)]
pub struct AlertReport {
    pub position: PositionSample,
    pub log: AlertLogEntry,
    pub mail_handed_off: bool,
    relay: Option<JoinHandle<RelayOutcome>>,
}

impl AlertReport {
    pub fn relay_attempted(&self) -> bool {
        self.relay.is_some()
    }

    /// Waits for the relay task, if one was started.
    pub async fn settle(self) -> Option<RelayOutcome> {
        match self.relay {
            Some(handle) => Some(
                handle
                    .await
                    .unwrap_or_else(|err| RelayOutcome::Failed(err.to_string())),
            ),
            None => None,
        }
    }
}

/// Builds and dispatches emergency alerts from the latest known position.
pub struct AlertComposer {
    provider: Arc<dyn LocationProvider>,
    latest: LatestPosition,
    settings: SettingsStore,
    channels: AlertChannels,
    single_shot: LocationOptions,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl AlertComposer {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        latest: LatestPosition,
        settings: SettingsStore,
        channels: AlertChannels,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            provider,
            latest,
            settings,
            channels,
            single_shot: LocationOptions::single_shot(),
            metrics,
            logger: LogManager::new("alert"),
        }
    }

    pub fn with_single_shot(mut self, options: LocationOptions) -> Self {
        self.single_shot = options;
        self
    }

    /// Captures a position, logs the alert and attempts both delivery channels.
    ///
    /// Without a position nothing is logged or sent. Once the log is written,
    /// the mail handoff and the relay run independently of each other; the
    /// relay outcome is only ever appended to the log.
    pub async fn trigger_alert(&self) -> SafetyResult<AlertReport> {
        let position = match self.resolve_position().await {
            Ok(position) => position,
            Err(err) => {
                self.logger.warn(&format!("alert aborted: {}", err));
                self.channels.notifier.notify(LOCATION_UNAVAILABLE_NOTICE);
                return Err(SafetyError::LocationUnavailable(err.to_string()));
            }
        };
        self.metrics.record_alert();

        let contacts = self.settings.load_contacts();
        let emails = contacts.email_recipients();
        let tele_ids = contacts.telegram_recipients();
        let body = alert_body(contacts.message_or_default(), &position);

        let sent_at = Local::now().format(TIME_LABEL_FORMAT).to_string();
        let log = AlertLogEntry::record(&sent_at, &position, &emails, &tele_ids, &contacts);
        if let Err(err) = self.settings.replace_log(log.text()) {
            self.logger.error(&format!("writing alert log: {}", err));
        }
        self.channels.notifier.show_log(log.text());
        self.logger.record(&format!(
            "alert captured at {},{} for {} email / {} telegram recipients",
            position.latitude,
            position.longitude,
            emails.len(),
            tele_ids.len()
        ));
        self.channels.notifier.notify(CAPTURED_NOTICE);

        let mail_handed_off = self.hand_off_mail(&emails, body);

        let relay = if contacts.auto_send_backend {
            let request = RelayRequest::new(emails, tele_ids, contacts.message.clone(), &position);
            Some(self.spawn_relay(request))
        } else {
            None
        };

        Ok(AlertReport {
            position,
            log,
            mail_handed_off,
            relay,
        })
    }

    async fn resolve_position(&self) -> SafetyResult<PositionSample> {
        let known = self.latest.borrow().clone();
        if let Some(sample) = known {
            return Ok(sample);
        }

        let timeout = self.single_shot.timeout;
        self.logger.detail("no tracked position, requesting a single fix");
        match tokio::time::timeout(timeout, self.provider.current_position(self.single_shot)).await
        {
            Ok(result) => result,
            Err(_) => Err(SafetyError::LocationTimeout(timeout.as_millis() as u64)),
        }
    }

    fn hand_off_mail(&self, emails: &[String], body: String) -> bool {
        if emails.is_empty() {
            self.logger.warn("no emails configured for mailto");
            return false;
        }
        let draft = MailDraft::alert(emails.to_vec(), body);
        match self.channels.mail.hand_off(&draft) {
            Ok(()) => {
                self.metrics.record_mail_handoff();
                true
            }
            Err(err) => {
                self.logger.error(&err.to_string());
                false
            }
        }
    }

    fn spawn_relay(&self, request: RelayRequest) -> JoinHandle<RelayOutcome> {
        let relay = self.channels.relay.clone();
        let notifier = self.channels.notifier.clone();
        let settings = self.settings.clone();
        let metrics = self.metrics.clone();
        let logger = self.logger.clone();

        tokio::spawn(async move {
            let (outcome, line) = match relay.send(&request).await {
                Ok(response) => {
                    notifier.notify(RELAY_SUCCESS_NOTICE);
                    let line = relay_success_line(&response);
                    (RelayOutcome::Delivered(response), line)
                }
                Err(err) => {
                    let detail = match err {
                        SafetyError::RelayFailed(detail) => detail,
                        other => other.to_string(),
                    };
                    logger.error(&format!("backend send failed: {}", detail));
                    let line = relay_failure_line(&detail);
                    notifier.notify(line.trim_start());
                    (RelayOutcome::Failed(detail), line)
                }
            };
            metrics.record_relay(matches!(outcome, RelayOutcome::Delivered(_)));
            match settings.append_log(&line) {
                Ok(updated) => notifier.show_log(&updated),
                Err(err) => logger.error(&format!("appending relay outcome: {}", err)),
            }
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::mail::ALERT_SUBJECT;
    use crate::location::{ReplayProvider, ReplayStep, ReplayTrack};
    use crate::settings::ContactSettings;
    use crate::testing::{Journal, JournalStore, RecordingMail, RecordingNotifier, StubRelay};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::watch;

    struct Harness {
        composer: AlertComposer,
        settings: SettingsStore,
        notifier: Arc<RecordingNotifier>,
        mail: Arc<RecordingMail>,
        relay: Arc<StubRelay>,
        journal: Journal,
        latest_tx: watch::Sender<Option<PositionSample>>,
    }

    fn harness(
        known: Option<PositionSample>,
        provider: ReplayProvider,
        contacts: ContactSettings,
        relay_answer: SafetyResult<Value>,
    ) -> Harness {
        let journal = Journal::default();
        let settings = SettingsStore::new(Arc::new(JournalStore::new(journal.clone())));
        settings.save_contacts(&contacts).unwrap();
        journal.clear();

        let notifier = Arc::new(RecordingNotifier::default());
        let mail = Arc::new(RecordingMail::new(journal.clone()));
        let relay = Arc::new(StubRelay::new(relay_answer, journal.clone()));
        let (tx, rx) = watch::channel(known);
        let composer = AlertComposer::new(
            Arc::new(provider),
            rx,
            settings.clone(),
            AlertChannels {
                notifier: notifier.clone(),
                mail: mail.clone(),
                relay: relay.clone(),
            },
            Arc::new(MetricsRecorder::new()),
        )
        .with_single_shot(LocationOptions::single_shot().with_timeout(Duration::from_millis(50)));

        Harness {
            composer,
            settings,
            notifier,
            mail,
            relay,
            journal,
            latest_tx: tx,
        }
    }

    fn ranchi() -> PositionSample {
        PositionSample::new(23.6102, 85.2799, Some(15.0))
    }

    fn stalled_provider() -> ReplayProvider {
        ReplayProvider::new(ReplayTrack::new(
            Duration::ZERO,
            vec![ReplayStep::Silence { millis: 60_000 }],
        ))
    }

    #[tokio::test]
    async fn tracked_position_is_logged_and_mailed_without_relay() {
        let h = harness(
            Some(ranchi()),
            stalled_provider(),
            ContactSettings::from_form("a@x.com", "", "", false),
            Ok(json!({})),
        );

        let report = h.composer.trigger_alert().await.unwrap();
        assert!(report.mail_handed_off);
        assert!(!report.relay_attempted());
        assert_eq!(report.settle().await, None);

        let log = h.settings.load_last_log();
        assert!(log.contains("23.6102,85.2799"));
        assert!(log.contains("a@x.com"));

        let drafts = h.mail.drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].subject, ALERT_SUBJECT);
        assert_eq!(drafts[0].recipients, vec!["a@x.com"]);
        assert!(drafts[0].body.starts_with("I need help. My location:"));
        assert!(h.relay.requests().is_empty());
        assert_eq!(h.notifier.messages(), vec![CAPTURED_NOTICE]);
    }

    #[tokio::test]
    async fn failed_single_shot_aborts_without_side_effects() {
        let h = harness(
            None,
            stalled_provider(),
            ContactSettings::from_form("a@x.com", "1", "help", true),
            Ok(json!({})),
        );

        let err = h.composer.trigger_alert().await.unwrap_err();
        assert!(matches!(err, SafetyError::LocationUnavailable(_)));
        assert_eq!(h.settings.last_log(), None);
        assert!(h.journal.entries().is_empty());
        assert!(h.mail.drafts().is_empty());
        assert!(h.relay.requests().is_empty());
        assert_eq!(h.notifier.messages(), vec![LOCATION_UNAVAILABLE_NOTICE]);
    }

    #[tokio::test]
    async fn single_shot_fix_is_used_when_nothing_is_tracked() {
        let provider = ReplayProvider::new(ReplayTrack::from_fixes(
            Duration::ZERO,
            &[(12.9716, 77.5946, None)],
        ));
        let h = harness(
            None,
            provider,
            ContactSettings::from_form("", "", "", false),
            Ok(json!({})),
        );

        let report = h.composer.trigger_alert().await.unwrap();
        assert_eq!(report.position.latitude, 12.9716);
        assert!(h.settings.load_last_log().contains("Coords: 12.9716,77.5946"));
    }

    #[tokio::test]
    async fn log_is_written_once_even_when_both_channels_are_skipped() {
        let h = harness(
            Some(ranchi()),
            stalled_provider(),
            ContactSettings::from_form("", "55", "help", false),
            Ok(json!({})),
        );

        let report = h.composer.trigger_alert().await.unwrap();
        assert!(!report.mail_handed_off);
        assert_eq!(h.journal.entries(), vec!["log"]);
        assert!(h.mail.drafts().is_empty());
        assert!(h.relay.requests().is_empty());
    }

    #[tokio::test]
    async fn log_write_precedes_both_send_attempts() {
        let h = harness(
            Some(ranchi()),
            stalled_provider(),
            ContactSettings::from_form("a@x.com", "55", "help", true),
            Ok(json!({"status": "queued"})),
        );

        let report = h.composer.trigger_alert().await.unwrap();
        let outcome = report.settle().await;
        assert_eq!(
            outcome,
            Some(RelayOutcome::Delivered(json!({"status": "queued"})))
        );
        assert_eq!(h.journal.entries(), vec!["log", "mail", "relay", "log"]);

        let log = h.settings.load_last_log();
        assert!(log.starts_with("EMERGENCY SENT\n"));
        assert!(log.ends_with("\nServer response: {\"status\":\"queued\"}"));
        assert!(h.notifier.messages().contains(&RELAY_SUCCESS_NOTICE.to_string()));

        let sent = h.relay.requests();
        assert_eq!(sent[0].emails, vec!["a@x.com"]);
        assert_eq!(sent[0].tele_ids, vec!["55"]);
        assert_eq!(sent[0].message, "help");
        assert_eq!(sent[0].coords.lat, 23.6102);
    }

    #[tokio::test]
    async fn relay_failure_is_appended_not_raised() {
        let h = harness(
            Some(ranchi()),
            stalled_provider(),
            ContactSettings::from_form("", "", "help", true),
            Err(SafetyError::RelayFailed("Server responded with 500".into())),
        );

        let report = h.composer.trigger_alert().await.unwrap();
        let initial = report.log.text().to_string();
        let outcome = report.settle().await;
        assert_eq!(
            outcome,
            Some(RelayOutcome::Failed("Server responded with 500".into()))
        );

        let log = h.settings.load_last_log();
        assert!(log.starts_with(&initial));
        assert!(log.ends_with("\nBackend send failed: Server responded with 500"));
        assert_eq!(
            h.notifier.messages().last().map(String::as_str),
            Some("Backend send failed: Server responded with 500")
        );
    }

    #[tokio::test]
    async fn later_position_updates_do_not_change_captured_position() {
        let h = harness(
            Some(ranchi()),
            stalled_provider(),
            ContactSettings::default(),
            Ok(json!({})),
        );
        let report = h.composer.trigger_alert().await.unwrap();
        h.latest_tx
            .send_replace(Some(PositionSample::new(0.0, 0.0, None)));
        assert_eq!(report.position.latitude, 23.6102);
    }

    #[tokio::test]
    async fn log_is_shown_when_written_and_again_after_relay() {
        let h = harness(
            Some(ranchi()),
            stalled_provider(),
            ContactSettings::from_form("a@x.com", "", "help", true),
            Ok(json!({"ok": true})),
        );

        let report = h.composer.trigger_alert().await.unwrap();
        assert_eq!(h.notifier.logs(), vec![report.log.text().to_string()]);

        report.settle().await;
        let shown = h.notifier.logs();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[1], h.settings.load_last_log());
    }
}
