//! Recording doubles for the collaborator seams.

use crate::alert::{MailDraft, MailHandoff, Notifier, RelayClient, RelayRequest};
use crate::location::PositionSample;
use crate::prelude::{BoxFuture, SafetyError, SafetyResult};
use crate::settings::persisted::{CONTACTS_KEY, LOG_KEY};
use crate::settings::{KeyValueStore, MemoryStore};
use crate::tracking::{MapPresenter, MapView, ReverseGeocoder};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared, ordered record of side effects across doubles.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<&'static str>>>);

impl Journal {
    pub fn push(&self, entry: &'static str) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Memory store that journals every write.
pub struct JournalStore {
    inner: MemoryStore,
    journal: Journal,
}

impl JournalStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: MemoryStore::new(),
            journal,
        }
    }
}

impl KeyValueStore for JournalStore {
    fn get(&self, key: &str) -> SafetyResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> SafetyResult<()> {
        self.journal.push(match key {
            LOG_KEY => "log",
            CONTACTS_KEY => "contacts",
            _ => "other",
        });
        self.inner.set(key, value)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    logs: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Every log text shown, oldest first.
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn show_log(&self, log: &str) {
        self.logs.lock().unwrap().push(log.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    Tracking(bool),
    Position(PositionSample),
    Address(String),
    View(MapView),
}

#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: PresenterEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl MapPresenter for RecordingPresenter {
    fn set_tracking(&self, active: bool) {
        self.push(PresenterEvent::Tracking(active));
    }

    fn show_position(&self, sample: &PositionSample) {
        self.push(PresenterEvent::Position(sample.clone()));
    }

    fn show_address(&self, label: &str) {
        self.push(PresenterEvent::Address(label.to_string()));
    }

    fn set_view(&self, view: MapView) {
        self.push(PresenterEvent::View(view));
    }
}

/// Geocoder answering every lookup with the same label, or failing when `None`.
pub struct FixedGeocoder(pub Option<String>);

impl ReverseGeocoder for FixedGeocoder {
    fn lookup(&self, _latitude: f64, _longitude: f64) -> BoxFuture<'_, SafetyResult<String>> {
        let answer = self
            .0
            .clone()
            .ok_or_else(|| SafetyError::GeocodeLookupFailed("no address".into()));
        Box::pin(async move { answer })
    }
}

pub struct RecordingMail {
    drafts: Mutex<Vec<MailDraft>>,
    journal: Journal,
}

impl RecordingMail {
    pub fn new(journal: Journal) -> Self {
        Self {
            drafts: Mutex::new(Vec::new()),
            journal,
        }
    }

    pub fn drafts(&self) -> Vec<MailDraft> {
        self.drafts.lock().unwrap().clone()
    }
}

impl MailHandoff for RecordingMail {
    fn hand_off(&self, draft: &MailDraft) -> SafetyResult<()> {
        self.journal.push("mail");
        self.drafts.lock().unwrap().push(draft.clone());
        Ok(())
    }
}

/// Relay that records requests and always gives the same answer.
pub struct StubRelay {
    answer: SafetyResult<Value>,
    delay: Duration,
    requests: Mutex<Vec<RelayRequest>>,
    journal: Journal,
}

impl StubRelay {
    pub fn new(answer: SafetyResult<Value>, journal: Journal) -> Self {
        Self {
            answer,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            journal,
        }
    }

    /// Answers only after `delay` has passed.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<RelayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl RelayClient for StubRelay {
    fn send<'a>(&'a self, request: &'a RelayRequest) -> BoxFuture<'a, SafetyResult<Value>> {
        Box::pin(async move {
            self.journal.push("relay");
            self.requests.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answer.clone()
        })
    }
}
