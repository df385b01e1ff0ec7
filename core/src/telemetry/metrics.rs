use std::sync::Mutex;

/// Counters shared by the tracker and the alert composer.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_received: usize,
    pub location_faults: usize,
    pub alerts_triggered: usize,
    pub mail_handoffs: usize,
    pub relay_delivered: usize,
    pub relay_failed: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn bump(&self, field: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            field(&mut metrics);
        }
    }

    pub fn record_sample(&self) {
        self.bump(|m| m.samples_received += 1);
    }

    pub fn record_location_fault(&self) {
        self.bump(|m| m.location_faults += 1);
    }

    pub fn record_alert(&self) {
        self.bump(|m| m.alerts_triggered += 1);
    }

    pub fn record_mail_handoff(&self) {
        self.bump(|m| m.mail_handoffs += 1);
    }

    pub fn record_relay(&self, delivered: bool) {
        if delivered {
            self.bump(|m| m.relay_delivered += 1);
        } else {
            self.bump(|m| m.relay_failed += 1);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
