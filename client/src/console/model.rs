use chrono::{DateTime, Utc};
use safetrackcore::alert::RelayRequest;
use serde::{Deserialize, Serialize};

/// Alert accepted by the local relay sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedAlert {
    pub received_at: DateTime<Utc>,
    pub request: RelayRequest,
}

impl ReceivedAlert {
    pub fn now(request: RelayRequest) -> Self {
        Self {
            received_at: Utc::now(),
            request,
        }
    }

    pub fn recipient_count(&self) -> usize {
        self.request.emails.len() + self.request.tele_ids.len()
    }
}
