use crate::location::PositionSample;
use crate::prelude::{BoxFuture, SafetyError, SafetyResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayCoords {
    pub lat: f64,
    pub lon: f64,
    pub ts: String,
}

/// JSON body posted to the relay endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub emails: Vec<String>,
    pub tele_ids: Vec<String>,
    pub message: String,
    pub coords: RelayCoords,
}

impl RelayRequest {
    pub fn new(
        emails: Vec<String>,
        tele_ids: Vec<String>,
        message: String,
        position: &PositionSample,
    ) -> Self {
        Self {
            emails,
            tele_ids,
            message,
            coords: RelayCoords {
                lat: position.latitude,
                lon: position.longitude,
                ts: position.captured_at.to_rfc3339(),
            },
        }
    }
}

/// Backend that forwards an alert to email / messaging recipients.
pub trait RelayClient: Send + Sync {
    /// Sends once. Any 2xx answer yields its JSON body; everything else is `RelayFailed`.
    fn send<'a>(&'a self, request: &'a RelayRequest) -> BoxFuture<'a, SafetyResult<Value>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9000/api/send-emergency".into(),
            timeout_ms: 15_000,
        }
    }
}

/// Relay client posting JSON over HTTP.
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelay {
    pub fn new(config: &RelayConfig) -> SafetyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| SafetyError::RelayFailed(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, request: &RelayRequest) -> SafetyResult<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| SafetyError::RelayFailed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SafetyError::RelayFailed(format!(
                "Server responded with {}",
                status.as_u16()
            )));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| SafetyError::RelayFailed(format!("unreadable response: {}", err)))
    }
}

impl RelayClient for HttpRelay {
    fn send<'a>(&'a self, request: &'a RelayRequest) -> BoxFuture<'a, SafetyResult<Value>> {
        Box::pin(self.post(request))
    }
}
