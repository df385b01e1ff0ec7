use crate::prelude::{BoxFuture, SafetyError, SafetyResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Address label shown when no lookup result is available.
pub const ADDRESS_PLACEHOLDER: &str = "-";

/// Turns coordinates into a human-readable address.
pub trait ReverseGeocoder: Send + Sync {
    fn lookup(&self, latitude: f64, longitude: f64) -> BoxFuture<'_, SafetyResult<String>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nominatim.openstreetmap.org".into(),
            user_agent: concat!("safetrack/", env!("CARGO_PKG_VERSION")).into(),
            timeout_ms: 5000,
        }
    }
}

/// Reverse lookup against a Nominatim `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> SafetyResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| SafetyError::GeocodeLookupFailed(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn reverse(&self, latitude: f64, longitude: f64) -> SafetyResult<String> {
        let failed = |err: reqwest::Error| SafetyError::GeocodeLookupFailed(err.to_string());
        let body = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await
            .map_err(failed)?
            .error_for_status()
            .map_err(failed)?
            .json::<Value>()
            .await
            .map_err(failed)?;
        display_name(&body)
    }
}

fn display_name(body: &Value) -> SafetyResult<String> {
    body.get("display_name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SafetyError::GeocodeLookupFailed("no display_name in response".into()))
}

impl ReverseGeocoder for NominatimGeocoder {
    fn lookup(&self, latitude: f64, longitude: f64) -> BoxFuture<'_, SafetyResult<String>> {
        Box::pin(self.reverse(latitude, longitude))
    }
}

/// Geocoder used when lookups are switched off; every lookup is absent.
pub struct DisabledGeocoder;

impl ReverseGeocoder for DisabledGeocoder {
    fn lookup(&self, _latitude: f64, _longitude: f64) -> BoxFuture<'_, SafetyResult<String>> {
        Box::pin(async { Err(SafetyError::GeocodeLookupFailed("lookups disabled".into())) })
    }
}
