use crate::location::PositionSample;
use crate::settings::ContactSettings;

/// OpenStreetMap link centred on the position.
pub fn map_link(position: &PositionSample) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=18/{lat}/{lon}",
        lat = position.latitude,
        lon = position.longitude
    )
}

/// Human-readable alert text sent to contacts.
pub fn alert_body(message: &str, position: &PositionSample) -> String {
    let accuracy = position
        .rounded_accuracy()
        .map(|acc| format!("{}m", acc))
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{}\n\nCoordinates: {}, {}\nTime: {}\nAccuracy: {}\n\nMap: {}",
        message,
        position.latitude,
        position.longitude,
        position.time_label(),
        accuracy,
        map_link(position)
    )
}

/// Text of the single retained alert log. Outcome lines are only ever
/// appended after the initial record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertLogEntry {
    text: String,
}

impl AlertLogEntry {
    pub fn record(
        sent_at: &str,
        position: &PositionSample,
        emails: &[String],
        tele_ids: &[String],
        settings: &ContactSettings,
    ) -> Self {
        Self {
            text: format!(
                "EMERGENCY SENT\nTime: {}\nCoords: {},{}\nEmails: {}\nTeleIDs: {}\nMessage: {}\n\n",
                sent_at,
                position.latitude,
                position.longitude,
                emails.join(";"),
                tele_ids.join(";"),
                settings.message
            ),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub fn relay_success_line(response: &serde_json::Value) -> String {
    format!("\nServer response: {}", response)
}

pub fn relay_failure_line(detail: &str) -> String {
    format!("\nBackend send failed: {}", detail)
}
