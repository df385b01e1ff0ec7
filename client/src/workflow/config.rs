use crate::generator::profile::WalkConfig;
use anyhow::{ensure, Context};
use safetrackcore::alert::RelayConfig;
use safetrackcore::location::LocationOptions;
use safetrackcore::tracking::GeocoderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub watch: LocationOptions,
    pub single_shot: LocationOptions,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            watch: LocationOptions::watch(),
            single_shot: LocationOptions::single_shot(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub store_path: PathBuf,
    pub relay: RelayConfig,
    pub geocoder: GeocoderConfig,
    pub location: LocationConfig,
    pub walk: WalkConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("safetrack-store.json"),
            relay: RelayConfig::default(),
            geocoder: GeocoderConfig::default(),
            location: LocationConfig::default(),
            walk: WalkConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading client config {}", path_ref.display()))?;
        let config: ClientConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing client config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("checking client config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Location requests need a non-zero timeout.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.location.watch.timeout.is_zero(),
            "location.watch.timeout must be greater than zero"
        );
        ensure!(
            !self.location.single_shot.timeout.is_zero(),
            "location.single_shot.timeout must be greater than zero"
        );
        Ok(())
    }

    /// Loads `path` when given, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_path_yields_defaults() {
        let cfg = ClientConfig::load_or_default(None).unwrap();
        assert_eq!(cfg.location.watch.maximum_age, Duration::from_millis(1000));
        assert_eq!(cfg.relay.endpoint, "http://127.0.0.1:9000/api/send-emergency");
        assert!(cfg.geocoder.enabled);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"store_path: /tmp/st.json\nrelay:\n  endpoint: https://relay.example.com/api/send-emergency\ngeocoder:\n  enabled: false\nwalk:\n  fixes: 3\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ClientConfig::load(&path).unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/st.json"));
        assert_eq!(cfg.relay.timeout_ms, RelayConfig::default().timeout_ms);
        assert!(!cfg.geocoder.enabled);
        assert_eq!(cfg.walk.fixes, 3);
        assert_eq!(cfg.location, LocationConfig::default());
    }

    #[test]
    fn unreadable_config_reports_path() {
        let err = ClientConfig::load("/nonexistent/safetrack.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/safetrack.yaml"));
    }

    #[test]
    fn zero_location_timeout_is_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"location:\n  watch:\n    high_accuracy: true\n    maximum_age: 1000\n    timeout: 0\n")
            .unwrap();
        let path = temp.into_temp_path();
        let err = ClientConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("location.watch.timeout must be greater than zero"));
        assert!(ClientConfig::default().validate().is_ok());
    }
}
