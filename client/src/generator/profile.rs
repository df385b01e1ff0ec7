use anyhow::{ensure, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use safetrackcore::location::{ReplayStep, ReplayTrack};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const METRES_PER_DEGREE: f64 = 111_320.0;

/// Configuration for a synthetic walk used when no recorded track is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub heading_deg: f64,
    pub step_m: f64,
    pub fixes: usize,
    pub noise_m: f64,
    pub accuracy_m: f64,
    pub interval_ms: u64,
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            start_latitude: 23.3441,
            start_longitude: 85.3096,
            heading_deg: 45.0,
            step_m: 12.0,
            fixes: 8,
            noise_m: 4.0,
            accuracy_m: 10.0,
            interval_ms: 500,
            seed: 0,
        }
    }
}

fn jitter(rng: &mut StdRng, spread: f64) -> f64 {
    if spread > 0.0 {
        rng.gen_range(-spread..spread)
    } else {
        0.0
    }
}

/// Builds a straight walk with seeded GPS noise.
pub fn build_walk(config: &WalkConfig) -> anyhow::Result<ReplayTrack> {
    ensure!(
        (-90.0..=90.0).contains(&config.start_latitude),
        "start latitude {} out of range",
        config.start_latitude
    );
    let lat_scale = config.start_latitude.to_radians().cos();
    ensure!(lat_scale > 1e-6, "walks cannot start at a pole");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let heading = config.heading_deg.to_radians();
    let mut steps = Vec::with_capacity(config.fixes);

    for index in 0..config.fixes {
        let travelled = config.step_m * index as f64;
        let north = travelled * heading.cos() + jitter(&mut rng, config.noise_m);
        let east = travelled * heading.sin() + jitter(&mut rng, config.noise_m);
        let accuracy = config.accuracy_m + jitter(&mut rng, config.noise_m).abs();
        steps.push(ReplayStep::Fix {
            latitude: config.start_latitude + north / METRES_PER_DEGREE,
            longitude: config.start_longitude + east / (METRES_PER_DEGREE * lat_scale),
            accuracy: Some(accuracy),
        });
    }

    Ok(ReplayTrack::new(
        Duration::from_millis(config.interval_ms),
        steps,
    ))
}

/// Loads a recorded track from YAML.
pub fn load_track(path: &std::path::Path) -> anyhow::Result<ReplayTrack> {
    ReplayTrack::load(path).with_context(|| format!("loading track {}", path.display()))
}
