use std::collections::BTreeMap;

use chrono::Duration;

/// Contact time awarded to each satellite so far in a run.
#[derive(Debug, Clone, Default)]
pub struct SatelliteLedger {
    contact: BTreeMap<String, Duration>,
}

impl SatelliteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negative durations are ignored; totals never decrease.
    pub fn credit(&mut self, satellite_id: &str, duration: Duration) {
        if duration <= Duration::zero() {
            return;
        }
        *self
            .contact
            .entry(satellite_id.to_string())
            .or_insert_with(Duration::zero) += duration;
    }

    pub fn contact_of(&self, satellite_id: &str) -> Duration {
        self.contact
            .get(satellite_id)
            .copied()
            .unwrap_or_else(Duration::zero)
    }

    pub fn minutes_of(&self, satellite_id: &str) -> f64 {
        self.contact_of(satellite_id).num_milliseconds() as f64 / 60_000.0
    }
}
