use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::PassStatus;
use crate::scheduler::{ScheduleOutcome, Window};

/// Per-satellite summary of a scheduling run
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SatelliteStats {
    pub satellite_id: String,
    pub requested: usize,
    pub scheduled: usize,
    pub offloaded: usize,
    pub dropped: usize,
    /// Granted passes that were trimmed from their requested window
    pub shifted: usize,
    pub contact_minutes: f64,
    /// Mean idle time between consecutive granted contacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_gap_minutes: Option<f64>,
}

impl SatelliteStats {
    fn new(satellite_id: &str) -> Self {
        Self {
            satellite_id: satellite_id.to_string(),
            requested: 0,
            scheduled: 0,
            offloaded: 0,
            dropped: 0,
            shifted: 0,
            contact_minutes: 0.0,
            mean_gap_minutes: None,
        }
    }
}

pub fn satellite_stats(outcome: &ScheduleOutcome) -> Vec<SatelliteStats> {
    let mut stats: BTreeMap<&str, SatelliteStats> = BTreeMap::new();

    for pass in &outcome.passes {
        let entry = stats
            .entry(pass.satellite_id.as_str())
            .or_insert_with(|| SatelliteStats::new(&pass.satellite_id));
        entry.requested += 1;
        match pass.status {
            PassStatus::Scheduled => entry.scheduled += 1,
            PassStatus::Offloaded => entry.offloaded += 1,
            PassStatus::Dropped => entry.dropped += 1,
            PassStatus::Candidate => {}
        }
    }

    let mut contacts: BTreeMap<&str, Vec<Window>> = BTreeMap::new();
    for entry in outcome.timelines.iter().flat_map(|t| t.committed()) {
        contacts
            .entry(entry.satellite_id.as_str())
            .or_default()
            .push(entry.window());
        if entry.is_shifted() {
            if let Some(s) = stats.get_mut(entry.satellite_id.as_str()) {
                s.shifted += 1;
            }
        }
    }

    for (satellite_id, s) in stats.iter_mut() {
        s.contact_minutes = outcome.ledger.minutes_of(satellite_id);
        if let Some(windows) = contacts.get_mut(satellite_id) {
            s.mean_gap_minutes = mean_gap_minutes(windows);
        }
    }

    stats.into_values().collect()
}

fn mean_gap_minutes(windows: &mut [Window]) -> Option<f64> {
    if windows.len() < 2 {
        return None;
    }
    windows.sort_by_key(|w| w.start);
    let total: f64 = windows
        .windows(2)
        .map(|pair| Window::new(pair[0].end, pair[1].start).minutes().max(0.0))
        .sum();
    Some(total / (windows.len() - 1) as f64)
}
