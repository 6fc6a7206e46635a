use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::{Pass, PassStatus};
use crate::scheduler::Window;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("{station_id}: pass of {satellite_id} at {start} overlaps the committed schedule")]
    Overlap {
        station_id: String,
        satellite_id: String,
        start: DateTime<Utc>,
    },
}

/// A finalized pass on a station timeline
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScheduledPass {
    pub satellite_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: PassStatus,
    /// Station the pass asked for
    pub requested_station_id: String,
    pub requested: Window,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_elevation_deg: Option<f64>,
}

impl ScheduledPass {
    pub fn new(pass: &Pass, window: Window, status: PassStatus) -> Self {
        Self {
            satellite_id: pass.satellite_id.clone(),
            start: window.start,
            end: window.end,
            status,
            requested_station_id: pass.station_id.clone(),
            requested: pass.window(),
            max_elevation_deg: pass.max_elevation_deg,
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }

    pub fn is_shifted(&self) -> bool {
        self.window() != self.requested
    }
}

/// Conflict-free schedule of one ground station, ordered by start time
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StationTimeline {
    station_id: String,
    committed: Vec<ScheduledPass>,
}

impl StationTimeline {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            committed: Vec::new(),
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn committed(&self) -> &[ScheduledPass] {
        &self.committed
    }

    /// Committed windows intersecting `window`
    pub fn busy_within(&self, window: Window) -> impl Iterator<Item = Window> + '_ {
        let first = self.committed.partition_point(|c| c.end <= window.start);
        self.committed[first..]
            .iter()
            .take_while(move |c| c.start < window.end)
            .map(ScheduledPass::window)
    }

    pub fn is_free(&self, window: Window) -> bool {
        self.busy_within(window).next().is_none()
    }

    /// Insert keeping start order. Commits may arrive out of order since
    /// offloaded passes can land ahead of the sweep position.
    pub fn commit(&mut self, entry: ScheduledPass) -> Result<(), TimelineError> {
        if !self.is_free(entry.window()) {
            return Err(TimelineError::Overlap {
                station_id: self.station_id.clone(),
                satellite_id: entry.satellite_id,
                start: entry.start,
            });
        }
        let idx = self.committed.partition_point(|c| c.start < entry.start);
        self.committed.insert(idx, entry);
        Ok(())
    }

    pub fn total_contact(&self) -> Duration {
        self.committed
            .iter()
            .fold(Duration::zero(), |acc, c| acc + c.window().duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn scheduled(sat: &str, a: (u32, u32), b: (u32, u32)) -> ScheduledPass {
        let pass = Pass::new(sat, "gs-1", at(a.0, a.1), at(b.0, b.1));
        ScheduledPass::new(&pass, pass.window(), PassStatus::Scheduled)
    }

    #[test]
    fn commits_out_of_order_stay_sorted() {
        let mut timeline = StationTimeline::new("gs-1");
        timeline.commit(scheduled("sat-b", (10, 20), (10, 30))).unwrap();
        timeline.commit(scheduled("sat-a", (10, 0), (10, 10))).unwrap();
        timeline.commit(scheduled("sat-c", (10, 10), (10, 20))).unwrap();

        let sats: Vec<_> = timeline
            .committed()
            .iter()
            .map(|c| c.satellite_id.as_str())
            .collect();
        assert_eq!(sats, vec!["sat-a", "sat-c", "sat-b"]);
        assert_eq!(timeline.total_contact(), Duration::minutes(30));
    }

    #[test]
    fn overlapping_commit_is_refused() {
        let mut timeline = StationTimeline::new("gs-1");
        timeline.commit(scheduled("sat-a", (10, 0), (10, 10))).unwrap();

        let result = timeline.commit(scheduled("sat-b", (10, 5), (10, 15)));
        assert!(matches!(result, Err(TimelineError::Overlap { .. })));
        assert_eq!(timeline.committed().len(), 1);
    }

    #[test]
    fn busy_within_reports_only_intersections() {
        let mut timeline = StationTimeline::new("gs-1");
        timeline.commit(scheduled("sat-a", (9, 0), (9, 10))).unwrap();
        timeline.commit(scheduled("sat-b", (10, 0), (10, 10))).unwrap();

        let request = Window::new(at(10, 5), at(10, 15));
        let busy: Vec<_> = timeline.busy_within(request).collect();
        assert_eq!(busy, vec![Window::new(at(10, 0), at(10, 10))]);
        assert!(timeline.is_free(Window::new(at(10, 10), at(10, 15))));
    }
}
