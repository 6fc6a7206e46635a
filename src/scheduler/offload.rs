use std::collections::BTreeMap;
use std::iter;

use chrono::Duration;

use crate::catalog::Pass;
use crate::scheduler::{DropReason, Occupancy, StationTimeline, Window};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offload {
    pub station_id: String,
    pub window: Window,
}

/// Finds room for a pass that lost its requested station.
///
/// Stations are tried in ascending id order and the first one with a
/// usable window wins. This is first-fit, not a global optimum: a later
/// loser may find its only option taken by an earlier offload.
#[derive(Debug, Clone)]
pub struct OffloadPlanner {
    min_contact: Duration,
}

impl OffloadPlanner {
    pub fn new(min_contact: Duration) -> Self {
        Self { min_contact }
    }

    /// A shifted window must last at least `min_contact`. The untouched
    /// request is always acceptable.
    pub fn accepts(&self, requested: &Window, window: &Window) -> bool {
        !window.is_empty() && (window == requested || window.duration() >= self.min_contact)
    }

    /// Largest part of the pass that `timeline` and the satellite both have free
    pub fn window_on(
        &self,
        pass: &Pass,
        timeline: Option<&StationTimeline>,
        satellite_busy: Option<&Occupancy>,
    ) -> Option<Window> {
        self.window_around(pass, timeline, satellite_busy, iter::empty())
    }

    /// Same as `window_on`, but also stays clear of `reserved`.
    pub fn window_around<I>(
        &self,
        pass: &Pass,
        timeline: Option<&StationTimeline>,
        satellite_busy: Option<&Occupancy>,
        reserved: I,
    ) -> Option<Window>
    where
        I: IntoIterator<Item = Window>,
    {
        let requested = pass.window();
        let station = timeline.into_iter().flat_map(|t| t.busy_within(requested));
        let satellite = satellite_busy
            .into_iter()
            .flat_map(|o| o.overlapping(requested));

        requested
            .largest_free(station.chain(satellite).chain(reserved))
            .filter(|w| self.accepts(&requested, w))
    }

    pub fn find_alternative(
        &self,
        pass: &Pass,
        timelines: &BTreeMap<String, StationTimeline>,
        satellite_busy: Option<&Occupancy>,
    ) -> Result<Offload, DropReason> {
        let mut others = timelines
            .values()
            .filter(|t| t.station_id() != pass.station_id)
            .peekable();

        if others.peek().is_none() {
            return Err(DropReason::NoAlternativeStation);
        }

        others
            .find_map(|t| {
                self.window_on(pass, Some(t), satellite_busy)
                    .map(|window| Offload {
                        station_id: t.station_id().to_string(),
                        window,
                    })
            })
            .ok_or(DropReason::ZeroDurationAfterShift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PassStatus;
    use crate::scheduler::ScheduledPass;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn stations(ids: &[&str]) -> BTreeMap<String, StationTimeline> {
        ids.iter()
            .map(|id| (id.to_string(), StationTimeline::new(*id)))
            .collect()
    }

    fn occupy(
        timelines: &mut BTreeMap<String, StationTimeline>,
        station: &str,
        a: (u32, u32),
        b: (u32, u32),
    ) {
        let pass = Pass::new("busy", station, at(a.0, a.1), at(b.0, b.1));
        timelines
            .get_mut(station)
            .unwrap()
            .commit(ScheduledPass::new(&pass, pass.window(), PassStatus::Scheduled))
            .unwrap();
    }

    #[test]
    fn first_free_station_in_id_order_wins() {
        let timelines = stations(&["gs-3", "gs-1", "gs-2"]);
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 15));

        let offload = OffloadPlanner::new(Duration::zero())
            .find_alternative(&pass, &timelines, None)
            .unwrap();
        assert_eq!(offload.station_id, "gs-2");
        assert_eq!(offload.window, pass.window());
    }

    #[test]
    fn shifts_into_largest_free_sub_window() {
        let mut timelines = stations(&["gs-1", "gs-2"]);
        occupy(&mut timelines, "gs-2", (10, 5), (10, 12));
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 15));

        let offload = OffloadPlanner::new(Duration::zero())
            .find_alternative(&pass, &timelines, None)
            .unwrap();
        assert_eq!(offload.window, Window::new(at(10, 12), at(10, 15)));
    }

    #[test]
    fn skips_stations_with_no_room() {
        let mut timelines = stations(&["gs-1", "gs-2", "gs-3"]);
        occupy(&mut timelines, "gs-2", (10, 0), (10, 20));
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 15));

        let offload = OffloadPlanner::new(Duration::zero())
            .find_alternative(&pass, &timelines, None)
            .unwrap();
        assert_eq!(offload.station_id, "gs-3");
    }

    #[test]
    fn respects_satellite_commitments_elsewhere() {
        let timelines = stations(&["gs-1", "gs-2"]);
        let mut busy = Occupancy::default();
        busy.insert(Window::new(at(10, 0), at(10, 9)));
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 15));

        let offload = OffloadPlanner::new(Duration::zero())
            .find_alternative(&pass, &timelines, Some(&busy))
            .unwrap();
        assert_eq!(offload.window, Window::new(at(10, 9), at(10, 15)));
    }

    #[test]
    fn reserved_windows_are_kept_clear() {
        let mut timelines = stations(&["gs-1"]);
        occupy(&mut timelines, "gs-1", (10, 0), (10, 10));
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 30));
        let planner = OffloadPlanner::new(Duration::zero());

        let open = planner.window_on(&pass, timelines.get("gs-1"), None);
        assert_eq!(open, Some(Window::new(at(10, 10), at(10, 30))));

        let reserved = [Window::new(at(10, 15), at(10, 40))];
        let clear = planner.window_around(&pass, timelines.get("gs-1"), None, reserved);
        assert_eq!(clear, Some(Window::new(at(10, 10), at(10, 15))));
    }

    #[test]
    fn drop_reasons() {
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 15));
        let planner = OffloadPlanner::new(Duration::zero());

        let lonely = stations(&["gs-1"]);
        assert_eq!(
            planner.find_alternative(&pass, &lonely, None),
            Err(DropReason::NoAlternativeStation)
        );

        let mut full = stations(&["gs-1", "gs-2"]);
        occupy(&mut full, "gs-2", (10, 5), (10, 15));
        assert_eq!(
            planner.find_alternative(&pass, &full, None),
            Err(DropReason::ZeroDurationAfterShift)
        );
    }

    #[test]
    fn short_shifted_windows_are_refused() {
        let mut timelines = stations(&["gs-1", "gs-2"]);
        occupy(&mut timelines, "gs-2", (10, 5), (10, 12));
        let pass = Pass::new("sat-b", "gs-1", at(10, 5), at(10, 15));

        let planner = OffloadPlanner::new(Duration::minutes(5));
        assert_eq!(
            planner.find_alternative(&pass, &timelines, None),
            Err(DropReason::ZeroDurationAfterShift)
        );
        assert!(planner.accepts(&pass.window(), &Window::new(at(10, 5), at(10, 15))));
    }
}
