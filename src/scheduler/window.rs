use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn minutes(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 60_000.0
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    // [a, b) and [c, d) overlap if a < d && c < b
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Window) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersection(&self, other: &Window) -> Option<Window> {
        let w = Window::new(self.start.max(other.start), self.end.min(other.end));
        (!w.is_empty()).then_some(w)
    }

    /// Longest part of this window not covered by any of `busy`.
    /// Equal-length gaps resolve to the earliest one.
    pub fn largest_free<I>(&self, busy: I) -> Option<Window>
    where
        I: IntoIterator<Item = Window>,
    {
        let mut blocked: Vec<Window> = busy
            .into_iter()
            .filter_map(|b| self.intersection(&b))
            .collect();
        blocked.sort_by_key(|b| b.start);

        let mut best: Option<Window> = None;
        let mut keep = |gap: Window| {
            if best.map_or(true, |b| gap.duration() > b.duration()) {
                best = Some(gap);
            }
        };

        let mut cursor = self.start;
        for b in blocked {
            if b.start > cursor {
                keep(Window::new(cursor, b.start));
            }
            cursor = cursor.max(b.end);
        }
        if cursor < self.end {
            keep(Window::new(cursor, self.end));
        }

        best
    }
}

/// Sorted, non-overlapping set of busy windows.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    windows: Vec<Window>,
}

impl Occupancy {
    /// Returns false and leaves the set untouched if `window` overlaps it.
    pub fn insert(&mut self, window: Window) -> bool {
        if window.is_empty() || !self.is_free(&window) {
            return false;
        }
        let idx = self.windows.partition_point(|w| w.start < window.start);
        self.windows.insert(idx, window);
        true
    }

    pub fn overlapping(&self, window: Window) -> impl Iterator<Item = Window> + '_ {
        // Ends are sorted as well since the windows never overlap.
        let first = self.windows.partition_point(|w| w.end <= window.start);
        self.windows[first..]
            .iter()
            .take_while(move |w| w.start < window.end)
            .copied()
    }

    pub fn is_free(&self, window: &Window) -> bool {
        self.overlapping(*window).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn w(a: (u32, u32), b: (u32, u32)) -> Window {
        Window::new(at(a.0, a.1), at(b.0, b.1))
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        assert!(!w((10, 0), (10, 10)).overlaps(&w((10, 10), (10, 20))));
        assert!(w((10, 0), (10, 10)).overlaps(&w((10, 9), (10, 20))));
    }

    #[test]
    fn largest_free_picks_longest_gap() {
        let request = w((10, 0), (11, 0));
        let busy = [w((10, 5), (10, 20)), w((10, 30), (10, 35)), w((9, 0), (10, 2))];
        assert_eq!(request.largest_free(busy), Some(w((10, 35), (11, 0))));
    }

    #[test]
    fn largest_free_prefers_earliest_on_ties() {
        let request = w((10, 0), (10, 30));
        let busy = [w((10, 10), (10, 20))];
        assert_eq!(request.largest_free(busy), Some(w((10, 0), (10, 10))));
    }

    #[test]
    fn largest_free_is_none_when_fully_covered() {
        let request = w((10, 5), (10, 15));
        let busy = [w((10, 0), (10, 10)), w((10, 10), (10, 20))];
        assert_eq!(request.largest_free(busy), None);
        assert_eq!(request.largest_free([]), Some(request));
    }

    #[test]
    fn occupancy_refuses_overlaps() {
        let mut occupancy = Occupancy::default();
        assert!(occupancy.insert(w((10, 0), (10, 10))));
        assert!(occupancy.insert(w((10, 20), (10, 30))));
        assert!(!occupancy.insert(w((10, 5), (10, 25))));
        assert!(occupancy.insert(w((10, 10), (10, 20))));

        let hits: Vec<_> = occupancy.overlapping(w((10, 15), (10, 21))).collect();
        assert_eq!(hits, vec![w((10, 10), (10, 20)), w((10, 20), (10, 30))]);
    }
}
