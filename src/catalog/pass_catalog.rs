use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::catalog::error::CatalogError;
use crate::catalog::types::{Pass, PassStatus};

/// Candidate passes ordered by start time, then satellite, then station.
/// Remaining ties fall to end time and peak elevation so the order never
/// depends on insertion order.
#[derive(Debug, Clone, Default)]
pub struct PassCatalog {
    passes: Vec<Pass>,
}

impl PassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pass as `Candidate`, keeping the catalog sorted.
    pub fn insert(&mut self, mut pass: Pass) -> Result<(), CatalogError> {
        if pass.end <= pass.start {
            return Err(CatalogError::InvalidInterval {
                satellite_id: pass.satellite_id,
                station_id: pass.station_id,
                start: pass.start,
                end: pass.end,
            });
        }

        pass.status = PassStatus::Candidate;
        let idx = self
            .passes
            .partition_point(|p| sweep_order(p, &pass) != Ordering::Greater);
        self.passes.insert(idx, pass);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pass> {
        self.passes.iter()
    }

    /// Every station requested by at least one pass
    pub fn stations(&self) -> BTreeSet<String> {
        self.passes.iter().map(|p| p.station_id.clone()).collect()
    }

    pub fn satellites(&self) -> BTreeSet<String> {
        self.passes.iter().map(|p| p.satellite_id.clone()).collect()
    }

    pub(crate) fn into_passes(self) -> Vec<Pass> {
        self.passes
    }
}

fn sweep_order(a: &Pass, b: &Pass) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.satellite_id.cmp(&b.satellite_id))
        .then_with(|| a.station_id.cmp(&b.station_id))
        .then_with(|| a.end.cmp(&b.end))
        .then_with(|| match (a.max_elevation_deg, b.max_elevation_deg) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (x, y) => x.is_some().cmp(&y.is_some()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn keeps_passes_sorted_with_deterministic_ties() {
        let mut catalog = PassCatalog::new();
        catalog.insert(Pass::new("sat-b", "gs-1", at(10, 0), at(10, 10))).unwrap();
        catalog.insert(Pass::new("sat-c", "gs-1", at(9, 0), at(9, 10))).unwrap();
        catalog.insert(Pass::new("sat-a", "gs-2", at(10, 0), at(10, 10))).unwrap();
        catalog.insert(Pass::new("sat-a", "gs-1", at(10, 0), at(10, 5))).unwrap();

        let order: Vec<_> = catalog
            .iter()
            .map(|p| (p.satellite_id.as_str(), p.station_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("sat-c", "gs-1"), ("sat-a", "gs-1"), ("sat-a", "gs-2"), ("sat-b", "gs-1")]
        );
    }

    #[test]
    fn same_key_passes_sort_by_end_then_elevation() {
        let passes = [
            Pass::new("sat-a", "gs-1", at(10, 0), at(10, 20)),
            Pass::new("sat-a", "gs-1", at(10, 0), at(10, 10)),
            Pass {
                max_elevation_deg: Some(40.0),
                ..Pass::new("sat-a", "gs-1", at(10, 0), at(10, 10))
            },
        ];

        fn order<'a>(passes: impl Iterator<Item = &'a Pass>) -> Vec<(DateTime<Utc>, Option<f64>)> {
            let mut catalog = PassCatalog::new();
            for pass in passes {
                catalog.insert(pass.clone()).unwrap();
            }
            catalog.iter().map(|p| (p.end, p.max_elevation_deg)).collect()
        }

        let forward = order(passes.iter());
        let backward = order(passes.iter().rev());
        assert_eq!(forward, backward);
        assert_eq!(
            forward,
            vec![(at(10, 10), None), (at(10, 10), Some(40.0)), (at(10, 20), None)]
        );
    }

    #[test]
    fn rejects_empty_and_inverted_intervals() {
        let mut catalog = PassCatalog::new();
        let empty = catalog.insert(Pass::new("sat-a", "gs-1", at(10, 0), at(10, 0)));
        let inverted = catalog.insert(Pass::new("sat-a", "gs-1", at(10, 5), at(10, 0)));

        assert!(matches!(empty, Err(CatalogError::InvalidInterval { .. })));
        assert!(matches!(inverted, Err(CatalogError::InvalidInterval { .. })));
        assert!(catalog.is_empty());
    }

    #[test]
    fn insert_resets_status_to_candidate() {
        let mut catalog = PassCatalog::new();
        let mut pass = Pass::new("sat-a", "gs-1", at(10, 0), at(10, 10));
        pass.status = PassStatus::Dropped;
        catalog.insert(pass).unwrap();

        assert_eq!(catalog.iter().next().map(|p| p.status), Some(PassStatus::Candidate));
        assert_eq!(catalog.stations().len(), 1);
        assert_eq!(catalog.satellites().len(), 1);
    }
}
