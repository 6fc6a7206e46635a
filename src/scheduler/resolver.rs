use std::cmp::Ordering;

use crate::catalog::{Pass, PassId};
use crate::scheduler::SatelliteLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub winner: PassId,
    /// Remaining contenders, most deserving first
    pub losers: Vec<PassId>,
}

/// Picks which of several competing passes gets a station.
///
/// The least-served satellite wins, then the earlier start, then the
/// smaller satellite id. Station id and catalog position only break
/// ties that would otherwise be left to sort stability.
pub struct ConflictResolver<'a> {
    ledger: &'a SatelliteLedger,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(ledger: &'a SatelliteLedger) -> Self {
        Self { ledger }
    }

    pub fn resolve(&self, passes: &[Pass], mut conflict_set: Vec<PassId>) -> Option<Resolution> {
        self.rank(passes, &mut conflict_set);
        let mut ranked = conflict_set.into_iter();
        let winner = ranked.next()?;
        Some(Resolution {
            winner,
            losers: ranked.collect(),
        })
    }

    pub fn rank(&self, passes: &[Pass], ids: &mut [PassId]) {
        ids.sort_by(|&a, &b| self.compare(passes, a, b));
    }

    fn compare(&self, passes: &[Pass], a: PassId, b: PassId) -> Ordering {
        let (pa, pb) = (&passes[a], &passes[b]);
        self.ledger
            .contact_of(&pa.satellite_id)
            .cmp(&self.ledger.contact_of(&pb.satellite_id))
            .then_with(|| pa.start.cmp(&pb.start))
            .then_with(|| pa.satellite_id.cmp(&pb.satellite_id))
            .then_with(|| pa.station_id.cmp(&pb.station_id))
            .then_with(|| a.cmp(&b))
    }
}
