use std::collections::{BTreeMap, HashMap, HashSet};
use std::iter;

use chrono::Duration;

use crate::catalog::{Pass, PassCatalog, PassId, PassStatus};
use crate::scheduler::{
    AssumptionViolation, ConflictResolver, DropReason, DroppedPass, OffloadPlanner, Occupancy,
    SatelliteLedger, ScheduleOutcome, ScheduledPass, StationTimeline, Window,
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Stations known in addition to the ones the catalog requests
    pub stations: Vec<String>,
    /// Shortest shifted window worth committing
    pub min_contact: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            min_contact: Duration::zero(),
        }
    }
}

/// Sweeps the catalog in start order, assigning each pass a terminal status.
///
/// Every call to `step` finalizes at least one pass, so a run always
/// terminates with every pass either on a timeline or in the drop list.
pub struct ScheduleEngine {
    passes: Vec<Pass>,
    timelines: BTreeMap<String, StationTimeline>,
    satellite_busy: HashMap<String, Occupancy>,
    ledger: SatelliteLedger,
    planner: OffloadPlanner,
    dropped: Vec<DroppedPass>,
    violations: Vec<AssumptionViolation>,
    flagged: HashSet<(PassId, PassId)>,
}

impl ScheduleEngine {
    pub fn new(catalog: PassCatalog, settings: &EngineSettings) -> Self {
        let mut timelines = BTreeMap::new();
        for station in settings.stations.iter().cloned().chain(catalog.stations()) {
            timelines
                .entry(station.clone())
                .or_insert_with(|| StationTimeline::new(station));
        }

        Self {
            passes: catalog.into_passes(),
            timelines,
            satellite_busy: HashMap::new(),
            ledger: SatelliteLedger::new(),
            planner: OffloadPlanner::new(settings.min_contact),
            dropped: Vec::new(),
            violations: Vec::new(),
            flagged: HashSet::new(),
        }
    }

    pub fn run(mut self) -> ScheduleOutcome {
        log::info!(
            "Scheduling {} passes over {} stations",
            self.passes.len(),
            self.timelines.len()
        );

        for id in 0..self.passes.len() {
            while !self.passes[id].status.is_terminal() {
                self.step(id);
            }
        }

        let outcome = ScheduleOutcome {
            timelines: self.timelines.into_values().collect(),
            dropped: self.dropped,
            violations: self.violations,
            ledger: self.ledger,
            passes: self.passes,
        };

        for timeline in &outcome.timelines {
            log::debug!(
                "Station {}: {} passes, {} min of contact",
                timeline.station_id(),
                timeline.committed().len(),
                timeline.total_contact().num_minutes()
            );
        }
        log::info!(
            "Schedule finished: {} scheduled, {} offloaded, {} dropped",
            outcome.count(PassStatus::Scheduled),
            outcome.count(PassStatus::Offloaded),
            outcome.count(PassStatus::Dropped)
        );
        outcome
    }

    fn step(&mut self, id: PassId) {
        let satellite_free = self.planner.window_on(
            &self.passes[id],
            None,
            self.satellite_busy.get(&self.passes[id].satellite_id),
        );
        if satellite_free.is_none() {
            self.drop_pass(id, DropReason::ZeroDurationAfterShift);
            return;
        }

        let (conflicts, alternatives) = self.overlaps_of(id);
        if !alternatives.is_empty() {
            log::debug!(
                "{} also visible from {} other station(s) during {}",
                self.passes[id].satellite_id,
                alternatives.len(),
                self.passes[id].start
            );
        }
        self.flag_nesting(id, &conflicts, &alternatives);

        if conflicts.is_empty() {
            match self.home_window(id) {
                Some(window) => self.commit_home(id, window),
                None => self.relocate(id),
            }
            return;
        }

        let (eligible, mut losers): (Vec<_>, Vec<_>) = iter::once(id)
            .chain(conflicts)
            .partition(|&m| self.home_window(m).is_some());

        let resolver = ConflictResolver::new(&self.ledger);
        let winner = resolver
            .resolve(&self.passes, eligible)
            .and_then(|resolution| {
                let window = self.home_window(resolution.winner)?;
                // Contenders clear of the winner stay candidates for a later step.
                losers.extend(
                    resolution
                        .losers
                        .into_iter()
                        .filter(|&l| self.passes[l].window().overlaps(&window)),
                );
                Some((resolution.winner, window))
            });
        resolver.rank(&self.passes, &mut losers);

        if let Some((winner, window)) = winner {
            log::debug!(
                "{} wins {} at {} over {} contender(s)",
                self.passes[winner].satellite_id,
                self.passes[winner].station_id,
                window.start,
                losers.len()
            );
            self.commit_home(winner, window);
        }

        for loser in losers {
            self.relocate(loser);
        }
    }

    /// Non-terminal passes overlapping `id`: same station, then same
    /// satellite on another station.
    fn overlaps_of(&self, id: PassId) -> (Vec<PassId>, Vec<PassId>) {
        let pass = &self.passes[id];
        let window = pass.window();
        let mut conflicts = Vec::new();
        let mut alternatives = Vec::new();

        // Everything before `id` is already terminal and everything after
        // starts no earlier, so overlap reduces to starting before our end.
        for (other_id, other) in self.passes.iter().enumerate().skip(id + 1) {
            if other.start >= window.end {
                break;
            }
            if other.status.is_terminal() {
                continue;
            }
            if other.station_id == pass.station_id {
                conflicts.push(other_id);
            } else if other.satellite_id == pass.satellite_id {
                alternatives.push(other_id);
            }
        }

        (conflicts, alternatives)
    }

    /// The inner pass of a nested pair only gets whatever time its
    /// satellite still has free once the outer one is placed.
    fn flag_nesting(&mut self, id: PassId, conflicts: &[PassId], alternatives: &[PassId]) {
        let group: Vec<PassId> = iter::once(id)
            .chain(conflicts.iter().copied())
            .chain(alternatives.iter().copied())
            .collect();

        for (i, &a) in group.iter().enumerate() {
            for &b in &group[i + 1..] {
                let (pa, pb) = (&self.passes[a], &self.passes[b]);
                if pa.satellite_id != pb.satellite_id {
                    continue;
                }
                let (outer, inner) = if pa.window().contains(&pb.window()) {
                    (pa, pb)
                } else if pb.window().contains(&pa.window()) {
                    (pb, pa)
                } else {
                    continue;
                };
                if !self.flagged.insert((a.min(b), a.max(b))) {
                    continue;
                }

                log::warn!(
                    "{}: pass at {} ({}) is nested inside pass at {} ({})",
                    outer.satellite_id,
                    inner.start,
                    inner.station_id,
                    outer.start,
                    outer.station_id
                );
                self.violations.push(AssumptionViolation {
                    satellite_id: outer.satellite_id.clone(),
                    outer: outer.into(),
                    inner: inner.into(),
                });
            }
        }
    }

    fn home_window(&self, id: PassId) -> Option<Window> {
        let pass = &self.passes[id];
        self.planner.window_on(
            pass,
            self.timelines.get(&pass.station_id),
            self.satellite_busy.get(&pass.satellite_id),
        )
    }

    fn relocate(&mut self, id: PassId) {
        let pass = &self.passes[id];
        let decision = self.planner.find_alternative(
            pass,
            &self.timelines,
            self.satellite_busy.get(&pass.satellite_id),
        );

        match decision {
            Ok(offload) => {
                self.commit(id, offload.station_id, offload.window, PassStatus::Offloaded)
            }
            Err(reason) => match self.remainder_window(id) {
                Some(window) => self.commit_home(id, window),
                None => self.drop_pass(id, reason),
            },
        }
    }

    /// What is left of the pass on its own station once committed passes
    /// and every other pending request for that station are taken out.
    fn remainder_window(&self, id: PassId) -> Option<Window> {
        let pass = &self.passes[id];
        let pending = self
            .passes
            .iter()
            .enumerate()
            .filter(|&(other, p)| {
                other != id && !p.status.is_terminal() && p.station_id == pass.station_id
            })
            .map(|(_, p)| p.window());

        self.planner.window_around(
            pass,
            self.timelines.get(&pass.station_id),
            self.satellite_busy.get(&pass.satellite_id),
            pending,
        )
    }

    fn commit_home(&mut self, id: PassId, window: Window) {
        let station_id = self.passes[id].station_id.clone();
        self.commit(id, station_id, window, PassStatus::Scheduled);
    }

    fn commit(&mut self, id: PassId, station_id: String, window: Window, status: PassStatus) {
        let entry = ScheduledPass::new(&self.passes[id], window, status);
        let timeline = self
            .timelines
            .entry(station_id.clone())
            .or_insert_with(|| StationTimeline::new(station_id.clone()));

        if let Err(e) = timeline.commit(entry) {
            log::error!("Refusing commit: {}", e);
            self.drop_pass(id, DropReason::ZeroDurationAfterShift);
            return;
        }

        let pass = &mut self.passes[id];
        pass.status = status;
        self.satellite_busy
            .entry(pass.satellite_id.clone())
            .or_default()
            .insert(window);
        self.ledger.credit(&pass.satellite_id, window.duration());

        log::debug!(
            "{} {} on {} for {:.1} min",
            pass.satellite_id,
            status,
            station_id,
            window.minutes()
        );
    }

    fn drop_pass(&mut self, id: PassId, reason: DropReason) {
        let pass = &mut self.passes[id];
        pass.status = PassStatus::Dropped;
        log::info!(
            "Dropped {} on {} at {}: {}",
            pass.satellite_id,
            pass.station_id,
            pass.start,
            reason
        );
        self.dropped.push(DroppedPass::new(pass, reason));
    }
}
