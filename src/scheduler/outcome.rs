use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::catalog::{Pass, PassStatus};
use crate::scheduler::{SatelliteLedger, StationTimeline, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DropReason {
    /// No station other than the requested one is known
    NoAlternativeStation,
    /// Shifting left no usable window on any station
    ZeroDurationAfterShift,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DroppedPass {
    pub satellite_id: String,
    pub station_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: DropReason,
}

impl DroppedPass {
    pub fn new(pass: &Pass, reason: DropReason) -> Self {
        Self {
            satellite_id: pass.satellite_id.clone(),
            station_id: pass.station_id.clone(),
            start: pass.start,
            end: pass.end,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassRef {
    pub station_id: String,
    pub window: Window,
}

impl From<&Pass> for PassRef {
    fn from(pass: &Pass) -> Self {
        Self {
            station_id: pass.station_id.clone(),
            window: pass.window(),
        }
    }
}

/// Two passes of one satellite where one lies entirely inside the other
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AssumptionViolation {
    pub satellite_id: String,
    pub outer: PassRef,
    pub inner: PassRef,
}

/// Everything a scheduling run produced
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// One per known station, ascending by station id
    pub timelines: Vec<StationTimeline>,
    pub dropped: Vec<DroppedPass>,
    pub violations: Vec<AssumptionViolation>,
    pub ledger: SatelliteLedger,
    /// Every catalog pass in sweep order with its terminal status
    pub passes: Vec<Pass>,
}

impl ScheduleOutcome {
    pub fn count(&self, status: PassStatus) -> usize {
        self.passes.iter().filter(|p| p.status == status).count()
    }
}
