use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use crate::catalog::error::CatalogError;
use crate::scheduler::Window;

/// Position of a pass inside its catalog.
pub type PassId = usize;

/// Timestamp layout written by the pass predictor's JSON dump.
const PREDICTOR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PassStatus {
    Candidate,
    Scheduled,
    Offloaded,
    Dropped,
}

impl PassStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PassStatus::Candidate)
    }
}

/// A candidate pass as delivered by the pass predictor
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PassRecord {
    #[serde(alias = "satellite_name")]
    pub satellite_id: String,
    #[serde(alias = "ground_station")]
    pub station_id: String,
    #[serde(alias = "start_time", deserialize_with = "deserialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(alias = "end_time", deserialize_with = "deserialize_timestamp")]
    pub end: DateTime<Utc>,
    #[serde(default, alias = "max_elevation")]
    pub max_elevation_deg: Option<f64>,
}

/// A visibility window of one satellite over one ground station
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Pass {
    pub satellite_id: String,
    pub station_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_elevation_deg: Option<f64>,
    pub status: PassStatus,
}

impl Pass {
    pub fn new(
        satellite_id: impl Into<String>,
        station_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            satellite_id: satellite_id.into(),
            station_id: station_id.into(),
            start,
            end,
            max_elevation_deg: None,
            status: PassStatus::Candidate,
        }
    }

    pub fn window(&self) -> Window {
        Window::new(self.start, self.end)
    }
}

impl From<PassRecord> for Pass {
    fn from(record: PassRecord) -> Self {
        Self {
            satellite_id: record.satellite_id,
            station_id: record.station_id,
            start: record.start,
            end: record.end,
            max_elevation_deg: record.max_elevation_deg,
            status: PassStatus::Candidate,
        }
    }
}

/// Parses an RFC 3339 timestamp, falling back to the predictor's
/// `2024-05-01 10:00:00.000000+00:00` layout.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, CatalogError> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, PREDICTOR_TIME_FORMAT))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| CatalogError::InvalidTimestamp {
            value: value.to_string(),
            source,
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s).map_err(serde::de::Error::custom)
}
