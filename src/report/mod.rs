mod statistics;

use std::{fs, io, path::Path};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::RejectedRecord;
use crate::scheduler::{AssumptionViolation, DroppedPass, ScheduleOutcome, StationTimeline};

pub use statistics::SatelliteStats;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Yaml,
    Json,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Yaml,
        }
    }
}

/// Finalized per-station timelines plus everything that did not make it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub stations: Vec<StationTimeline>,
    pub dropped: Vec<DroppedPass>,
    pub violations: Vec<AssumptionViolation>,
    pub rejected: Vec<RejectedRecord>,
    pub satellites: Vec<SatelliteStats>,
}

impl ScheduleReport {
    pub fn new(outcome: ScheduleOutcome, rejected: Vec<RejectedRecord>) -> Self {
        let generated_at = Utc::now();
        let satellites = statistics::satellite_stats(&outcome);
        Self {
            run_id: generate_id(generated_at),
            generated_at,
            stations: outcome.timelines,
            dropped: outcome.dropped,
            violations: outcome.violations,
            rejected,
            satellites,
        }
    }

    pub fn station(&self, station_id: &str) -> Option<&StationTimeline> {
        self.stations.iter().find(|s| s.station_id() == station_id)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, ReportError> {
        Ok(match format {
            ReportFormat::Yaml => serde_yaml::to_string(self)?,
            ReportFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    pub fn save(&self, path: &Path, format: ReportFormat) -> Result<(), ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render(format)?)?;
        Ok(())
    }
}

fn generate_id(at: DateTime<Utc>) -> String {
    let uuid = uuid::Uuid::new_v4();
    let timestamp = at.format("%Y%m%dT%H%M%SZ");
    format!("{}_{}", timestamp, uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Pass, PassCatalog};
    use crate::scheduler::{EngineSettings, ScheduleEngine};
    use chrono::TimeZone;

    fn report() -> ScheduleReport {
        let at = |m| Utc.with_ymd_and_hms(2024, 5, 1, 10, m, 0).unwrap();
        let mut catalog = PassCatalog::new();
        catalog.insert(Pass::new("sat-a", "gs-1", at(0), at(10))).unwrap();
        catalog.insert(Pass::new("sat-b", "gs-1", at(5), at(15))).unwrap();
        let settings = EngineSettings {
            stations: vec!["gs-2".into()],
            ..EngineSettings::default()
        };
        let outcome = ScheduleEngine::new(catalog, &settings).run();
        ScheduleReport::new(
            outcome,
            vec![RejectedRecord {
                index: 2,
                message: "invalid interval".into(),
            }],
        )
    }

    #[test]
    fn json_report_lists_stations_and_rejections() {
        let report = report();
        let json: serde_json::Value =
            serde_json::from_str(&report.render(ReportFormat::Json).unwrap()).unwrap();

        assert_eq!(json["stations"][0]["station_id"], "gs-1");
        assert_eq!(json["stations"][1]["committed"][0]["satellite_id"], "sat-b");
        assert_eq!(json["stations"][1]["committed"][0]["status"], "offloaded");
        assert_eq!(json["rejected"][0]["index"], 2);
        assert_eq!(json["satellites"].as_array().unwrap().len(), 2);

        let (stamp, uuid) = report.run_id.split_once('_').unwrap();
        assert_eq!(stamp.len(), "20240501T100000Z".len());
        assert_eq!(uuid.len(), 36);
    }

    #[test]
    fn saves_yaml_next_to_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("schedule.yaml");
        let report = report();

        report.save(&path, ReportFormat::from_path(&path)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("run_id:"));
        assert!(content.contains("station_id: gs-2"));
        assert_eq!(report.station("gs-2").map(|s| s.committed().len()), Some(1));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("out.JSON")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("out.yml")), ReportFormat::Yaml);
        assert_eq!(ReportFormat::from_path(Path::new("out")), ReportFormat::Yaml);
    }
}
