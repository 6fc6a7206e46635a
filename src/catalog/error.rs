use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid interval for {satellite_id} at {station_id}: end {end} is not after start {start}")]
    InvalidInterval {
        satellite_id: String,
        station_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("no pass list found (expected a sequence or a 'passes' key)")]
    MissingPasses,
}
