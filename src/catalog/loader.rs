use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::error::CatalogError;
use crate::catalog::pass_catalog::PassCatalog;
use crate::catalog::types::{Pass, PassRecord};

/// A record that did not make it into the catalog
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RejectedRecord {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct LoadedCatalog {
    pub catalog: PassCatalog,
    pub rejected: Vec<RejectedRecord>,
}

/// Reads pass records written by the pass predictor.
pub struct CatalogLoader {
    path: PathBuf,
}

impl CatalogLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the catalog file. JSON files are recognised by extension,
    /// everything else is read as YAML.
    pub fn load(&self) -> Result<LoadedCatalog, CatalogError> {
        let content = fs::read_to_string(&self.path)?;

        let loaded = if is_json(&self.path) {
            from_json_values(json_records(&content)?)
        } else {
            from_yaml_values(yaml_records(&content)?)
        };

        log::info!(
            "Loaded {} passes from {} ({} rejected)",
            loaded.catalog.len(),
            self.path.display(),
            loaded.rejected.len()
        );
        Ok(loaded)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn json_records(content: &str) -> Result<Vec<serde_json::Value>, CatalogError> {
    match serde_json::from_str(content)? {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut map) => match map.remove("passes") {
            Some(serde_json::Value::Array(items)) => Ok(items),
            _ => Err(CatalogError::MissingPasses),
        },
        _ => Err(CatalogError::MissingPasses),
    }
}

fn yaml_records(content: &str) -> Result<Vec<serde_yaml::Value>, CatalogError> {
    let root: serde_yaml::Value = serde_yaml::from_str(content)?;
    let list = match root {
        serde_yaml::Value::Sequence(items) => items,
        serde_yaml::Value::Mapping(mut map) => match map.remove("passes") {
            Some(serde_yaml::Value::Sequence(items)) => items,
            _ => return Err(CatalogError::MissingPasses),
        },
        _ => return Err(CatalogError::MissingPasses),
    };
    Ok(list)
}

pub fn from_json_values(values: Vec<serde_json::Value>) -> LoadedCatalog {
    build(values, |v| serde_json::from_value(v).map_err(|e| e.to_string()))
}

pub fn from_yaml_values(values: Vec<serde_yaml::Value>) -> LoadedCatalog {
    build(values, |v| serde_yaml::from_value(v).map_err(|e| e.to_string()))
}

/// Decode and insert each record on its own so one bad record
/// does not fail the batch.
fn build<V, F>(values: Vec<V>, decode: F) -> LoadedCatalog
where
    F: Fn(V) -> Result<PassRecord, String>,
{
    let mut loaded = LoadedCatalog::default();

    for (index, value) in values.into_iter().enumerate() {
        let result = decode(value).and_then(|record| {
            loaded
                .catalog
                .insert(Pass::from(record))
                .map_err(|e| e.to_string())
        });

        if let Err(message) = result {
            log::warn!("Rejected pass record {}: {}", index, message);
            loaded.rejected.push(RejectedRecord { index, message });
        }
    }

    loaded
}
