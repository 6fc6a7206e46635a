use chrono::Duration;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::scheduler::EngineSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Stations that can take offloaded passes even if nothing requests them
    #[serde(default)]
    pub stations: Vec<StationConfig>,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    #[serde(default = "Duration::zero", deserialize_with = "deserialize_duration")]
    pub min_contact: Duration,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            min_contact: Duration::zero(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    RunSchedule,
    ViewSchedule,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            stations: self.stations.iter().map(|s| s.id.clone()).collect(),
            min_contact: self.scheduling.min_contact,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim())
        .map_err(serde::de::Error::custom)
        .and_then(|d| Duration::from_std(d).map_err(serde::de::Error::custom))
}
