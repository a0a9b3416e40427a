use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ParkingError, Result};
use crate::query::{QueryBuilder, DEFAULT_BASE_URL};

pub const ENV_BASE_URL: &str = "SF_PARKING_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SF_PARKING_TIMEOUT_SECS";
pub const ENV_RETURN_GEOMETRY: &str = "SF_PARKING_RETURN_GEOMETRY";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Overrides each front end's own `returnGeometry` default when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_geometry: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("sf-parking/{}", env!("CARGO_PKG_VERSION")),
            return_geometry: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ParkingError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ParkingError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ParkingError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ParkingError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `SF_PARKING_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                ParkingError::Config(format!("{}: not a number: {}", ENV_TIMEOUT_SECS, raw))
            })?;
        }

        if let Some(raw) = lookup(ENV_RETURN_GEOMETRY) {
            let flag = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ParkingError::Config(format!(
                        "{}: expected true or false, got {}",
                        ENV_RETURN_GEOMETRY, raw
                    )))
                }
            };
            self.return_geometry = Some(flag);
        }

        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builder for a front end whose own geometry default is `default_geometry`.
    pub fn query_builder(&self, default_geometry: bool) -> QueryBuilder {
        QueryBuilder::new(self.base_url.clone())
            .with_return_geometry(self.return_geometry.unwrap_or(default_geometry))
    }
}
