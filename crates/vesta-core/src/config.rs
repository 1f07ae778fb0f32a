//! Configuration types for the Vesta query engine.
//!
//! All configuration is materialized into immutable values at startup and
//! passed by reference afterwards; nothing here is mutated once constructed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Deployment flavour, which selects the default temporal window policy.
///
/// Production backends hold live time series, so the default window is
/// anchored on the current instant. Fixture backends hold static data and
/// anchor on a configured date instead — "now" is meaningless there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentKind {
    /// Live deployment; default windows are computed from the current instant.
    Production,
    /// Fixture/test deployment; default windows are computed from the anchor date.
    Test,
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Test => write!(f, "test"),
        }
    }
}

impl FromStr for DeploymentKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(DataError::Config(format!(
                "invalid timeLimit config passed: unknown deployment '{}'",
                s
            ))),
        }
    }
}

/// Temporal bounding policy for a deployment.
///
/// Parsed from the `"<deploymentKind>,<anchorDate>,<lookbackDays>"` string
/// the bootstrap layer hands to every request, e.g.
/// `"test,2020-10-22T00:00:00Z,10"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeLimitConfig {
    /// Which default-window policy applies.
    pub deployment: DeploymentKind,
    /// Anchor date for fixture deployments. Always present for
    /// [`DeploymentKind::Test`]; ignored in production.
    pub anchor: Option<DateTime<FixedOffset>>,
    /// Width of defaulted and relative temporal windows, in days.
    pub lookback_days: i64,
}

impl FromStr for TimeLimitConfig {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(DataError::Config(format!(
                "invalid timeLimit config passed: '{}'",
                s
            )));
        }
        let deployment: DeploymentKind = parts[0].trim().parse()?;
        let anchor = match deployment {
            // A fixture deployment is unusable without a parseable anchor.
            DeploymentKind::Test => Some(
                DateTime::parse_from_rfc3339(parts[1].trim()).map_err(|e| {
                    DataError::Config(format!("invalid timeLimit anchor date: {}", e))
                })?,
            ),
            DeploymentKind::Production => DateTime::parse_from_rfc3339(parts[1].trim()).ok(),
        };
        let lookback_days: i64 = parts[2].trim().parse().map_err(|_| {
            DataError::Config(format!("invalid timeLimit lookback days: '{}'", parts[2]))
        })?;
        Ok(Self {
            deployment,
            anchor,
            lookback_days,
        })
    }
}

impl TryFrom<String> for TimeLimitConfig {
    type Error = DataError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeLimitConfig> for String {
    fn from(cfg: TimeLimitConfig) -> Self {
        let anchor = cfg
            .anchor
            .map(|a| a.to_rfc3339())
            .unwrap_or_else(|| "NA".to_string());
        format!("{},{},{}", cfg.deployment, anchor, cfg.lookback_days)
    }
}

/// Connection settings for the document-search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend REST endpoint, e.g. `http://localhost:9200`.
    pub endpoint: String,
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    180
}

impl BackendConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Connection settings for the resource catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// Base URL of the catalogue API, e.g. `https://catalogue.example.org/iudx/cat/v1`.
    pub endpoint: String,
}

/// Root server configuration, deserialized once at startup.
///
/// # Example
///
/// ```toml
/// time_limit = "test,2020-10-22T00:00:00Z,10"
///
/// [backend]
/// endpoint = "http://localhost:9200"
/// username = "elastic"
/// password = "secret"
///
/// [catalogue]
/// endpoint = "https://catalogue.example.org/iudx/cat/v1"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Search backend connection settings.
    pub backend: BackendConfig,
    /// Resource catalogue connection settings.
    pub catalogue: CatalogueConfig,
    /// Deployment time-limit policy.
    pub time_limit: TimeLimitConfig,
}

/// Load the server configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, DataError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DataError::Config(format!("failed to read config file '{}': {}", path.display(), e))
    })?;
    let config: ServerConfig = toml::from_str(&content).map_err(|e| {
        DataError::Config(format!("invalid TOML in '{}': {}", path.display(), e))
    })?;
    tracing::info!("loaded configuration from {}", path.display());
    Ok(config)
}
