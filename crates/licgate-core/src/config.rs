use crate::availability::ManagedFeatures;
use crate::error::{GateError, Result};
use crate::paths;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for configured durations (one year).
const MAX_SECONDS: f64 = 365.0 * 24.0 * 3600.0;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// GateConfig
// ---------------------------------------------------------------------------

/// Hook configuration, read from YAML (JSON documents parse too).
///
/// ```yaml
/// lmutil: /opt/flexlm/bin/lmutil
/// managed_features: [eclipse, compositional, parallel, lgr, networks]
/// throttle_state_path: /var/lib/licgate/last-check
/// interval_seconds: 15.0
/// delay_seconds: 60.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// License query tool. A bare name is looked up on `PATH`.
    pub lmutil: PathBuf,
    #[serde(alias = "issued_licenses")]
    pub managed_features: Vec<String>,
    #[serde(default = "paths::default_throttle_state_path", alias = "stamp")]
    pub throttle_state_path: PathBuf,
    /// Minimum time between successful license checks.
    #[serde(default = "default_interval", alias = "interval_time")]
    pub interval_seconds: f64,
    /// How far to push a job back when licenses are short.
    #[serde(default = "default_delay", alias = "delay_time")]
    pub delay_seconds: f64,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
    #[serde(default = "default_vendor_daemon")]
    pub vendor_daemon: String,
    #[serde(default = "default_license_server_variable")]
    pub license_server_variable: String,
    #[serde(default = "default_secondary_requirement_variable")]
    pub secondary_requirement_variable: String,
}

fn default_interval() -> f64 {
    15.0
}

fn default_delay() -> f64 {
    60.0
}

fn default_query_timeout() -> u64 {
    5
}

fn default_vendor_daemon() -> String {
    "slbsls".to_string()
}

fn default_license_server_variable() -> String {
    "SLBSLS_LICENSE_FILE".to_string()
}

fn default_secondary_requirement_variable() -> String {
    "ECL_LICS_REQD".to_string()
}

impl GateConfig {
    pub fn new(lmutil: impl Into<PathBuf>, managed_features: Vec<String>) -> Self {
        Self {
            lmutil: lmutil.into(),
            managed_features,
            throttle_state_path: paths::default_throttle_state_path(),
            interval_seconds: default_interval(),
            delay_seconds: default_delay(),
            query_timeout_seconds: default_query_timeout(),
            vendor_daemon: default_vendor_daemon(),
            license_server_variable: default_license_server_variable(),
            secondary_requirement_variable: default_secondary_requirement_variable(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GateError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&data)
            .map_err(|e| GateError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn managed(&self) -> ManagedFeatures {
        ManagedFeatures::new(self.managed_features.iter().cloned())
    }

    pub fn interval(&self) -> Duration {
        seconds(self.interval_seconds)
    }

    pub fn delay(&self) -> Duration {
        seconds(self.delay_seconds)
    }

    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.query_timeout_seconds)
    }

    /// Absolute path of the license query tool.
    pub fn resolve_lmutil(&self) -> Result<PathBuf> {
        which::which(&self.lmutil).map_err(|e| {
            GateError::Configuration(format!(
                "license query tool '{}' not found: {e}",
                self.lmutil.display()
            ))
        })
    }

    /// Check for common configuration mistakes.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.managed().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "managed_features is empty: every job with a license expression \
                          will be rejected"
                    .to_string(),
            });
        }

        for feature in &self.managed_features {
            if feature.trim().is_empty() || feature.contains(['=', ':', '+']) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "managed feature '{feature}' cannot appear in a license expression"
                    ),
                });
            }
        }

        if !self.interval_seconds.is_finite() || self.interval_seconds < 0.0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "interval_seconds must be zero or positive, got {}",
                    self.interval_seconds
                ),
            });
        }

        if !self.delay_seconds.is_finite() || self.delay_seconds <= 0.0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("delay_seconds must be positive, got {}", self.delay_seconds),
            });
        }

        if self.query_timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "query_timeout_seconds must be at least 1".to_string(),
            });
        }

        if let Err(e) = self.resolve_lmutil() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            });
        }

        warnings
    }
}

fn seconds(secs: f64) -> Duration {
    let clamped = secs.max(0.0).min(MAX_SECONDS);
    Duration::milliseconds((clamped * 1000.0).round() as i64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
