//! Job snapshots handed over by the scheduler hook.
//!
//! The hook serializes the pending job and the jobs it can see into YAML
//! or JSON; evaluation never touches the scheduler's own objects.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Queued,
    Held,
    Waiting,
    Running,
    Exiting,
    Finished,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Held => "held",
            JobState::Waiting => "waiting",
            JobState::Running => "running",
            JobState::Exiting => "exiting",
            JobState::Finished => "finished",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobDescriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: String,
    #[serde(default)]
    pub state: JobState,
    /// Primary requirement expression (`feature=count` pairs, `:`-joined,
    /// alternatives `+`-joined).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<String>,
    /// Multiple-realization coordination key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_key: Option<String>,
    /// The job's environment variable list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl JobDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Load a running-job snapshot: a list of descriptors.
    pub fn load_all(path: &Path) -> Result<Vec<Self>> {
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Primary requirement expression, `None` when absent or blank.
    pub fn requirement(&self) -> Option<&str> {
        non_blank(self.alternatives.as_deref())
    }

    pub fn coordination_key(&self) -> Option<&str> {
        non_blank(self.mr_key.as_deref())
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// License server address from the job environment. Its absence is a
    /// configuration error: nothing can be queried without it.
    pub fn license_server(&self, variable: &str) -> Result<&str> {
        non_blank(self.variable(variable)).ok_or_else(|| {
            GateError::Configuration(format!(
                "environment variable \"{variable}\" is not defined for job {}",
                self.id
            ))
        })
    }

    /// Secondary (multiple-realization) requirement expression.
    pub fn secondary_requirement(&self, variable: &str) -> Option<&str> {
        non_blank(self.variable(variable))
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
