use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one admission evaluation. Terminal for that evaluation; any
/// retry happens when the host re-presents a deferred job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Defer {
        not_before: DateTime<Utc>,
        reason: String,
    },
    Reject {
        reason: String,
    },
}

impl Decision {
    pub fn defer(not_before: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Decision::Defer {
            not_before,
            reason: reason.into(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Decision::Reject {
            reason: reason.into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Defer { .. } => "defer",
            Decision::Reject { .. } => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => f.write_str("accept"),
            Decision::Defer { not_before, reason } => {
                write!(f, "defer until {}: {reason}", not_before.to_rfc3339())
            }
            Decision::Reject { reason } => write!(f, "reject: {reason}"),
        }
    }
}
