//! Multiple-realization groups.
//!
//! Jobs that share a coordination key cooperate: only one representative
//! has to validate the group's secondary requirement. When a member of the
//! group is already running, the check was done and is skipped.

use crate::alternative;
use crate::availability::{self, Availability, ManagedFeatures};
use crate::decision::Decision;
use crate::error::Result;
use crate::job::JobDescriptor;
use crate::oracle::LicenseOracle;
use tracing::debug;

pub struct RealizationCoordinator<'a> {
    secondary_variable: &'a str,
}

impl<'a> RealizationCoordinator<'a> {
    /// `secondary_variable` names the job environment variable holding the
    /// secondary requirement expression.
    pub fn new(secondary_variable: &'a str) -> Self {
        Self { secondary_variable }
    }

    pub fn is_group_member(&self, job: &JobDescriptor) -> bool {
        self.group_requirement(job).is_some()
    }

    /// Secondary expression of a group member; `None` for any other job.
    fn group_requirement<'j>(&self, job: &'j JobDescriptor) -> Option<&'j str> {
        job.coordination_key()?;
        job.secondary_requirement(self.secondary_variable)
    }

    /// True when another running job carries the same coordination key.
    pub fn is_peer_running(&self, job: &JobDescriptor, running: &[JobDescriptor]) -> bool {
        let Some(key) = job.coordination_key() else {
            return false;
        };
        running
            .iter()
            .filter(|other| other.id != job.id && other.is_running())
            .any(|other| other.coordination_key() == Some(key))
    }

    /// Secondary check for a job whose primary requirement is satisfied.
    ///
    /// Returns `Some(Reject)` when the job is the group's representative
    /// and the secondary requirement cannot be met. Never defers.
    pub fn check(
        &self,
        job: &JobDescriptor,
        running: &[JobDescriptor],
        managed: &ManagedFeatures,
        oracle: &dyn LicenseOracle,
    ) -> Result<Option<Decision>> {
        let Some(expression) = self.group_requirement(job) else {
            return Ok(None);
        };
        if self.is_peer_running(job, running) {
            debug!(job = %job.id, "group peer already running, skipping secondary check");
            return Ok(None);
        }

        let alternatives = alternative::parse(expression)?;
        match availability::evaluate(&alternatives, managed, oracle)? {
            Availability::Satisfied { .. } => Ok(None),
            Availability::Blocked { features } => Ok(Some(Decision::reject(format!(
                "licenses for a multiple realization job are not available: missing licenses = {}",
                features.into_iter().collect::<Vec<_>>().join(", ")
            )))),
            Availability::Unviable => Ok(Some(Decision::reject(format!(
                "no valid license alternative for a multiple realization job in '{expression}'"
            )))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
