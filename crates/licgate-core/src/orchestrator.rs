use crate::alternative;
use crate::availability::{self, Availability};
use crate::config::GateConfig;
use crate::decision::Decision;
use crate::error::Result;
use crate::job::JobDescriptor;
use crate::oracle::OracleSource;
use crate::realization::RealizationCoordinator;
use crate::throttle::{self, ThrottleStore};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

/// Sequences throttle, availability, and group checks into one decision
/// per job.
pub struct AdmissionGate<'a> {
    config: &'a GateConfig,
    source: &'a dyn OracleSource,
    throttle: &'a mut ThrottleStore,
}

impl<'a> AdmissionGate<'a> {
    pub fn new(
        config: &'a GateConfig,
        source: &'a dyn OracleSource,
        throttle: &'a mut ThrottleStore,
    ) -> Self {
        Self {
            config,
            source,
            throttle,
        }
    }

    /// Evaluate `job`, turning any internal failure into a rejection.
    ///
    /// Returns `None` when the job declares no license requirement.
    pub fn decide(
        &mut self,
        job: &JobDescriptor,
        running: &[JobDescriptor],
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        match self.evaluate(job, running, now) {
            Ok(decision) => decision,
            Err(e) => {
                error!(job = %job.id, error = %e, "license check failed, rejecting job");
                Some(Decision::reject(format!("license check failed: {e}")))
            }
        }
    }

    /// Evaluate `job` against current license availability.
    ///
    /// Errors are returned as-is; callers that must never let a job through
    /// on failure should use [`AdmissionGate::decide`].
    pub fn evaluate(
        &mut self,
        job: &JobDescriptor,
        running: &[JobDescriptor],
        now: DateTime<Utc>,
    ) -> Result<Option<Decision>> {
        let Some(expression) = job.requirement() else {
            debug!(job = %job.id, "no license requirement declared");
            return Ok(None);
        };
        let server = job.license_server(&self.config.license_server_variable)?;

        let Some(lease) = self.throttle.try_lock()? else {
            let not_before = now + self.config.interval();
            info!(job = %job.id, %not_before, "license check already in progress, deferring");
            return Ok(Some(Decision::defer(
                not_before,
                "another license check is in progress",
            )));
        };
        let state = lease.load()?;
        if let Some(decision) = throttle::check(&state, now, self.config.interval()) {
            info!(job = %job.id, %decision, "throttled");
            return Ok(Some(decision));
        }

        let alternatives = alternative::parse(expression)?;
        let managed = self.config.managed();
        let oracle = self.source.connect(server)?;

        let decision = match availability::evaluate(&alternatives, &managed, oracle.as_ref())? {
            Availability::Satisfied { index } => {
                debug!(job = %job.id, index, "license alternative available");
                let coordinator =
                    RealizationCoordinator::new(&self.config.secondary_requirement_variable);
                match coordinator.check(job, running, &managed, oracle.as_ref())? {
                    Some(reject) => reject,
                    None => {
                        lease.record(now)?;
                        Decision::Accept
                    }
                }
            }
            Availability::Blocked { features } => Decision::defer(
                now + self.config.delay(),
                format!(
                    "licenses are not available: missing licenses = {}",
                    features.into_iter().collect::<Vec<_>>().join(", ")
                ),
            ),
            Availability::Unviable => Decision::reject(format!(
                "no valid license alternative in '{expression}' for the managed features"
            )),
        };

        info!(job = %job.id, %decision, "license admission decision");
        Ok(Some(decision))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
