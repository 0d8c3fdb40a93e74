use crate::output::print_decision;
use anyhow::Context;
use chrono::Utc;
use licgate_core::config::GateConfig;
use licgate_core::job::JobDescriptor;
use licgate_core::lmstat::Lmstat;
use licgate_core::orchestrator::AdmissionGate;
use licgate_core::throttle::ThrottleStore;
use licgate_core::Decision;
use std::path::Path;

pub fn run(
    config_path: &Path,
    job_path: &Path,
    running_path: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let job = JobDescriptor::load(job_path)
        .with_context(|| format!("failed to read job descriptor {}", job_path.display()))?;

    if job.requirement().is_none() {
        tracing::debug!(job = %job.id, "no license requirement, leaving job alone");
        return print_decision(None, json);
    }

    let running = match running_path {
        Some(p) => JobDescriptor::load_all(p)
            .with_context(|| format!("failed to read job snapshot {}", p.display()))?,
        None => Vec::new(),
    };

    let decision = match decide(config_path, &job, &running) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(job = %job.id, error = %e, "hook setup failed, rejecting job");
            Some(Decision::reject(format!("licgate hook failed: {e}")))
        }
    };

    print_decision(decision.as_ref(), json)
}

/// Set up the gate from configuration and decide. Setup failures are
/// returned so the caller can reject instead of letting the job through.
fn decide(
    config_path: &Path,
    job: &JobDescriptor,
    running: &[JobDescriptor],
) -> licgate_core::Result<Option<Decision>> {
    let config = GateConfig::load(config_path)?;
    let lmstat = Lmstat::new(
        config.resolve_lmutil()?,
        config.vendor_daemon.clone(),
        config.query_timeout(),
    );
    let mut store = ThrottleStore::open(&config.throttle_state_path)?;

    let mut gate = AdmissionGate::new(&config, &lmstat, &mut store);
    Ok(gate.decide(job, running, Utc::now()))
}
