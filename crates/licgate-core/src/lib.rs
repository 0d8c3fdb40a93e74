//! Admission decisions for batch jobs that need software licenses.
//!
//! A job declares alternative license combinations
//! (`eclipse=1:compositional=2+eclipse=3`). [`orchestrator::AdmissionGate`]
//! checks live availability through a [`oracle::LicenseOracle`] and answers
//! with a [`decision::Decision`]: accept, defer until a later time, or
//! reject.

pub mod alternative;
pub mod availability;
pub mod config;
pub mod decision;
pub mod error;
pub mod io;
pub mod job;
pub mod lmstat;
pub mod oracle;
pub mod orchestrator;
pub mod paths;
pub mod realization;
pub mod throttle;

#[cfg(test)]
mod testing;

pub use decision::Decision;
pub use error::{GateError, Result};
