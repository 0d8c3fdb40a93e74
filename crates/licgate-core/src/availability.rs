use crate::alternative::{AlternativeSet, LicenseAlternative};
use crate::error::Result;
use crate::oracle::LicenseOracle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

// ---------------------------------------------------------------------------
// ManagedFeatures
// ---------------------------------------------------------------------------

/// Features this gate is allowed to query. Anything else is never queried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedFeatures(BTreeSet<String>);

impl ManagedFeatures {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(features.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.0.contains(feature)
    }

    /// True when every feature of `alternative` is managed.
    pub fn covers(&self, alternative: &LicenseAlternative) -> bool {
        alternative.features().all(|f| self.contains(f))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability {
    /// The alternative at `index` (declaration order) is fully available.
    Satisfied { index: usize },
    /// At least one managed alternative was tried and each fell short.
    /// `features` is the union of the features that were insufficient.
    Blocked { features: BTreeSet<String> },
    /// Nothing could be checked: no alternatives, or none fully managed.
    /// Waiting will not change this outcome.
    Unviable,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Find the first alternative, in declared order, whose features are all
/// managed and currently available.
///
/// Alternatives with any unmanaged feature are skipped without a single
/// query. Within an alternative the first short feature is recorded and
/// the rest of that alternative is not queried. The walk stops at the
/// first satisfied alternative. Oracle failures abort the evaluation.
pub fn evaluate(
    alternatives: &AlternativeSet,
    managed: &ManagedFeatures,
    oracle: &dyn LicenseOracle,
) -> Result<Availability> {
    let mut blocking = BTreeSet::new();

    for (index, alternative) in alternatives.iter().enumerate() {
        if !managed.covers(alternative) {
            debug!(%alternative, "skipping alternative with unmanaged features");
            continue;
        }
        debug!(%alternative, "checking license alternative");

        let mut short = None;
        for req in alternative.requirements() {
            let quote = oracle.query(&req.feature)?;
            debug!(
                feature = %req.feature,
                required = req.count,
                issued = quote.issued,
                used = quote.used,
                "license quote"
            );
            if !quote.covers(req.count) {
                short = Some(req.feature.clone());
                break;
            }
        }

        match short {
            None => return Ok(Availability::Satisfied { index }),
            Some(feature) => {
                blocking.insert(feature);
            }
        }
    }

    if blocking.is_empty() {
        Ok(Availability::Unviable)
    } else {
        Ok(Availability::Blocked { features: blocking })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
