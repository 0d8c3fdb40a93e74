use crate::error::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AvailabilityQuote
// ---------------------------------------------------------------------------

/// Issued and in-use counts for one feature at the moment it was queried.
/// Quotes are never cached; each evaluation asks again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuote {
    pub issued: u32,
    pub used: u32,
}

impl AvailabilityQuote {
    pub fn new(issued: u32, used: u32) -> Self {
        Self { issued, used }
    }

    /// Free seats. Servers can briefly report more users than issued seats
    /// (e.g. borrowed or overdraft licenses), which counts as zero free.
    pub fn free(&self) -> u32 {
        self.issued.saturating_sub(self.used)
    }

    pub fn covers(&self, required: u32) -> bool {
        self.free() >= required
    }
}

// ---------------------------------------------------------------------------
// Oracle seams
// ---------------------------------------------------------------------------

/// Live license availability for one license server.
///
/// Implementations must bound their latency: evaluations run on the
/// scheduler's critical path.
pub trait LicenseOracle {
    fn query(&self, feature: &str) -> Result<AvailabilityQuote>;
}

impl<T: LicenseOracle + ?Sized> LicenseOracle for &T {
    fn query(&self, feature: &str) -> Result<AvailabilityQuote> {
        (**self).query(feature)
    }
}

/// Produces an oracle bound to a license server address taken from the job.
pub trait OracleSource {
    fn connect<'a>(&'a self, server: &str) -> Result<Box<dyn LicenseOracle + 'a>>;
}
