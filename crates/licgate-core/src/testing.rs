//! In-memory license server used by unit tests.

use crate::error::{GateError, Result};
use crate::oracle::{AvailabilityQuote, LicenseOracle, OracleSource};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct FakeLicenseServer {
    quotes: HashMap<String, AvailabilityQuote>,
    queries: RefCell<Vec<String>>,
    servers: RefCell<Vec<String>>,
}

impl FakeLicenseServer {
    /// Each entry is `(feature, free)`; issued is set to `free` with no users.
    pub(crate) fn with_free(entries: &[(&str, u32)]) -> Self {
        let quotes = entries
            .iter()
            .map(|(f, free)| (f.to_string(), AvailabilityQuote::new(*free, 0)))
            .collect();
        Self {
            quotes,
            ..Default::default()
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    pub(crate) fn servers(&self) -> Vec<String> {
        self.servers.borrow().clone()
    }
}

impl LicenseOracle for FakeLicenseServer {
    fn query(&self, feature: &str) -> Result<AvailabilityQuote> {
        self.queries.borrow_mut().push(feature.to_string());
        self.quotes
            .get(feature)
            .copied()
            .ok_or_else(|| GateError::query(feature, "feature not found in server report"))
    }
}

impl OracleSource for FakeLicenseServer {
    fn connect<'a>(&'a self, server: &str) -> Result<Box<dyn LicenseOracle + 'a>> {
        self.servers.borrow_mut().push(server.to_string());
        Ok(Box::new(self))
    }
}
