//! Result of one simulated attack.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Attack family a test belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Byzantine,
    Sybil,
    Eclipse,
    Dos,
    Crypto,
}

impl TestCategory {
    /// Failures here drive the overall risk to HIGH.
    pub fn is_critical(&self) -> bool {
        matches!(self, TestCategory::Byzantine | TestCategory::Sybil)
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestCategory::Byzantine => "byzantine",
            TestCategory::Sybil => "sybil",
            TestCategory::Eclipse => "eclipse",
            TestCategory::Dos => "dos",
            TestCategory::Crypto => "crypto",
        };
        f.write_str(name)
    }
}

/// Pass/fail record of one test, with the measurements behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub category: TestCategory,
    pub passed: bool,
    pub metrics: BTreeMap<String, f64>,
    pub details: String,
    /// Set when the simulator itself failed
    pub error: Option<String>,
}

impl TestOutcome {
    pub fn new(name: impl Into<String>, category: TestCategory, passed: bool) -> Self {
        Self {
            name: name.into(),
            category,
            passed,
            metrics: BTreeMap::new(),
            details: String::new(),
            error: None,
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Failed outcome for a simulator that errored.
    pub fn errored(name: impl Into<String>, category: TestCategory, error: &SimulationError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(name, category, false)
        }
    }
}

/// `part / whole`, zero when `whole` is zero.
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errored_outcome_fails() {
        let outcome = TestOutcome::errored(
            "dos_flood",
            TestCategory::Dos,
            &SimulationError::Setup("no clock".into()),
        );
        assert!(!outcome.passed);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Scenario setup failed: no clock")
        );
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(9, 10), 0.9);
        assert_eq!(ratio(1, 0), 0.0);
    }

    #[test]
    fn test_critical_categories() {
        assert!(TestCategory::Byzantine.is_critical());
        assert!(TestCategory::Sybil.is_critical());
        assert!(!TestCategory::Crypto.is_critical());
    }
}
