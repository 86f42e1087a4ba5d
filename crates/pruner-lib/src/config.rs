//! Pruning configuration
//!
//! Built once at process entry and passed explicitly into the policy and
//! runner. Nothing here reads the environment.

use serde::Serialize;
use std::fmt;

use crate::error::{PrunerError, PrunerResult};

/// Default maximum machine age (7 days)
pub const DEFAULT_MAX_AGE_HOURS: f64 = 168.0;

/// Default number of machines allowed in the Deleting phase at once
pub const DEFAULT_MAX_CONCURRENT_DELETING: usize = 1;

/// Selectors every run filters on
pub const DEFAULT_WORKER_LABELS: [&str; 2] = [
    "machine.openshift.io/cluster-api-machine-type=worker",
    "machine.openshift.io/cluster-api-machine-role=worker",
];

/// Label selector passed through to the machine listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSelector {
    labels: Vec<String>,
}

impl Default for LabelSelector {
    fn default() -> Self {
        Self {
            labels: DEFAULT_WORKER_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl LabelSelector {
    /// Default worker selectors plus comma-separated extras; empty entries are skipped
    pub fn with_additional(additional: &str) -> Self {
        let mut selector = Self::default();
        selector.labels.extend(
            additional
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string),
        );
        selector
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels.join(","))
    }
}

/// Parameters for one pruning evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PruningConfig {
    max_age_hours: f64,
    max_concurrent_deleting: usize,
    dry_run: bool,
    label_selector: LabelSelector,
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
            max_concurrent_deleting: DEFAULT_MAX_CONCURRENT_DELETING,
            dry_run: true,
            label_selector: LabelSelector::default(),
        }
    }
}

impl PruningConfig {
    /// Create a validated configuration
    pub fn new(
        max_age_hours: f64,
        max_concurrent_deleting: usize,
        dry_run: bool,
        label_selector: LabelSelector,
    ) -> PrunerResult<Self> {
        if !max_age_hours.is_finite() || max_age_hours <= 0.0 {
            return Err(PrunerError::Config(format!(
                "max age must be a positive number of hours, got {}",
                max_age_hours
            )));
        }
        if max_concurrent_deleting == 0 {
            return Err(PrunerError::Config(
                "max concurrent deleting must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_age_hours,
            max_concurrent_deleting,
            dry_run,
            label_selector,
        })
    }

    pub fn max_age_hours(&self) -> f64 {
        self.max_age_hours
    }

    pub fn max_concurrent_deleting(&self) -> usize {
        self.max_concurrent_deleting
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn label_selector(&self) -> &LabelSelector {
        &self.label_selector
    }
}

/// Parse a boolean-like token (`yes`, `off`, `1`, ...)
pub fn parse_truthy(raw: &str) -> PrunerResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(PrunerError::Config(format!(
            "invalid truth value {:?}",
            raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PruningConfig::default();
        assert_eq!(config.max_age_hours(), 168.0);
        assert_eq!(config.max_concurrent_deleting(), 1);
        assert!(config.dry_run());
        assert_eq!(config.label_selector().labels().len(), 2);
    }

    #[test]
    fn test_rejects_non_positive_age() {
        for age in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = PruningConfig::new(age, 1, true, LabelSelector::default());
            assert!(matches!(result, Err(PrunerError::Config(_))), "age {}", age);
        }
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let result = PruningConfig::new(168.0, 0, true, LabelSelector::default());
        assert!(matches!(result, Err(PrunerError::Config(_))));
    }

    #[test]
    fn test_selector_defaults() {
        assert_eq!(
            LabelSelector::default().to_string(),
            "machine.openshift.io/cluster-api-machine-type=worker,\
             machine.openshift.io/cluster-api-machine-role=worker"
        );
    }

    #[test]
    fn test_selector_additional_labels_skip_empty() {
        let selector = LabelSelector::with_additional("pool=spot,,zone=a,");
        assert_eq!(selector.labels().len(), 4);
        assert_eq!(selector.labels()[2], "pool=spot");
        assert_eq!(selector.labels()[3], "zone=a");
    }

    #[test]
    fn test_selector_empty_additional() {
        assert_eq!(LabelSelector::with_additional(""), LabelSelector::default());
    }

    #[test]
    fn test_parse_truthy() {
        for raw in ["y", "YES", "t", "True", "on", "1", " true "] {
            assert!(parse_truthy(raw).unwrap(), "{}", raw);
        }
        for raw in ["n", "No", "f", "FALSE", "off", "0"] {
            assert!(!parse_truthy(raw).unwrap(), "{}", raw);
        }
        assert!(parse_truthy("maybe").is_err());
        assert!(parse_truthy("").is_err());
    }
}
