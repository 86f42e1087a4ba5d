//! Pruner configuration

use anyhow::{Context, Result};
use pruner_lib::cluster::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_MACHINE_NAMESPACE};
use pruner_lib::config::{DEFAULT_MAX_AGE_HOURS, DEFAULT_MAX_CONCURRENT_DELETING};
use pruner_lib::{parse_truthy, LabelSelector, OcClientConfig, PrunerError, PruningConfig};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

/// Pruner settings, read from the process environment
#[derive(Debug, Clone, Deserialize)]
pub struct PrunerSettings {
    /// Age in hours after which a running worker is pruned
    #[serde(default = "default_max_age_hours")]
    pub machine_max_age_hours: f64,

    /// Simulate deletions instead of performing them
    #[serde(default = "default_dry_run", deserialize_with = "deserialize_truthy")]
    pub dry_run: bool,

    /// Comma-separated label selectors added to the worker defaults
    #[serde(default)]
    pub additional_labels: String,

    /// Deletion budget shared by in-flight and new deletions
    #[serde(default = "default_max_deleting_at_once")]
    pub max_deleting_at_once: usize,

    #[serde(default = "default_machine_namespace")]
    pub machine_namespace: String,

    /// Cluster CLI binary
    #[serde(default = "default_oc_binary")]
    pub oc_binary: String,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Where to dump Prometheus metrics after the run, if anywhere
    #[serde(default)]
    pub metrics_textfile: Option<PathBuf>,
}

fn default_max_age_hours() -> f64 {
    DEFAULT_MAX_AGE_HOURS
}

fn default_dry_run() -> bool {
    true
}

fn default_max_deleting_at_once() -> usize {
    DEFAULT_MAX_CONCURRENT_DELETING
}

fn default_machine_namespace() -> String {
    DEFAULT_MACHINE_NAMESPACE.to_string()
}

fn default_oc_binary() -> String {
    "oc".to_string()
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT.as_secs()
}

fn deserialize_truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_truthy(&raw).map_err(serde::de::Error::custom)
}

impl PrunerSettings {
    /// Load settings from the process environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        config::Config::builder()
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| PrunerError::Config(e.to_string()))
            .context("Invalid pruner settings in environment")
    }

    pub fn pruning_config(&self) -> Result<PruningConfig> {
        PruningConfig::new(
            self.machine_max_age_hours,
            self.max_deleting_at_once,
            self.dry_run,
            LabelSelector::with_additional(&self.additional_labels),
        )
        .context("Invalid pruning settings")
    }

    pub fn oc_client_config(&self) -> OcClientConfig {
        OcClientConfig {
            binary: PathBuf::from(&self.oc_binary),
            namespace: self.machine_namespace.clone(),
            timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<PrunerSettings> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PrunerSettings::from_environment(config::Environment::default().source(Some(source)))
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.machine_max_age_hours, 168.0);
        assert!(settings.dry_run);
        assert_eq!(settings.additional_labels, "");
        assert_eq!(settings.max_deleting_at_once, 1);
        assert_eq!(settings.machine_namespace, "openshift-machine-api");
        assert_eq!(settings.oc_binary, "oc");
        assert_eq!(settings.command_timeout_secs, 60);
        assert!(settings.metrics_textfile.is_none());

        let config = settings.pruning_config().unwrap();
        assert_eq!(config, PruningConfig::default());
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("MACHINE_MAX_AGE_HOURS", "72.5"),
            ("DRY_RUN", "off"),
            ("ADDITIONAL_LABELS", "pool=spot,zone=b"),
            ("MAX_DELETING_AT_ONCE", "3"),
            ("METRICS_TEXTFILE", "/var/lib/node_exporter/pruner.prom"),
        ])
        .unwrap();

        let config = settings.pruning_config().unwrap();
        assert_eq!(config.max_age_hours(), 72.5);
        assert!(!config.dry_run());
        assert_eq!(config.max_concurrent_deleting(), 3);
        assert_eq!(config.label_selector().labels().len(), 4);
        assert_eq!(
            settings.metrics_textfile,
            Some(PathBuf::from("/var/lib/node_exporter/pruner.prom"))
        );
    }

    #[test]
    fn test_invalid_dry_run_rejected() {
        let err = settings(&[("DRY_RUN", "sometimes")]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrunerError>(),
            Some(PrunerError::Config(_))
        ));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let settings = settings(&[("MAX_DELETING_AT_ONCE", "0")]).unwrap();
        assert!(settings.pruning_config().is_err());
    }

    #[test]
    fn test_oc_client_config() {
        let settings = settings(&[
            ("MACHINE_NAMESPACE", "machines"),
            ("OC_BINARY", "/usr/local/bin/oc"),
            ("COMMAND_TIMEOUT_SECS", "15"),
        ])
        .unwrap();

        let oc = settings.oc_client_config();
        assert_eq!(oc.binary, PathBuf::from("/usr/local/bin/oc"));
        assert_eq!(oc.namespace, "machines");
        assert_eq!(oc.timeout, Duration::from_secs(15));
    }
}
