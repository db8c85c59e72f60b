//! Top-level configuration file.

use crate::{ConfigError, Result};
use pim_sched::{
    CatalogConfig, ClassifierConfig, SchedulerConfig, SelectionConfig, ThresholdConfig,
};
use pim_telemetry::{LogConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Overrides the logging level.
pub const ENV_LOG_LEVEL: &str = "PIM_LOG_LEVEL";
/// Overrides the selection strategy.
pub const ENV_SELECTION: &str = "PIM_SELECTION";
/// Overrides the initial threshold.
pub const ENV_INITIAL_THRESHOLD: &str = "PIM_INITIAL_THRESHOLD";
/// Overrides the compute capacity cutoff.
pub const ENV_CAPACITY_CUTOFF: &str = "PIM_CAPACITY_CUTOFF";

/// Scheduler-wide switches that don't belong to a single component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub evict_applied_predictions: bool,
}

/// Complete scheduler configuration, as read from a TOML file.
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PimConfig {
    pub catalog: CatalogConfig,
    pub classifier: ClassifierConfig,
    pub threshold: ThresholdConfig,
    pub selection: SelectionConfig,
    pub scheduler: SchedulerSection,
    pub logging: LogConfig,
}

impl PimConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `PIM_*` environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    ///
    /// The overrides are validated as a whole; on any error `self` is left
    /// unchanged.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut next = self.clone();
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            next.logging.level = LogLevel::parse(&level)
                .map_err(|e| ConfigError::EnvVar(format!("{}: {}", ENV_LOG_LEVEL, e)))?;
        }
        if let Some(strategy) = lookup(ENV_SELECTION) {
            next.selection.strategy = strategy
                .parse()
                .map_err(|e| ConfigError::EnvVar(format!("{}: {}", ENV_SELECTION, e)))?;
        }
        if let Some(initial) = lookup(ENV_INITIAL_THRESHOLD) {
            next.threshold.initial = parse_f64(ENV_INITIAL_THRESHOLD, &initial)?;
        }
        if let Some(cutoff) = lookup(ENV_CAPACITY_CUTOFF) {
            next.catalog.capacity_cutoff = parse_f64(ENV_CAPACITY_CUTOFF, &cutoff)?;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Scheduler configuration assembled from the component sections.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            classifier: self.classifier.clone(),
            threshold: self.threshold.clone(),
            selection: self.selection.clone(),
            evict_applied_predictions: self.scheduler.evict_applied_predictions,
        }
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::EnvVar(format!("{}: {:?} is not a number ({})", key, value, e)))
}
