//! Resource selection policies.
//!
//! Given a decision and the catalog, pick one concrete resource of the
//! decided class. Policies are interchangeable behind [`SelectionPolicy`].

use crate::{Decision, ResourceDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Picks a resource for a job that has already been classified.
///
/// `predicted_time` is the predicted runtime of the job being placed. It must
/// come from that job's own classification, never from an arbitrary entry in
/// the prediction store.
pub trait SelectionPolicy: Send + Sync {
    /// Returns `None` when no resource of the decided class exists.
    fn select<'a>(
        &self,
        resources: &'a [ResourceDescriptor],
        decision: Decision,
        predicted_time: f64,
    ) -> Option<&'a ResourceDescriptor>;

    /// Policy name for diagnostics.
    fn name(&self) -> &'static str;
}

/// First resource of the decided class, in catalog order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl SelectionPolicy for FirstMatch {
    fn select<'a>(
        &self,
        resources: &'a [ResourceDescriptor],
        decision: Decision,
        _predicted_time: f64,
    ) -> Option<&'a ResourceDescriptor> {
        resources.iter().find(|r| r.matches(decision))
    }

    fn name(&self) -> &'static str {
        "first-match"
    }
}

/// Resource of the decided class with the lowest estimated energy.
///
/// Energy is `predicted_time * assumed_power_watts`. Only strictly lower
/// energy replaces the current best, so ties keep the earliest resource.
#[derive(Debug, Clone, Copy)]
pub struct LowestEnergy {
    pub assumed_power_watts: f64,
}

impl LowestEnergy {
    pub fn new(assumed_power_watts: f64) -> Self {
        Self { assumed_power_watts }
    }

    /// Estimated energy (joules) for running a job of `predicted_time` on `_resource`.
    pub fn estimate_energy(&self, _resource: &ResourceDescriptor, predicted_time: f64) -> f64 {
        predicted_time * self.assumed_power_watts
    }
}

impl Default for LowestEnergy {
    fn default() -> Self {
        Self::new(DEFAULT_ASSUMED_POWER_WATTS)
    }
}

impl SelectionPolicy for LowestEnergy {
    fn select<'a>(
        &self,
        resources: &'a [ResourceDescriptor],
        decision: Decision,
        predicted_time: f64,
    ) -> Option<&'a ResourceDescriptor> {
        let mut best: Option<(&ResourceDescriptor, f64)> = None;
        for resource in resources.iter().filter(|r| r.matches(decision)) {
            let energy = self.estimate_energy(resource, predicted_time);
            match best {
                Some((_, best_energy)) if energy >= best_energy => {}
                _ => best = Some((resource, energy)),
            }
        }
        best.map(|(resource, energy)| {
            tracing::trace!(resource_id = resource.id.as_u64(), energy, "lowest-energy pick");
            resource
        })
    }

    fn name(&self) -> &'static str {
        "lowest-energy"
    }
}

/// Default power draw assumed by [`LowestEnergy`].
pub const DEFAULT_ASSUMED_POWER_WATTS: f64 = 100.0;

/// Configurable choice of selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    #[default]
    FirstMatch,
    LowestEnergy,
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionStrategy::FirstMatch => f.write_str("first-match"),
            SelectionStrategy::LowestEnergy => f.write_str("lowest-energy"),
        }
    }
}

impl FromStr for SelectionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "first-match" | "first" => Ok(SelectionStrategy::FirstMatch),
            "lowest-energy" | "energy" => Ok(SelectionStrategy::LowestEnergy),
            other => Err(format!("unknown selection strategy: {}", other)),
        }
    }
}

/// Selection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub strategy: SelectionStrategy,
    /// Power assumed by the lowest-energy policy (default 100W)
    pub assumed_power_watts: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::default(),
            assumed_power_watts: DEFAULT_ASSUMED_POWER_WATTS,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.assumed_power_watts > 0.0) || !self.assumed_power_watts.is_finite() {
            return Err("assumed_power_watts must be positive".to_string());
        }
        Ok(())
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Build the configured policy.
    pub fn build(&self) -> Box<dyn SelectionPolicy> {
        match self.strategy {
            SelectionStrategy::FirstMatch => Box::new(FirstMatch),
            SelectionStrategy::LowestEnergy => Box::new(LowestEnergy::new(self.assumed_power_watts)),
        }
    }
}
