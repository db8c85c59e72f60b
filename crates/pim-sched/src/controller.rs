//! Threshold adaptation from prediction feedback
//!
//! Each completed job yields a relative error `|actual - predicted| / actual`.
//! The controller keeps the last `window_size` errors and compares their mean
//! against two bounds:
//! - mean above `upper_bound`: raise the threshold by `step` (PIM placement
//!   becomes more conservative)
//! - mean below `lower_bound`: lower the threshold by `step`
//! - otherwise leave it alone
//!
//! The threshold is clamped to `[min, max]` and moves at most one step per
//! sample.

use crate::{ClassifierState, Result, SchedError};
use serde::{Deserialize, Serialize};

/// Configuration for threshold adaptation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Starting threshold (default 0.004)
    pub initial: f64,
    /// Lower clamp (default 0.001)
    pub min: f64,
    /// Upper clamp (default 0.01)
    pub max: f64,
    /// Adjustment per feedback sample (default 0.0005)
    pub step: f64,
    /// Number of recent errors averaged (default 10)
    pub window_size: usize,
    /// Mean error above which the threshold rises (default 0.2)
    pub upper_bound: f64,
    /// Mean error below which the threshold falls (default 0.05)
    pub lower_bound: f64,
}

impl ThresholdConfig {
    /// Creates a new ThresholdConfig with default values.
    pub fn new() -> Self {
        Self {
            initial: 0.004,
            min: 0.001,
            max: 0.01,
            step: 0.0005,
            window_size: 10,
            upper_bound: 0.2,
            lower_bound: 0.05,
        }
    }

    /// Validates that all configuration values are within acceptable ranges.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err("min must be <= max".to_string());
        }
        if !(self.min..=self.max).contains(&self.initial) {
            return Err("initial must be between min and max".to_string());
        }
        if !(self.step > 0.0) {
            return Err("step must be greater than 0".to_string());
        }
        if self.window_size == 0 {
            return Err("window_size must be greater than 0".to_string());
        }
        if !(self.lower_bound >= 0.0) || self.lower_bound >= self.upper_bound {
            return Err("lower_bound must be >= 0 and < upper_bound".to_string());
        }
        Ok(())
    }

    pub fn with_initial(mut self, threshold: f64) -> Self {
        self.initial = threshold;
        self
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    pub fn with_error_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction the threshold moved on one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentDirection {
    Raised,
    Lowered,
    Unchanged,
}

/// Outcome of one feedback update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAdjustment {
    /// Error contributed by this sample
    pub relative_error: f64,
    /// Window mean after pushing the sample
    pub average_error: f64,
    pub previous: f64,
    pub current: f64,
    pub direction: AdjustmentDirection,
}

/// `|actual - predicted| / actual`, rejecting samples where that is undefined.
pub fn relative_error(actual: f64, predicted: f64) -> Result<f64> {
    let degenerate = |reason: &str| SchedError::DegenerateFeedback {
        actual,
        predicted,
        reason: reason.to_string(),
    };
    if !actual.is_finite() || !predicted.is_finite() {
        return Err(degenerate("times must be finite"));
    }
    if actual == 0.0 {
        return Err(degenerate("actual time is zero"));
    }
    if actual < 0.0 || predicted < 0.0 {
        return Err(degenerate("times must be non-negative"));
    }
    Ok((actual - predicted).abs() / actual)
}

#[derive(Debug, Clone, Default)]
pub struct ThresholdController {
    config: ThresholdConfig,
}

impl ThresholdController {
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Feed one `(actual, predicted)` sample and adapt the threshold.
    ///
    /// A degenerate sample is rejected before anything in `state` changes.
    pub fn update(
        &self,
        actual: f64,
        predicted: f64,
        state: &mut ClassifierState,
    ) -> Result<ThresholdAdjustment> {
        let error = relative_error(actual, predicted)?;
        state.push_error(error, self.config.window_size);
        let average_error = state.average_error().unwrap_or(error);

        let previous = state.threshold;
        let direction = if average_error > self.config.upper_bound && previous < self.config.max {
            state.threshold = (previous + self.config.step).min(self.config.max);
            AdjustmentDirection::Raised
        } else if average_error < self.config.lower_bound && previous > self.config.min {
            state.threshold = (previous - self.config.step).max(self.config.min);
            AdjustmentDirection::Lowered
        } else {
            AdjustmentDirection::Unchanged
        };

        match direction {
            AdjustmentDirection::Unchanged => tracing::debug!(
                relative_error = error,
                average_error,
                threshold = previous,
                "threshold unchanged"
            ),
            _ => tracing::info!(
                relative_error = error,
                average_error,
                previous = %format!("{:.5}", previous),
                current = %format!("{:.5}", state.threshold),
                ?direction,
                "threshold adjusted"
            ),
        }

        Ok(ThresholdAdjustment {
            relative_error: error,
            average_error,
            previous,
            current: state.threshold,
            direction,
        })
    }
}
