//! Long-lived classifier state.
//!
//! One `ClassifierState` exists per scheduler instance. Classification reads
//! the threshold and writes predictions; feedback pushes errors into the
//! window and may move the threshold. Nothing resets it mid-batch.

use crate::controller::ThresholdConfig;
use crate::PredictionStore;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ClassifierState {
    pub(crate) threshold: f64,
    pub(crate) error_window: VecDeque<f64>,
    pub(crate) predictions: PredictionStore,
}

impl ClassifierState {
    /// Fresh state starting at `threshold` with an empty window and store.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            error_window: VecDeque::new(),
            predictions: PredictionStore::new(),
        }
    }

    /// Fresh state seeded from the controller configuration.
    pub fn from_config(config: &ThresholdConfig) -> Self {
        let mut state = Self::with_threshold(config.initial);
        state.error_window.reserve(config.window_size);
        state
    }

    /// Current ratio threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Most recent relative errors, oldest first.
    pub fn error_window(&self) -> &VecDeque<f64> {
        &self.error_window
    }

    /// Mean of the error window, `None` while it is empty.
    pub fn average_error(&self) -> Option<f64> {
        if self.error_window.is_empty() {
            None
        } else {
            Some(self.error_window.iter().sum::<f64>() / self.error_window.len() as f64)
        }
    }

    pub fn predictions(&self) -> &PredictionStore {
        &self.predictions
    }

    pub fn predictions_mut(&mut self) -> &mut PredictionStore {
        &mut self.predictions
    }

    /// Push `error`, evicting the oldest samples past `capacity` (FIFO).
    pub(crate) fn push_error(&mut self, error: f64, capacity: usize) {
        self.error_window.push_back(error);
        while self.error_window.len() > capacity {
            self.error_window.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_config() {
        let state = ClassifierState::from_config(&ThresholdConfig::default());
        assert_eq!(state.threshold(), 0.004);
        assert!(state.error_window().is_empty());
        assert!(state.predictions().is_empty());
        assert_eq!(state.average_error(), None);
    }

    #[test]
    fn test_push_error_evicts_oldest() {
        let mut state = ClassifierState::with_threshold(0.004);
        for i in 0..5 {
            state.push_error(i as f64, 3);
        }
        let window: Vec<f64> = state.error_window().iter().copied().collect();
        assert_eq!(window, vec![2.0, 3.0, 4.0]);
        assert_eq!(state.average_error(), Some(3.0));
    }
}
