//! Per-job runtime prediction cache.
//!
//! The classifier records an early runtime estimate for every job it sees;
//! feedback later pairs that estimate with the measured runtime.

use crate::JobId;
use std::collections::HashMap;

/// Value returned by [`PredictionStore::get`] for an unknown job.
pub const MISSING_PREDICTION: f64 = -1.0;

/// Mapping of job id to predicted runtime in seconds. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct PredictionStore {
    predictions: HashMap<JobId, f64>,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or overwrite) the prediction for `job_id`.
    pub fn save(&mut self, job_id: JobId, time: f64) {
        if let Some(previous) = self.predictions.insert(job_id, time) {
            tracing::trace!(job_id = job_id.as_u64(), previous, time, "prediction overwritten");
        }
    }

    /// Predicted runtime, or [`MISSING_PREDICTION`] if none was recorded.
    pub fn get(&self, job_id: JobId) -> f64 {
        self.lookup(job_id).unwrap_or(MISSING_PREDICTION)
    }

    pub fn lookup(&self, job_id: JobId) -> Option<f64> {
        self.predictions.get(&job_id).copied()
    }

    pub fn remove(&mut self, job_id: JobId) -> Option<f64> {
        self.predictions.remove(&job_id)
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.predictions.contains_key(&job_id)
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
