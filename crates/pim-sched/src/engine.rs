//! Execution engine boundary.
//!
//! The placement core never runs jobs itself. An [`ExecutionEngine`] takes
//! the batch's assignments and reports one [`Completion`] per executed job;
//! the order of the returned completions is the order feedback is applied in.

use crate::{JobId, JobProfile, ResourceDescriptor, ResourceId, Result, SchedError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A job bound to a resource, ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub job: JobProfile,
    pub resource: ResourceDescriptor,
    /// Predicted runtime recorded when the job was classified
    pub predicted_time: f64,
}

/// Measured outcome of one executed job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub job_id: JobId,
    pub resource_id: ResourceId,
    /// Execution time on the resource, in seconds
    pub actual_time: f64,
    pub start_time: f64,
    pub finish_time: f64,
}

/// Something that can run a batch of assignments to completion.
pub trait ExecutionEngine {
    fn execute(&mut self, assignments: &[Assignment]) -> Result<Vec<Completion>>;
}

/// Deterministic reference engine.
///
/// Each resource runs its jobs one after another in submission order
/// (space-shared). A job takes `length / capacity` seconds. Completions come
/// back ordered by finish time, then job id.
#[derive(Debug, Clone, Default)]
pub struct LinearEngine {
    clock: f64,
}

impl LinearEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated time at which the last batch finished.
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

impl ExecutionEngine for LinearEngine {
    fn execute(&mut self, assignments: &[Assignment]) -> Result<Vec<Completion>> {
        let batch_start = self.clock;
        let mut free_at: HashMap<ResourceId, f64> = HashMap::new();
        let mut completions = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let resource = &assignment.resource;
            if !(resource.capacity > 0.0) {
                return Err(SchedError::Engine(format!(
                    "resource {} has no capacity",
                    resource.id
                )));
            }
            let actual_time = assignment.job.length() as f64 / resource.capacity;
            let start_time = *free_at.get(&resource.id).unwrap_or(&batch_start);
            let finish_time = start_time + actual_time;
            free_at.insert(resource.id, finish_time);

            completions.push(Completion {
                job_id: assignment.job.id(),
                resource_id: resource.id,
                actual_time,
                start_time,
                finish_time,
            });
        }

        completions.sort_by(|a, b| {
            a.finish_time
                .total_cmp(&b.finish_time)
                .then_with(|| a.job_id.cmp(&b.job_id))
        });
        if let Some(last) = completions.last() {
            self.clock = last.finish_time;
        }
        Ok(completions)
    }
}
