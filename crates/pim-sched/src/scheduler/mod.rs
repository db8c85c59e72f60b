//! Scheduler - owns the classifier state and drives one batch at a time.
//!
//! Per batch:
//! 1. Classify every job and record its predicted runtime
//! 2. Select a resource of the decided class (or mark the job unplaceable)
//! 3. Hand the assignments to the execution engine
//! 4. Apply feedback for every completion, in completion order
//!
//! Feedback is deferred until the whole batch has executed, so threshold
//! moves caused by this batch only affect the next one.

use crate::{
    Assignment, BatchReport, Classification, Classifier, ClassifierConfig, ClassifierState,
    Completion, ExecutionEngine, JobId, JobProfile, ReportRow, ResourceCatalog,
    ResourceDescriptor, Result, SchedError, SelectionConfig, SelectionPolicy,
    ThresholdAdjustment, ThresholdConfig, ThresholdController,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Configuration for the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub classifier: ClassifierConfig,
    pub threshold: ThresholdConfig,
    pub selection: SelectionConfig,
    /// Drop a job's prediction once its feedback has been applied (default false).
    ///
    /// Keeps the prediction store bounded when one scheduler serves many batches.
    pub evict_applied_predictions: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            threshold: ThresholdConfig::default(),
            selection: SelectionConfig::default(),
            evict_applied_predictions: false,
        }
    }
}

impl SchedulerConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.classifier
            .validate()
            .map_err(|e| SchedError::InvalidConfig(format!("classifier: {}", e)))?;
        self.threshold
            .validate()
            .map_err(|e| SchedError::InvalidConfig(format!("threshold: {}", e)))?;
        self.selection
            .validate()
            .map_err(|e| SchedError::InvalidConfig(format!("selection: {}", e)))?;
        Ok(())
    }

    pub fn with_selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdConfig) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_evict_applied_predictions(mut self, evict: bool) -> Self {
        self.evict_applied_predictions = evict;
        self
    }
}

/// Result of placing one job.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// Bound to a resource of the decided class.
    Placed {
        job: JobProfile,
        resource: ResourceDescriptor,
        classification: Classification,
    },
    /// No resource of the decided class is available right now.
    Unplaceable {
        job: JobProfile,
        classification: Classification,
    },
}

impl PlacementOutcome {
    pub fn job_id(&self) -> JobId {
        match self {
            PlacementOutcome::Placed { job, .. } | PlacementOutcome::Unplaceable { job, .. } => {
                job.id()
            }
        }
    }

    pub fn classification(&self) -> &Classification {
        match self {
            PlacementOutcome::Placed { classification, .. }
            | PlacementOutcome::Unplaceable { classification, .. } => classification,
        }
    }

    pub fn resource(&self) -> Option<&ResourceDescriptor> {
        match self {
            PlacementOutcome::Placed { resource, .. } => Some(resource),
            PlacementOutcome::Unplaceable { .. } => None,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed { .. })
    }
}

/// Placement of a whole batch, before execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPlan {
    pub assignments: Vec<Assignment>,
    pub unplaced: Vec<JobId>,
}

/// Adaptive PIM/CPU scheduler.
pub struct PimScheduler {
    config: SchedulerConfig,
    state: ClassifierState,
    classifier: Classifier,
    controller: ThresholdController,
    policy: Box<dyn SelectionPolicy>,
    batches_run: u64,
}

impl PimScheduler {
    /// Creates a scheduler with a fresh state seeded from `config`.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        let policy = config.selection.build();
        Ok(Self::with_policy(config, policy))
    }

    /// Creates a scheduler with a caller-supplied selection policy.
    pub fn with_policy(config: SchedulerConfig, policy: Box<dyn SelectionPolicy>) -> Self {
        let state = ClassifierState::from_config(&config.threshold);
        Self {
            classifier: Classifier::new(config.classifier.clone()),
            controller: ThresholdController::new(config.threshold.clone()),
            state,
            policy,
            config,
            batches_run: 0,
        }
    }

    /// Classify `job` and pick a resource for it from `catalog`.
    pub fn place(&mut self, job: &JobProfile, catalog: &ResourceCatalog) -> PlacementOutcome {
        let classification = self.classifier.classify(job, &mut self.state);
        let selected = self.policy.select(
            catalog.resources(),
            classification.decision,
            classification.predicted_time,
        );
        match selected {
            Some(resource) => {
                tracing::info!(
                    job_id = job.id().as_u64(),
                    resource_id = resource.id.as_u64(),
                    decision = %classification.decision,
                    policy = self.policy.name(),
                    "job assigned"
                );
                PlacementOutcome::Placed {
                    job: job.clone(),
                    resource: resource.clone(),
                    classification,
                }
            }
            None => {
                tracing::warn!(
                    job_id = job.id().as_u64(),
                    decision = %classification.decision,
                    "no resource of decided class, job unplaceable"
                );
                PlacementOutcome::Unplaceable {
                    job: job.clone(),
                    classification,
                }
            }
        }
    }

    /// Place every job of a batch against the same threshold.
    ///
    /// Job ids must be unique within the batch; a repeated id is rejected
    /// before anything is classified.
    pub fn place_batch(
        &mut self,
        jobs: &[JobProfile],
        catalog: &ResourceCatalog,
    ) -> Result<BatchPlan> {
        let mut seen = HashSet::with_capacity(jobs.len());
        for job in jobs {
            if !seen.insert(job.id()) {
                return Err(SchedError::InvalidJob {
                    job_id: job.id().as_u64(),
                    reason: "duplicate job id in batch".to_string(),
                });
            }
        }

        let mut plan = BatchPlan::default();
        for job in jobs {
            match self.place(job, catalog) {
                PlacementOutcome::Placed { job, resource, classification } => {
                    plan.assignments.push(Assignment {
                        job,
                        resource,
                        predicted_time: classification.predicted_time,
                    });
                }
                PlacementOutcome::Unplaceable { job, .. } => plan.unplaced.push(job.id()),
            }
        }
        Ok(plan)
    }

    /// Apply one feedback sample for `job_id`.
    ///
    /// The predicted time comes from the prediction store.
    pub fn feedback(&mut self, job_id: JobId, actual: f64) -> Result<ThresholdAdjustment> {
        let predicted = self.state.predictions.lookup(job_id).ok_or_else(|| {
            SchedError::DegenerateFeedback {
                actual,
                predicted: crate::MISSING_PREDICTION,
                reason: format!("no prediction recorded for job {}", job_id),
            }
        })?;
        self.apply_sample(job_id, actual, predicted)
    }

    fn apply_sample(
        &mut self,
        job_id: JobId,
        actual: f64,
        predicted: f64,
    ) -> Result<ThresholdAdjustment> {
        let adjustment = self.controller.update(actual, predicted, &mut self.state)?;
        if self.config.evict_applied_predictions {
            self.state.predictions.remove(job_id);
        }
        Ok(adjustment)
    }

    /// Apply feedback for a batch's completions in the order given.
    ///
    /// Each completion is scored against the prediction made for it in
    /// `plan`. Returns the report rows and the ids whose feedback was
    /// skipped; rejected samples are logged and never abort the rest of the
    /// batch.
    pub fn apply_feedback(
        &mut self,
        completions: &[Completion],
        plan: &BatchPlan,
    ) -> (Vec<ReportRow>, Vec<JobId>) {
        let mut rows = Vec::with_capacity(completions.len());
        let mut skipped = Vec::new();
        let assignments: HashMap<JobId, &Assignment> =
            plan.assignments.iter().map(|a| (a.job.id(), a)).collect();

        for completion in completions {
            let Some(assignment) = assignments.get(&completion.job_id) else {
                tracing::warn!(
                    job_id = completion.job_id.as_u64(),
                    "completion for a job that was not part of this batch"
                );
                skipped.push(completion.job_id);
                continue;
            };
            let outcome = self.apply_sample(
                completion.job_id,
                completion.actual_time,
                assignment.predicted_time,
            );
            match outcome {
                Ok(adjustment) => rows.push(ReportRow {
                    job_id: completion.job_id,
                    resource_id: completion.resource_id,
                    resource_class: assignment.resource.class,
                    predicted_time: assignment.predicted_time,
                    actual_time: completion.actual_time,
                    relative_error: adjustment.relative_error,
                    threshold: adjustment.current,
                }),
                Err(e) => {
                    tracing::warn!(job_id = completion.job_id.as_u64(), error = %e, "feedback skipped");
                    skipped.push(completion.job_id);
                }
            }
        }
        (rows, skipped)
    }

    /// Run one batch end to end: place, execute, then apply feedback.
    pub fn run_batch<E: ExecutionEngine + ?Sized>(
        &mut self,
        jobs: &[JobProfile],
        catalog: &ResourceCatalog,
        engine: &mut E,
    ) -> Result<BatchReport> {
        let batch = self.batches_run;
        let span = tracing::info_span!("batch", batch, jobs = jobs.len());
        let _enter = span.enter();

        let threshold_before = self.state.threshold;
        let plan = self.place_batch(jobs, catalog)?;
        let completions = engine.execute(&plan.assignments)?;
        let (rows, skipped) = self.apply_feedback(&completions, &plan);
        self.batches_run += 1;

        let report = BatchReport {
            batch,
            rows,
            unplaced: plan.unplaced,
            skipped,
            threshold_before,
            threshold_after: self.state.threshold,
        };
        tracing::info!(
            placed = plan.assignments.len(),
            unplaced = report.unplaced.len(),
            skipped = report.skipped.len(),
            threshold = report.threshold_after,
            "batch complete"
        );
        Ok(report)
    }

    pub fn threshold(&self) -> f64 {
        self.state.threshold
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Number of batches completed by [`run_batch`](Self::run_batch).
    pub fn batches_run(&self) -> u64 {
        self.batches_run
    }
}

/// Cloneable handle for using one scheduler from several threads.
///
/// Every call holds the lock for its whole duration, so a feedback update's
/// push/evict/average/adjust sequence never interleaves with another call.
#[derive(Clone)]
pub struct SharedScheduler {
    inner: Arc<Mutex<PimScheduler>>,
}

impl SharedScheduler {
    pub fn new(scheduler: PimScheduler) -> Self {
        Self { inner: Arc::new(Mutex::new(scheduler)) }
    }

    pub fn place(&self, job: &JobProfile, catalog: &ResourceCatalog) -> PlacementOutcome {
        self.inner.lock().place(job, catalog)
    }

    pub fn feedback(&self, job_id: JobId, actual: f64) -> Result<ThresholdAdjustment> {
        self.inner.lock().feedback(job_id, actual)
    }

    pub fn threshold(&self) -> f64 {
        self.inner.lock().threshold()
    }

    /// Predictions currently held, e.g. to watch store growth.
    pub fn pending_predictions(&self) -> usize {
        self.inner.lock().state().predictions().len()
    }

    /// Run `f` with exclusive access to the scheduler.
    pub fn with<R>(&self, f: impl FnOnce(&mut PimScheduler) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
