//! Adaptive PIM/CPU Job Placement
//!
//! This crate decides, per job, whether work should run on a
//! compute-optimized resource class or a memory-optimized (PIM) resource
//! class, and adapts its decision boundary from runtime-prediction feedback.
//!
//! # Key Components
//!
//! - **Resource Catalog**: resources split into two logical classes by capacity
//! - **Prediction Store**: per-job early runtime estimates kept for feedback
//! - **Classifier**: RAM/length ratio + deadline rule against an adaptive threshold
//! - **Selection Policies**: first-match and lowest-estimated-energy placement
//! - **Threshold Controller**: sliding error window nudging the threshold
//! - **Scheduler**: owns the state and drives plan → execute → feedback per batch
//! - **Report**: stable per-job output rows (CSV and console table)

pub mod types;
pub mod catalog;
pub mod predict;
pub mod state;
pub mod classifier;
pub mod selector;
pub mod controller;
pub mod engine;
pub mod report;
pub mod scheduler;

pub use types::{JobId, ResourceId, JobProfile, ResourceClass, Decision, ResourceDescriptor};
pub use catalog::{ResourceCatalog, CatalogConfig, DEFAULT_CAPACITY_CUTOFF};
pub use predict::{PredictionStore, MISSING_PREDICTION};
pub use state::ClassifierState;
pub use classifier::{Classifier, ClassifierConfig, Classification};
pub use selector::{
    SelectionPolicy, FirstMatch, LowestEnergy, SelectionStrategy, SelectionConfig,
};
pub use controller::{
    ThresholdController, ThresholdConfig, ThresholdAdjustment, AdjustmentDirection,
    relative_error,
};
pub use engine::{Assignment, Completion, ExecutionEngine, LinearEngine};
pub use report::{ReportRow, BatchReport};
pub use scheduler::{
    PimScheduler, SchedulerConfig, PlacementOutcome, BatchPlan, SharedScheduler,
};

use thiserror::Error;

/// Scheduler error types
#[derive(Debug, Error)]
pub enum SchedError {
    /// Job profile violates its input contract
    #[error("Invalid job {job_id}: {reason}")]
    InvalidJob {
        /// Offending job
        job_id: u64,
        /// What was wrong with it
        reason: String,
    },

    /// Resource descriptor violates its input contract
    #[error("Invalid resource {resource_id}: {reason}")]
    InvalidResource {
        /// Offending resource
        resource_id: u64,
        /// What was wrong with it
        reason: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feedback sample cannot produce a relative error
    #[error("Degenerate feedback sample (actual={actual}, predicted={predicted}): {reason}")]
    DegenerateFeedback {
        /// Measured completion time
        actual: f64,
        /// Predicted completion time
        predicted: f64,
        /// Why the sample was rejected
        reason: String,
    },

    /// Execution engine failure
    #[error("Execution engine error: {0}")]
    Engine(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for pim-sched operations
pub type Result<T> = std::result::Result<T, SchedError>;
