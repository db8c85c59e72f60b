//! Job classification.
//!
//! A job is sent to the memory-optimized class only when it is RAM-heavy
//! relative to its length *and* its deadline leaves enough slack; everything
//! else goes to the compute class. Each classification also records a
//! runtime estimate obtained by timing a 10% sample of the job on a fixed
//! reference throughput and extrapolating linearly.

use crate::{ClassifierState, Decision, JobProfile, ResourceClass};
use serde::{Deserialize, Serialize};

/// Configuration for the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Throughput of the reference resource used for runtime estimates (default 100000)
    pub reference_throughput: f64,
    /// Fraction of the job executed on the reference resource (default 0.10)
    pub sample_fraction: f64,
    /// Deadline at or below which a job never goes to PIM (default 30.0s)
    pub deadline_cutoff_secs: f64,
}

impl ClassifierConfig {
    /// Creates a new ClassifierConfig with default values.
    pub fn new() -> Self {
        Self {
            reference_throughput: 100_000.0,
            sample_fraction: 0.10,
            deadline_cutoff_secs: 30.0,
        }
    }

    /// Validates that all configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.reference_throughput > 0.0) {
            return Err("reference_throughput must be greater than 0".to_string());
        }
        if !(self.sample_fraction > 0.0 && self.sample_fraction <= 1.0) {
            return Err("sample_fraction must be in (0.0, 1.0]".to_string());
        }
        if !(self.deadline_cutoff_secs > 0.0) || !self.deadline_cutoff_secs.is_finite() {
            return Err("deadline_cutoff_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn with_reference_throughput(mut self, throughput: f64) -> Self {
        self.reference_throughput = throughput;
        self
    }

    pub fn with_sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = fraction;
        self
    }

    pub fn with_deadline_cutoff_secs(mut self, secs: f64) -> Self {
        self.deadline_cutoff_secs = secs;
        self
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of classifying one job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub decision: Decision,
    /// RAM/length ratio compared against the threshold
    pub ratio: f64,
    /// Threshold in force when the decision was made
    pub threshold: f64,
    /// Extrapolated full runtime in seconds
    pub predicted_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Time to run the sampled fraction of `job` on the reference resource.
    pub fn sample_time(&self, job: &JobProfile) -> f64 {
        job.length() as f64 * self.config.sample_fraction / self.config.reference_throughput
    }

    /// Runtime estimate extrapolated from the sample.
    pub fn predict_runtime(&self, job: &JobProfile) -> f64 {
        self.sample_time(job) / self.config.sample_fraction
    }

    /// Pure decision rule for a given threshold.
    pub fn decide(&self, job: &JobProfile, threshold: f64) -> Decision {
        if job.ram_ratio() > threshold && job.deadline_secs() > self.config.deadline_cutoff_secs {
            ResourceClass::MemoryOptimized
        } else {
            ResourceClass::Compute
        }
    }

    /// Classify `job` against the current threshold and record its predicted
    /// runtime in the state's prediction store.
    pub fn classify(&self, job: &JobProfile, state: &mut ClassifierState) -> Classification {
        let ratio = job.ram_ratio();
        let predicted_time = self.predict_runtime(job);
        state.predictions.save(job.id(), predicted_time);

        let decision = self.decide(job, state.threshold);
        tracing::debug!(
            job_id = job.id().as_u64(),
            ram_mb = job.ram_mb(),
            length = job.length(),
            ratio,
            deadline_secs = job.deadline_secs(),
            sample_time = %format!("{:.2}", self.sample_time(job)),
            predicted_time,
            threshold = state.threshold,
            decision = %decision,
            "job classified"
        );

        Classification {
            decision,
            ratio,
            threshold: state.threshold,
            predicted_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobId;

    fn job(id: u64, ram: u64, length: u64, deadline: f64) -> JobProfile {
        JobProfile::new(JobId::new(id), ram, length, deadline).unwrap()
    }

    #[test]
    fn test_classifier_config_default() {
        let config = ClassifierConfig::default();
        assert_eq!(config.reference_throughput, 100_000.0);
        assert_eq!(config.sample_fraction, 0.10);
        assert_eq!(config.deadline_cutoff_secs, 30.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_classifier_config_validation() {
        assert!(ClassifierConfig::new().with_reference_throughput(0.0).validate().is_err());
        assert!(ClassifierConfig::new().with_sample_fraction(0.0).validate().is_err());
        assert!(ClassifierConfig::new().with_sample_fraction(1.5).validate().is_err());
        assert!(ClassifierConfig::new().with_deadline_cutoff_secs(-1.0).validate().is_err());
        assert!(ClassifierConfig::new().with_deadline_cutoff_secs(0.0).validate().is_err());
        assert!(ClassifierConfig::new().with_sample_fraction(1.0).validate().is_ok());
    }

    #[test]
    fn test_scenario_a_ram_heavy_with_slack_goes_pim() {
        let classifier = Classifier::default();
        let mut state = ClassifierState::with_threshold(0.004);
        let result = classifier.classify(&job(0, 2000, 10_000, 60.0), &mut state);
        assert!((result.ratio - 0.2).abs() < 1e-12);
        assert_eq!(result.decision, ResourceClass::MemoryOptimized);
    }

    #[test]
    fn test_scenario_b_low_ratio_goes_cpu() {
        let classifier = Classifier::default();
        let mut state = ClassifierState::with_threshold(0.004);
        let result = classifier.classify(&job(1, 1000, 400_000, 25.0), &mut state);
        assert!((result.ratio - 0.0025).abs() < 1e-12);
        assert_eq!(result.decision, ResourceClass::Compute);
    }

    #[test]
    fn test_scenario_c_tight_deadline_goes_cpu() {
        let classifier = Classifier::default();
        let mut state = ClassifierState::with_threshold(0.004);
        let result = classifier.classify(&job(2, 256, 8000, 15.0), &mut state);
        assert!((result.ratio - 0.032).abs() < 1e-12);
        assert_eq!(result.decision, ResourceClass::Compute);
    }

    #[test]
    fn test_deadline_exactly_at_cutoff_goes_cpu() {
        let classifier = Classifier::default();
        let mut state = ClassifierState::with_threshold(0.004);
        let result = classifier.classify(&job(3, 2000, 10_000, 30.0), &mut state);
        assert_eq!(result.decision, ResourceClass::Compute);
    }

    #[test]
    fn test_ratio_equal_to_threshold_goes_cpu() {
        let classifier = Classifier::default();
        // 40 / 10000 = 0.004 exactly
        let result = classifier.decide(&job(4, 40, 10_000, 60.0), 0.004);
        assert_eq!(result, ResourceClass::Compute);
    }

    #[test]
    fn test_predicted_time_extrapolates_sample() {
        let classifier = Classifier::default();
        let j = job(0, 2000, 10_000, 60.0);
        assert!((classifier.sample_time(&j) - 0.01).abs() < 1e-12);
        assert!((classifier.predict_runtime(&j) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_classify_records_prediction() {
        let classifier = Classifier::default();
        let mut state = ClassifierState::with_threshold(0.004);
        let result = classifier.classify(&job(9, 1000, 400_000, 25.0), &mut state);
        assert!((result.predicted_time - 4.0).abs() < 1e-12);
        assert_eq!(state.predictions().lookup(JobId::new(9)), Some(result.predicted_time));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = Classifier::default();
        let mut state = ClassifierState::with_threshold(0.004);
        let j = job(5, 2000, 10_000, 60.0);
        let first = classifier.classify(&j, &mut state);
        let second = classifier.classify(&j, &mut state);
        assert_eq!(first, second);
        assert_eq!(state.predictions().len(), 1);
    }

    #[test]
    fn test_higher_threshold_is_more_conservative() {
        let classifier = Classifier::default();
        let j = job(6, 256, 8000, 60.0); // ratio 0.032
        assert_eq!(classifier.decide(&j, 0.004), ResourceClass::MemoryOptimized);
        assert_eq!(classifier.decide(&j, 0.05), ResourceClass::Compute);
    }
}
