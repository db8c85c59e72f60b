//! classify command implementation - one-shot decision for a single job

use anyhow::{Context, Result};
use console::style;
use pim_config::PimConfig;
use pim_sched::{Classification, Classifier, ClassifierState, JobId, JobProfile};

/// Execute the classify command
pub fn execute(
    config: &PimConfig,
    ram: u64,
    length: u64,
    deadline: f64,
    threshold: Option<f64>,
) -> Result<()> {
    let classification = classify(config, ram, length, deadline, threshold)?;

    println!("{}", style("Classification").bold().cyan());
    println!("Ratio:          {:.6}", classification.ratio);
    println!("Threshold:      {:.5}", classification.threshold);
    println!("Deadline:       {} s", deadline);
    println!("Predicted time: {:.4} s", classification.predicted_time);
    println!("Decision:       {}", style(classification.decision).bold());
    Ok(())
}

pub fn classify(
    config: &PimConfig,
    ram: u64,
    length: u64,
    deadline: f64,
    threshold: Option<f64>,
) -> Result<Classification> {
    let job = JobProfile::new(JobId::new(0), ram, length, deadline).context("Invalid job")?;
    let threshold = threshold.unwrap_or(config.threshold.initial);
    if !threshold.is_finite() || threshold < 0.0 {
        anyhow::bail!("threshold must be a non-negative number, got {}", threshold);
    }
    let mut state = ClassifierState::with_threshold(threshold);
    Ok(Classifier::new(config.classifier.clone()).classify(&job, &mut state))
}
