//! run command implementation - drives batches of a workload file

use super::workload::Workload;
use anyhow::{Context, Result};
use console::style;
use pim_config::PimConfig;
use pim_sched::{
    BatchReport, JobProfile, LinearEngine, PimScheduler, ResourceCatalog, SelectionStrategy,
};
use std::path::Path;

/// Execute the run command
pub fn execute(
    config: &PimConfig,
    workload: &Path,
    batches: u32,
    report: Option<&Path>,
    policy: Option<&str>,
) -> Result<()> {
    let workload = Workload::load(workload)?;
    let catalog = workload.catalog(config.catalog.capacity_cutoff)?;

    let mut sched_config = config.scheduler_config();
    if let Some(policy) = policy {
        sched_config.selection.strategy = policy
            .parse::<SelectionStrategy>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --policy")?;
    }
    let mut scheduler = PimScheduler::new(sched_config)?;

    tracing::info!(
        resources = catalog.len(),
        jobs = workload.jobs.len(),
        batches,
        policy = scheduler.policy_name(),
        "starting run"
    );

    let reports = run_batches(&mut scheduler, &catalog, &workload.jobs, batches)?;
    if let Some(path) = report {
        write_reports(&reports, path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

/// Submit `jobs` `batches` times, printing each batch's table.
pub fn run_batches(
    scheduler: &mut PimScheduler,
    catalog: &ResourceCatalog,
    jobs: &[JobProfile],
    batches: u32,
) -> Result<Vec<BatchReport>> {
    let mut engine = LinearEngine::new();
    let mut reports = Vec::with_capacity(batches as usize);
    for _ in 0..batches {
        let report = scheduler.run_batch(jobs, catalog, &mut engine)?;
        println!("{}", report);
        println!();
        reports.push(report);
    }

    println!(
        "{} {} batch(es), final threshold {:.5}",
        style("Done:").bold().green(),
        reports.len(),
        scheduler.threshold()
    );
    Ok(reports)
}

/// Write every report's rows into one CSV file.
pub fn write_reports(reports: &[BatchReport], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    BatchReport::write_all_csv(reports, file)?;
    tracing::info!(path = %path.display(), batches = reports.len(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pim_sched::SchedulerConfig;

    #[test]
    fn test_run_and_write_reports() {
        let workload = Workload::parse(
            r#"
            [[resources]]
            id = 0
            capacity = 10000.0
            ram_mb = 2048

            [[resources]]
            id = 1
            capacity = 8000.0
            ram_mb = 4096

            [[jobs]]
            id = 0
            ram_mb = 2000
            length = 10000
            deadline_secs = 60.0

            [[jobs]]
            id = 1
            ram_mb = 256
            length = 8000
            deadline_secs = 15.0
            "#,
        )
        .unwrap();
        let catalog = workload.catalog(9000.0).unwrap();
        let mut scheduler = PimScheduler::new(SchedulerConfig::default()).unwrap();
        let reports = run_batches(&mut scheduler, &catalog, &workload.jobs, 3).unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(scheduler.batches_run(), 3);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.csv");
        write_reports(&reports, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "job_id,resource_id,resource_class,predicted_time,actual_time,relative_error,threshold");
        assert_eq!(lines.len(), 1 + 3 * 2);
    }
}
