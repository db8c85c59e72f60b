//! End-to-end batch runs through the reference engine.

use pim_sched::{
    BatchReport, JobId, JobProfile, LinearEngine, PimScheduler, ResourceCatalog, ResourceClass,
    ResourceId, SchedulerConfig, SelectionConfig, SelectionStrategy, ThresholdConfig,
    DEFAULT_CAPACITY_CUTOFF,
};

fn catalog() -> ResourceCatalog {
    let mut catalog = ResourceCatalog::new(DEFAULT_CAPACITY_CUTOFF);
    for (id, capacity, ram) in [
        (0u64, 10_000.0, 2048u64),
        (1, 9_000.0, 2048),
        (2, 11_000.0, 4096),
        (3, 8_000.0, 4096),
        (4, 7_000.0, 4096),
        (5, 8_500.0, 4096),
    ] {
        catalog.add(ResourceId::new(id), capacity, ram).unwrap();
    }
    catalog
}

fn jobs() -> Vec<JobProfile> {
    vec![
        JobProfile::new(JobId::new(0), 2000, 10_000, 60.0).unwrap(),
        JobProfile::new(JobId::new(1), 1000, 400_000, 25.0).unwrap(),
        JobProfile::new(JobId::new(2), 256, 8000, 15.0).unwrap(),
    ]
}

#[test]
fn test_reference_scenario_placements() {
    let mut scheduler = PimScheduler::new(SchedulerConfig::default()).unwrap();
    let mut engine = LinearEngine::new();
    let report = scheduler.run_batch(&jobs(), &catalog(), &mut engine).unwrap();

    let by_job = |id: u64| report.rows.iter().find(|r| r.job_id == JobId::new(id)).unwrap();
    assert_eq!(by_job(0).resource_class, ResourceClass::MemoryOptimized);
    assert_eq!(by_job(0).resource_id, ResourceId::new(3));
    assert_eq!(by_job(1).resource_class, ResourceClass::Compute);
    assert_eq!(by_job(2).resource_class, ResourceClass::Compute);
    assert!(report.unplaced.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn test_threshold_converges_to_max_over_batches() {
    // The reference engine's resources are ~10x slower than the reference
    // throughput, so predictions are consistently low and the threshold climbs.
    let config = SchedulerConfig::default();
    let max = config.threshold.max;
    let mut scheduler = PimScheduler::new(config).unwrap();
    let mut engine = LinearEngine::new();
    let catalog = catalog();

    let mut previous = scheduler.threshold();
    for _ in 0..6 {
        let report = scheduler.run_batch(&jobs(), &catalog, &mut engine).unwrap();
        assert!(report.threshold_after >= previous);
        assert!(report.threshold_after <= max);
        previous = report.threshold_after;
    }
    assert_eq!(scheduler.threshold(), max);
    assert_eq!(scheduler.batches_run(), 6);
}

#[test]
fn test_lowest_energy_matches_first_match_on_constant_power() {
    let catalog = catalog();
    let mut first = PimScheduler::new(SchedulerConfig::default()).unwrap();
    let energy_config = SchedulerConfig::default()
        .with_selection(SelectionConfig::default().with_strategy(SelectionStrategy::LowestEnergy));
    let mut energy = PimScheduler::new(energy_config).unwrap();

    let a = first.run_batch(&jobs(), &catalog, &mut LinearEngine::new()).unwrap();
    let b = energy.run_batch(&jobs(), &catalog, &mut LinearEngine::new()).unwrap();
    let ids = |r: &BatchReport| r.rows.iter().map(|row| row.resource_id).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
}

#[test]
fn test_raised_threshold_flips_borderline_job_next_batch() {
    // ratio 0.005: PIM at threshold 0.004, CPU once threshold passes 0.005
    let borderline = JobProfile::new(JobId::new(10), 50, 10_000, 60.0).unwrap();
    let config = SchedulerConfig::default().with_threshold(ThresholdConfig::default());
    let mut scheduler = PimScheduler::new(config).unwrap();
    let catalog = catalog();
    let mut engine = LinearEngine::new();

    let first = scheduler.run_batch(&[borderline.clone()], &catalog, &mut engine).unwrap();
    assert_eq!(first.rows[0].resource_class, ResourceClass::MemoryOptimized);

    // drive the threshold up with two more batches of feedback
    scheduler.run_batch(&[borderline.clone()], &catalog, &mut engine).unwrap();
    scheduler.run_batch(&[borderline.clone()], &catalog, &mut engine).unwrap();
    assert!(scheduler.threshold() > 0.005);

    let later = scheduler.run_batch(&[borderline], &catalog, &mut engine).unwrap();
    assert_eq!(later.rows[0].resource_class, ResourceClass::Compute);
}

#[test]
fn test_report_csv_output() {
    let mut scheduler = PimScheduler::new(SchedulerConfig::default()).unwrap();
    let report = scheduler
        .run_batch(&jobs(), &catalog(), &mut LinearEngine::new())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    report.write_csv_file(&path).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "job_id",
            "resource_id",
            "resource_class",
            "predicted_time",
            "actual_time",
            "relative_error",
            "threshold"
        ]
    );
    let first = reader.records().next().unwrap().unwrap();
    assert_eq!(&first[0], "0");
    assert_eq!(&first[2], "PIM");
    assert_eq!(&first[3], "0.10");
    assert_eq!(&first[4], "1.25");
    assert_eq!(&first[5], "0.9200");
    assert_eq!(&first[6], "0.00450");
}
