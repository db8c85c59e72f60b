//! demo command implementation - the built-in reference scenario

use super::run::run_batches;
use anyhow::Result;
use console::style;
use pim_config::PimConfig;
use pim_sched::{JobId, JobProfile, PimScheduler, ResourceCatalog, ResourceId};

/// (id, capacity, ram_mb)
const RESOURCES: [(u64, f64, u64); 6] = [
    (0, 10_000.0, 2048),
    (1, 9_000.0, 2048),
    (2, 11_000.0, 4096),
    (3, 8_000.0, 4096),
    (4, 7_000.0, 4096),
    (5, 8_500.0, 4096),
];

/// (id, ram_mb, length, deadline_secs)
const JOBS: [(u64, u64, u64, f64); 3] = [
    (0, 2000, 10_000, 60.0),
    (1, 1000, 400_000, 25.0),
    (2, 256, 8000, 15.0),
];

pub fn catalog(cutoff: f64) -> Result<ResourceCatalog> {
    let mut catalog = ResourceCatalog::new(cutoff);
    for (id, capacity, ram) in RESOURCES {
        catalog.add(ResourceId::new(id), capacity, ram)?;
    }
    Ok(catalog)
}

pub fn jobs() -> Result<Vec<JobProfile>> {
    JOBS.iter()
        .map(|&(id, ram, length, deadline)| {
            JobProfile::new(JobId::new(id), ram, length, deadline).map_err(anyhow::Error::from)
        })
        .collect()
}

/// Execute the demo command
pub fn execute(config: &PimConfig, batches: u32) -> Result<()> {
    let catalog = catalog(config.catalog.capacity_cutoff)?;
    let jobs = jobs()?;
    let mut scheduler = PimScheduler::new(config.scheduler_config())?;

    println!("{}", style("Reference scenario").bold().cyan());
    for resource in catalog.resources() {
        println!(
            "  resource {}  capacity {:>8.0}  ram {:>5} MB  {}",
            resource.id, resource.capacity, resource.ram_mb, resource.class
        );
    }
    println!();

    run_batches(&mut scheduler, &catalog, &jobs, batches)?;
    Ok(())
}
