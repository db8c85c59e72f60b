//! Workload files: the resource catalog plus the job list of one batch.

use anyhow::{Context, Result};
use pim_sched::{JobProfile, ResourceCatalog, ResourceId};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// One `[[resources]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    pub id: u64,
    pub capacity: f64,
    pub ram_mb: u64,
}

/// Parsed workload file.
#[derive(Debug, Clone, Deserialize)]
pub struct Workload {
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
    #[serde(default)]
    pub jobs: Vec<JobProfile>,
}

impl Workload {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workload {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid workload {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let workload: Self = toml::from_str(contents)?;
        if workload.resources.is_empty() {
            anyhow::bail!("workload declares no resources");
        }
        let mut seen = HashSet::new();
        for job in &workload.jobs {
            if !seen.insert(job.id()) {
                anyhow::bail!("duplicate job id {}", job.id());
            }
        }
        Ok(workload)
    }

    /// Build the catalog, classifying resources against `cutoff`.
    pub fn catalog(&self, cutoff: f64) -> Result<ResourceCatalog> {
        let mut catalog = ResourceCatalog::new(cutoff);
        for entry in &self.resources {
            catalog.add(ResourceId::new(entry.id), entry.capacity, entry.ram_mb)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pim_sched::{JobId, ResourceClass};

    const WORKLOAD: &str = r#"
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
    "#;

    #[test]
    fn test_parse_workload() {
        let workload = Workload::parse(WORKLOAD).unwrap();
        assert_eq!(workload.jobs.len(), 1);
        assert_eq!(workload.jobs[0].id(), JobId::new(0));

        let catalog = workload.catalog(9000.0).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(ResourceId::new(0)).unwrap().class, ResourceClass::Compute);
        assert_eq!(
            catalog.get(ResourceId::new(1)).unwrap().class,
            ResourceClass::MemoryOptimized
        );
    }

    #[test]
    fn test_invalid_job_rejected() {
        let text = WORKLOAD.replace("length = 10000", "length = 0");
        assert!(Workload::parse(&text).is_err());
    }

    #[test]
    fn test_duplicate_job_id_rejected() {
        let text = format!(
            "{}\n[[jobs]]\nid = 0\nram_mb = 1000\nlength = 400000\ndeadline_secs = 25.0\n",
            WORKLOAD
        );
        let err = Workload::parse(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate job id 0"));
    }

    #[test]
    fn test_no_resources_rejected() {
        assert!(Workload::parse("jobs = []").is_err());
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let text = WORKLOAD.replace("id = 1\n", "id = 0\n");
        let workload = Workload::parse(&text).unwrap();
        assert!(workload.catalog(9000.0).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload.toml");
        std::fs::write(&path, WORKLOAD).unwrap();
        assert_eq!(Workload::load(&path).unwrap().resources.len(), 2);
        assert!(Workload::load(&dir.path().join("missing.toml")).is_err());
    }
}
