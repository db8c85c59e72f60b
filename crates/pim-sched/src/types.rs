//! Core placement types.
//!
//! Job profiles, resource descriptors and the two logical resource classes
//! shared by every other module.

use crate::{Result, SchedError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a job within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl JobId {
    /// Create a new JobId.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a resource supplied by the external catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Create a new ResourceId.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// Compute-optimized ("CPU")
    Compute,
    /// Memory/bandwidth-optimized ("PIM")
    MemoryOptimized,
}

/// Placement decision produced by the classifier.
pub type Decision = ResourceClass;

impl ResourceClass {
    /// Derive the class of a resource from its throughput capacity.
    pub fn from_capacity(capacity: f64, cutoff: f64) -> Self {
        if capacity >= cutoff {
            ResourceClass::Compute
        } else {
            ResourceClass::MemoryOptimized
        }
    }

    /// Short operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceClass::Compute => "CPU",
            ResourceClass::MemoryOptimized => "PIM",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resource and timing requirements of a single job.
///
/// Only constructible through [`JobProfile::new`] (or deserialization, which
/// runs the same checks), so a profile in hand always has a positive length,
/// RAM requirement and deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJobProfile")]
pub struct JobProfile {
    id: JobId,
    ram_mb: u64,
    length: u64,
    deadline_secs: f64,
}

#[derive(Deserialize)]
struct RawJobProfile {
    id: JobId,
    ram_mb: u64,
    length: u64,
    deadline_secs: f64,
}

impl TryFrom<RawJobProfile> for JobProfile {
    type Error = SchedError;

    fn try_from(raw: RawJobProfile) -> Result<Self> {
        JobProfile::new(raw.id, raw.ram_mb, raw.length, raw.deadline_secs)
    }
}

impl JobProfile {
    /// Create a validated job profile.
    pub fn new(id: JobId, ram_mb: u64, length: u64, deadline_secs: f64) -> Result<Self> {
        let invalid = |reason: &str| SchedError::InvalidJob {
            job_id: id.as_u64(),
            reason: reason.to_string(),
        };
        if ram_mb == 0 {
            return Err(invalid("ram requirement must be positive"));
        }
        if length == 0 {
            return Err(invalid("length must be positive"));
        }
        if !deadline_secs.is_finite() || deadline_secs <= 0.0 {
            return Err(invalid("deadline must be a positive number of seconds"));
        }
        Ok(Self { id, ram_mb, length, deadline_secs })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// RAM requirement in MB.
    pub fn ram_mb(&self) -> u64 {
        self.ram_mb
    }

    /// Work units.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn deadline_secs(&self) -> f64 {
        self.deadline_secs
    }

    /// RAM-per-work-unit ratio used by the classifier.
    pub fn ram_ratio(&self) -> f64 {
        self.ram_mb as f64 / self.length as f64
    }
}

/// A resource as seen by the placement core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Resource identifier
    pub id: ResourceId,
    /// Throughput capacity (work units per second)
    pub capacity: f64,
    /// RAM capacity in MB
    pub ram_mb: u64,
    /// Class derived from capacity at catalog construction
    pub class: ResourceClass,
}

impl ResourceDescriptor {
    /// Create a descriptor, deriving its class from `cutoff`.
    pub fn new(id: ResourceId, capacity: f64, ram_mb: u64, cutoff: f64) -> Result<Self> {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(SchedError::InvalidResource {
                resource_id: id.as_u64(),
                reason: "capacity must be positive".to_string(),
            });
        }
        Ok(Self {
            id,
            capacity,
            ram_mb,
            class: ResourceClass::from_capacity(capacity, cutoff),
        })
    }

    pub fn matches(&self, decision: Decision) -> bool {
        self.class == decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_profile_valid() {
        let job = JobProfile::new(JobId::new(0), 2000, 10_000, 60.0).unwrap();
        assert_eq!(job.id(), JobId::new(0));
        assert_eq!(job.ram_mb(), 2000);
        assert_eq!(job.length(), 10_000);
        assert!((job.ram_ratio() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_job_profile_rejects_zero_length() {
        let err = JobProfile::new(JobId::new(7), 2000, 0, 60.0).unwrap_err();
        match err {
            SchedError::InvalidJob { job_id, reason } => {
                assert_eq!(job_id, 7);
                assert!(reason.contains("length"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_job_profile_rejects_zero_ram() {
        assert!(JobProfile::new(JobId::new(1), 0, 100, 60.0).is_err());
    }

    #[test]
    fn test_job_profile_rejects_bad_deadline() {
        assert!(JobProfile::new(JobId::new(1), 10, 100, 0.0).is_err());
        assert!(JobProfile::new(JobId::new(1), 10, 100, -5.0).is_err());
        assert!(JobProfile::new(JobId::new(1), 10, 100, f64::NAN).is_err());
    }

    #[test]
    fn test_job_profile_deserialize_validates() {
        let ok: JobProfile = serde_json::from_str(
            r#"{"id":3,"ram_mb":256,"length":8000,"deadline_secs":15.0}"#,
        )
        .unwrap();
        assert_eq!(ok.id(), JobId::new(3));

        let bad = serde_json::from_str::<JobProfile>(
            r#"{"id":3,"ram_mb":256,"length":0,"deadline_secs":15.0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_resource_class_from_capacity() {
        assert_eq!(ResourceClass::from_capacity(9000.0, 9000.0), ResourceClass::Compute);
        assert_eq!(ResourceClass::from_capacity(8999.9, 9000.0), ResourceClass::MemoryOptimized);
        assert_eq!(ResourceClass::from_capacity(12000.0, 9000.0), ResourceClass::Compute);
    }

    #[test]
    fn test_resource_class_labels() {
        assert_eq!(ResourceClass::Compute.to_string(), "CPU");
        assert_eq!(ResourceClass::MemoryOptimized.to_string(), "PIM");
    }

    #[test]
    fn test_resource_descriptor_rejects_zero_capacity() {
        assert!(ResourceDescriptor::new(ResourceId::new(0), 0.0, 1024, 9000.0).is_err());
    }
}
