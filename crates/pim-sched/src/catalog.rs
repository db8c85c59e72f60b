//! Resource catalog: the resources available to a batch, split into the two
//! logical classes by a capacity cutoff.

use crate::{Result, ResourceClass, ResourceDescriptor, ResourceId, SchedError};
use serde::{Deserialize, Serialize};

/// Capacity at or above which a resource counts as compute-optimized.
pub const DEFAULT_CAPACITY_CUTOFF: f64 = 9000.0;

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Capacity cutoff between MemoryOptimized and Compute
    pub capacity_cutoff: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { capacity_cutoff: DEFAULT_CAPACITY_CUTOFF }
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.capacity_cutoff.is_finite() || self.capacity_cutoff <= 0.0 {
            return Err("capacity_cutoff must be positive".to_string());
        }
        Ok(())
    }
}

/// Ordered list of resources. Order matters for first-match selection.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    cutoff: f64,
    resources: Vec<ResourceDescriptor>,
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_CUTOFF)
    }
}

impl ResourceCatalog {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff, resources: Vec::new() }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.capacity_cutoff)
    }

    /// Add a resource, classifying it against this catalog's cutoff.
    pub fn add(&mut self, id: ResourceId, capacity: f64, ram_mb: u64) -> Result<()> {
        if self.get(id).is_some() {
            return Err(SchedError::InvalidResource {
                resource_id: id.as_u64(),
                reason: "duplicate resource id".to_string(),
            });
        }
        let descriptor = ResourceDescriptor::new(id, capacity, ram_mb, self.cutoff)?;
        tracing::debug!(
            resource_id = id.as_u64(),
            capacity,
            ram_mb,
            class = %descriptor.class,
            "resource registered"
        );
        self.resources.push(descriptor);
        Ok(())
    }

    /// Builder-style variant of [`add`](Self::add).
    pub fn with_resource(mut self, id: u64, capacity: f64, ram_mb: u64) -> Result<Self> {
        self.add(ResourceId::new(id), capacity, ram_mb)?;
        Ok(self)
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Resources of one class, in catalog order.
    pub fn of_class(&self, class: ResourceClass) -> impl Iterator<Item = &ResourceDescriptor> + '_ {
        self.resources.iter().filter(move |r| r.class == class)
    }

    pub fn count(&self, class: ResourceClass) -> usize {
        self.of_class(class).count()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_catalog() -> ResourceCatalog {
        ResourceCatalog::new(DEFAULT_CAPACITY_CUTOFF)
            .with_resource(0, 10_000.0, 2048)
            .and_then(|c| c.with_resource(1, 9_000.0, 2048))
            .and_then(|c| c.with_resource(2, 11_000.0, 4096))
            .and_then(|c| c.with_resource(3, 8_000.0, 4096))
            .and_then(|c| c.with_resource(4, 7_000.0, 4096))
            .and_then(|c| c.with_resource(5, 8_500.0, 4096))
            .unwrap()
    }

    #[test]
    fn test_catalog_classifies_by_cutoff() {
        let catalog = reference_catalog();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.count(ResourceClass::Compute), 3);
        assert_eq!(catalog.count(ResourceClass::MemoryOptimized), 3);
        assert_eq!(
            catalog.get(ResourceId::new(1)).map(|r| r.class),
            Some(ResourceClass::Compute)
        );
    }

    #[test]
    fn test_catalog_preserves_order() {
        let catalog = reference_catalog();
        let pim: Vec<u64> = catalog
            .of_class(ResourceClass::MemoryOptimized)
            .map(|r| r.id.as_u64())
            .collect();
        assert_eq!(pim, vec![3, 4, 5]);
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let mut catalog = ResourceCatalog::new(DEFAULT_CAPACITY_CUTOFF);
        catalog.add(ResourceId::new(0), 10_000.0, 1024).unwrap();
        assert!(catalog.add(ResourceId::new(0), 8_000.0, 1024).is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_catalog_config_validation() {
        assert!(CatalogConfig::default().validate().is_ok());
        assert!(CatalogConfig { capacity_cutoff: 0.0 }.validate().is_err());
    }
}
