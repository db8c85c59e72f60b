//! Configuration validation

use crate::{ConfigError, PimConfig, Result};

impl PimConfig {
    /// Validate every section, reporting the first failure.
    pub fn validate(&self) -> Result<()> {
        check("catalog", self.catalog.validate())?;
        check("classifier", self.classifier.validate())?;
        check("threshold", self.threshold.validate())?;
        check("selection", self.selection.validate())?;
        Ok(())
    }
}

fn check(section: &str, result: std::result::Result<(), String>) -> Result<()> {
    result.map_err(|message| ConfigError::InvalidValue {
        field: section.to_string(),
        message,
    })
}
