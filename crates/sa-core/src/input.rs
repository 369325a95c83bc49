//! Loading audit inputs from JSON files.
//!
//! Three files are expected:
//! - reports: an array of objects, one per report, in stream order
//! - groups: an array of objects, each a conjunction of feature requirements
//! - base rates: an array of numbers in (0, 1), one per group

use sa_common::{BaseRates, Error, Group, Report, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// The three inputs of an audit, validated against each other.
#[derive(Debug, Clone)]
pub struct InputBundle {
    pub reports: Vec<Report>,
    pub groups: Vec<Group>,
    pub base_rates: BaseRates,
}

impl InputBundle {
    /// Read and validate the three input files.
    pub fn load(reports: &Path, groups: &Path, base_rates: &Path) -> Result<Self> {
        let bundle = InputBundle {
            reports: read_json(reports)?,
            groups: read_json(groups)?,
            base_rates: BaseRates::new(read_json(base_rates)?),
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check group and base-rate consistency.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(Error::InvalidInput("group list is empty".to_string()));
        }
        self.base_rates.validate(self.groups.len())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    Ok(serde_json::from_str(&content)?)
}
