//! Serializable pipeline configuration.

use crate::correct::PAdjust;
use crate::error::{CooccurError, Result};
use crate::network::{GreedyModularity, SparsifyConfig};
use crate::normalize::ZeroTotalPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every parameter of a co-occurrence network run.
///
/// Missing YAML keys take their default, so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub name: String,
    pub description: Option<String>,
    /// Metadata column whose levels define the categories.
    pub group_column: String,
    /// Minimum coefficient for an edge.
    pub min_coefficient: f64,
    /// Maximum p-value (q-value when adjusted) for an edge.
    pub alpha: f64,
    pub p_adjust: PAdjust,
    /// Fewer usable samples than this fails the category.
    pub min_samples: usize,
    /// Within-category prevalence filter applied before correlation.
    pub min_prevalence: Option<f64>,
    /// Remove zero-total samples before normalization.
    pub drop_empty_samples: bool,
    /// What normalization does with a zero-total sample that was not dropped.
    pub zero_total: ZeroTotalPolicy,
    pub community: GreedyModularity,
    /// Evaluate pairs and categories on the rayon pool.
    pub parallel: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "cooccurrence".to_string(),
            description: None,
            group_column: "category".to_string(),
            min_coefficient: 0.6,
            alpha: 0.05,
            p_adjust: PAdjust::None,
            min_samples: 3,
            min_prevalence: None,
            drop_empty_samples: true,
            zero_total: ZeroTotalPolicy::Reject,
            community: GreedyModularity::default(),
            parallel: true,
        }
    }
}

impl NetworkConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(CooccurError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(CooccurError::from)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn sparsify(&self) -> SparsifyConfig {
        SparsifyConfig::new(self.min_coefficient, self.alpha)
    }

    /// Check every parameter; the first invalid one is reported.
    pub fn validate(&self) -> Result<()> {
        self.sparsify().validate()?;
        self.community.validate()?;
        if self.min_samples < 3 {
            return Err(CooccurError::InvalidParameter(format!(
                "min_samples must be at least 3, got {}",
                self.min_samples
            )));
        }
        if let Some(threshold) = self.min_prevalence {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(CooccurError::InvalidParameter(
                    "Prevalence threshold must be between 0 and 1".to_string(),
                ));
            }
        }
        if self.group_column.is_empty() {
            return Err(CooccurError::InvalidParameter(
                "group_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
