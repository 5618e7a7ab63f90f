//! Per-category network pipeline.

use super::compare::{compare_categories, NetworkComparison};
use super::config::NetworkConfig;
use super::output::CategoryNetwork;
use crate::correct::{adjust_associations, PAdjust};
use crate::correlate::{estimate_associations, CancelToken, EstimatorOptions, TracingProgress};
use crate::data::{CountMatrix, Metadata};
use crate::error::{CooccurError, Result};
use crate::filter::{drop_empty_samples, filter_prevalence, FilterResult};
use crate::network::{analyze, build_graph, sparsify, TieBreak};
use crate::normalize::norm_tss;

/// Builder for the co-occurrence network pipeline.
///
/// Each category runs normalize → estimate → (adjust) → sparsify → build →
/// analyze on the samples that belong to it.
#[derive(Debug, Clone, Default)]
pub struct NetworkPipeline {
    config: NetworkConfig,
    cancel: Option<CancelToken>,
}

impl NetworkPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            config: config.clone(),
            cancel: None,
        }
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> NetworkConfig {
        let mut config = self.config.clone();
        if let Some(d) = description {
            config.description = Some(d.to_string());
        }
        config
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Metadata column that defines the categories.
    pub fn group_column(mut self, column: &str) -> Self {
        self.config.group_column = column.to_string();
        self
    }

    pub fn min_coefficient(mut self, cutoff: f64) -> Self {
        self.config.min_coefficient = cutoff;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Filter on Benjamini-Hochberg q-values instead of raw p-values.
    pub fn correct_bh(mut self) -> Self {
        self.config.p_adjust = PAdjust::BenjaminiHochberg;
        self
    }

    pub fn min_samples(mut self, n: usize) -> Self {
        self.config.min_samples = n;
        self
    }

    pub fn filter_prevalence(mut self, threshold: f64) -> Self {
        self.config.min_prevalence = Some(threshold);
        self
    }

    pub fn drop_empty_samples(mut self, drop: bool) -> Self {
        self.config.drop_empty_samples = drop;
        self
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.config.community.resolution = resolution;
        self
    }

    pub fn weighted(mut self, weighted: bool) -> Self {
        self.config.community.weighted = weighted;
        self
    }

    /// Break equal-gain community merges with a seeded label permutation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.community.tie_break = TieBreak::Seeded(seed);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Abort pairwise estimation when `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build and analyze one category's network from its samples' counts.
    pub fn run_category(&self, category: &str, counts: &CountMatrix) -> Result<CategoryNetwork> {
        let config = &self.config;
        config.validate()?;

        let mut counts = if config.drop_empty_samples {
            drop_empty_samples(counts)?
        } else {
            counts.clone()
        };
        if counts.n_samples() < config.min_samples {
            return Err(CooccurError::EmptyData(format!(
                "Category '{}' has {} usable samples, at least {} required",
                category,
                counts.n_samples(),
                config.min_samples
            )));
        }

        if let Some(threshold) = config.min_prevalence {
            let n_before = counts.n_taxa();
            counts = filter_prevalence(&counts, threshold)?;
            let result = FilterResult {
                n_before,
                n_after: counts.n_taxa(),
            };
            tracing::debug!(category, "prevalence filter: {}", result);
        }

        let relative = norm_tss(&counts, config.zero_total)?;

        let progress = TracingProgress::new(category);
        let mut options = EstimatorOptions::default().with_progress(&progress);
        if let Some(token) = &self.cancel {
            options = options.with_cancel(token.clone());
        }
        if !config.parallel {
            options = options.sequential();
        }
        let mut association = estimate_associations(&relative, &options)?;
        adjust_associations(&mut association, config.p_adjust);

        let cleaned = sparsify(&association, &config.sparsify())?;
        let graph = build_graph(&cleaned);
        let (record, partition) = analyze(category, &graph, &config.community)?;

        Ok(CategoryNetwork {
            category: category.to_string(),
            n_samples: counts.n_samples(),
            association: cleaned,
            graph,
            partition,
            record,
        })
    }

    /// Run every category of the configured group column.
    pub fn run(&self, counts: &CountMatrix, metadata: &Metadata) -> Result<NetworkComparison> {
        compare_categories(counts, metadata, self)
    }
}
