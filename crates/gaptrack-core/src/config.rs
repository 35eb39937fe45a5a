//! Tracker configuration, loadable from TOML.

use crate::{
    DEFAULT_CATEGORY,
    boundary::OrderingMode,
    error::InternalError,
    gap::{EvictionPolicy, MergeOptions, WidthMetric},
    predicate::PredicateColumns,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid tracker config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("category must not be empty")]
    EmptyCategory,

    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,

    #[error("narrow_threshold must be finite and non-negative, got {0}")]
    InvalidNarrowThreshold(f64),
}

///
/// TrackerConfig
///
/// Every field has a default, so an empty document is a valid config.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Category polled when the caller does not name one.
    pub category: String,

    /// Maximum gaps kept per category; `0` disables eviction.
    pub limit: usize,

    /// Rows requested per poll.
    pub batch_size: usize,

    pub ordering: OrderingMode,
    pub narrow_threshold: f64,
    pub width_metric: WidthMetric,

    // rendering
    pub table: String,
    pub category_column: String,
    pub position_column: String,
}

impl TrackerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.category.is_empty() {
            return Err(ConfigError::EmptyCategory);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if !self.narrow_threshold.is_finite() || self.narrow_threshold < 0.0 {
            return Err(ConfigError::InvalidNarrowThreshold(self.narrow_threshold));
        }

        Ok(())
    }

    #[must_use]
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::new(self.limit)
            .with_ordering(self.ordering)
            .with_eviction(EvictionPolicy::new(self.narrow_threshold, self.width_metric))
    }

    pub fn predicate_columns(&self) -> Result<PredicateColumns, InternalError> {
        PredicateColumns::new(&self.category_column, &self.position_column)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let eviction = EvictionPolicy::default();

        Self {
            category: DEFAULT_CATEGORY.to_string(),
            limit: 100,
            batch_size: 10,
            ordering: OrderingMode::default(),
            narrow_threshold: eviction.narrow_threshold,
            width_metric: eviction.metric,
            table: "resources".to_string(),
            category_column: "category".to_string(),
            position_column: "resource_id".to_string(),
        }
    }
}

///
/// TESTS
///
