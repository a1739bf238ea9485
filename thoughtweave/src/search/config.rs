//! Run configuration for the search engine.
//!
//! Deserializable from the `[search]` table of the config file; every field has a
//! default so partial tables work. [`SearchConfig::validate`] runs before any
//! collaborator call.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which frontier nodes the scheduler prefers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalBias {
    /// Deeper nodes first (priority = -depth).
    #[default]
    PreferDeep,
    /// Shallower nodes first (priority = depth).
    PreferShallow,
}

impl TraversalBias {
    /// Queue priority for a node at `depth`; lower pops first.
    pub fn priority(self, depth: usize) -> i64 {
        let depth = depth as i64;
        match self {
            TraversalBias::PreferDeep => -depth,
            TraversalBias::PreferShallow => depth,
        }
    }
}

impl FromStr for TraversalBias {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefer-deep" | "deep" | "down-up" => Ok(Self::PreferDeep),
            "prefer-shallow" | "shallow" | "up-down" => Ok(Self::PreferShallow),
            _ => Err(ConfigError::UnknownVariant {
                kind: "traversal bias",
                value: s.to_string(),
            }),
        }
    }
}

/// Reasoning path each chain candidate is scored against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationAnchor {
    /// Path of the node being expanded, for every candidate in the chain.
    #[default]
    ExpansionRoot,
    /// Path of the latest accepted node in the chain.
    ChainTip,
}

impl FromStr for EvaluationAnchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expansion-root" | "root" => Ok(Self::ExpansionRoot),
            "chain-tip" | "tip" => Ok(Self::ChainTip),
            _ => Err(ConfigError::UnknownVariant {
                kind: "evaluation anchor",
                value: s.to_string(),
            }),
        }
    }
}

/// Search strategies known to the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Priority-queue search with gated chain expansion and best-effort fallback.
    Search,
}

impl FromStr for SearchStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(Self::Search),
            other => Err(ConfigError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// Configuration fixed for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Strategy name, resolved by [`SearchStrategy::from_str`].
    pub strategy: String,
    /// Minimum normalized score for a candidate to be attached.
    pub node_threshold: f64,
    /// Minimum aggregate score for a leaf path to be accepted immediately.
    pub path_threshold: f64,
    /// Maximum children per node; saturated nodes are never expanded again.
    pub max_width: usize,
    /// Nodes deeper than this are never expanded.
    pub max_depth: usize,
    /// Number of frontier pops before falling back to the best path.
    pub iteration_budget: usize,
    pub traversal_bias: TraversalBias,
    pub evaluation_anchor: EvaluationAnchor,
    /// Per collaborator call; `None` waits indefinitely.
    pub call_timeout_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: "search".to_string(),
            node_threshold: 0.5,
            path_threshold: 0.8,
            max_width: 3,
            max_depth: 5,
            iteration_budget: 50,
            traversal_bias: TraversalBias::default(),
            evaluation_anchor: EvaluationAnchor::default(),
            call_timeout_secs: None,
        }
    }
}

impl SearchConfig {
    /// Checks ranges and the strategy name.
    pub fn validate(&self) -> Result<SearchStrategy, ConfigError> {
        let strategy = self.strategy.parse::<SearchStrategy>()?;
        check_unit("node_threshold", self.node_threshold)?;
        check_unit("path_threshold", self.path_threshold)?;
        if self.max_width < 1 {
            return Err(ConfigError::OutOfRange {
                field: "max_width",
                value: self.max_width.to_string(),
                expected: ">= 1",
            });
        }
        if self.iteration_budget < 1 {
            return Err(ConfigError::OutOfRange {
                field: "iteration_budget",
                value: self.iteration_budget.to_string(),
                expected: ">= 1",
            });
        }
        if self.call_timeout_secs == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "call_timeout_secs",
                value: "0".to_string(),
                expected: ">= 1",
            });
        }
        Ok(strategy)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
            expected: "0.0..=1.0",
        })
    }
}
