//! Error types for collaborator calls, configuration and whole-run failures.
//!
//! `AgentError` is what the generator/evaluator/parser adapters return; the
//! search engine only lifts it into `SolveError` when it cannot recover.

use std::time::Duration;

use thiserror::Error;

use crate::tree::TreeError;

/// Collaborator call error.
///
/// Returned by [`LlmClient`](crate::LlmClient), [`Generator`](crate::Generator),
/// [`Evaluator`](crate::Evaluator) and the parser.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. transport error, empty completion).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// A collaborator call did not answer within the configured timeout.
    #[error("{call} timed out after {after:?}")]
    Timeout {
        /// Which call timed out (`propose_chain`, `score_step`, ...).
        call: &'static str,
        after: Duration,
    },

    /// Model output never contained the expected keys, even after reformatting.
    #[error("could not parse model output: {0}")]
    Parse(String),
}

impl AgentError {
    /// Timeouts are recoverable: the engine treats them as an unproductive attempt.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AgentError::Timeout { .. })
    }
}

/// Invalid run configuration. Reported before any collaborator call is made.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("search algorithm '{0}' is not supported")]
    UnsupportedStrategy(String),

    #[error("{field} = {value} is out of range (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Error returned by [`Solver::solve`](crate::Solver::solve) and the search engine.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("collaborator failed: {0}")]
    Collaborator(#[from] AgentError),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// The fallback pool was empty when the budget ran out. Cannot happen while
    /// the root exists; kept so selection never panics.
    #[error("no candidate path was collected")]
    NoCandidatePath,
}
