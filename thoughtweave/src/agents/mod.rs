//! Collaborator contracts consumed by the search engine, and their LLM-backed
//! implementations.
//!
//! The engine only sees typed records: [`Generator::propose_chain`] returns
//! [`StepRecord`]s and [`Evaluator::score_step`] returns a [`StepScore`]. Free-text
//! handling lives in [`StepParser`].

mod evaluator;
mod generator;
mod parser;
mod prompts;

pub use evaluator::LlmEvaluator;
pub use generator::LlmGenerator;
pub use parser::{extract_records, Record, StepParser};
pub(crate) use prompts::NO_OBSERVATIONS;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::search::mean_score;
use crate::tree::StepRecord;

/// A problem split into the parts the search needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Raw problem text, shown to every collaborator.
    pub statement: String,
    /// Everything known up front; becomes the "Initial State" of every path.
    pub prior_knowledge: String,
    pub question: String,
    /// Field of expertise the prompts address (e.g. "arithmetic").
    pub domain: String,
}

impl Problem {
    pub fn new(
        statement: impl Into<String>,
        prior_knowledge: impl Into<String>,
        question: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            statement: statement.into(),
            prior_knowledge: prior_knowledge.into(),
            question: question.into(),
            domain: domain.into(),
        }
    }
}

/// Input to one [`Generator::propose_chain`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainRequest {
    pub problem: String,
    pub domain: String,
    /// Rendered reasoning path of the node being expanded.
    pub path_text: String,
    /// Results already tried elsewhere in the tree.
    pub exclusion_text: String,
    /// `Hint: ...` from the evaluator, or empty.
    pub hint_text: String,
    pub next_step_number: usize,
}

/// Input to one [`Evaluator::score_step`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreRequest {
    pub problem: String,
    pub domain: String,
    pub path_text: String,
    pub candidate_text: String,
}

/// Evaluator verdict on one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepScore {
    /// Raw score on the 0–100 scale.
    pub score: f64,
    /// Guidance for whoever expands the parent next.
    pub hint: String,
}

impl StepScore {
    pub fn new(score: f64, hint: impl Into<String>) -> Self {
        Self {
            score,
            hint: hint.into(),
        }
    }

    /// Score mapped to `[0, 1]`.
    pub fn normalized(&self) -> f64 {
        (self.score / 100.0).clamp(0.0, 1.0)
    }
}

/// Proposes chains of next steps and writes the final answer.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Ordered candidate steps continuing the request's path.
    async fn propose_chain(&self, request: &ChainRequest) -> Result<Vec<StepRecord>, AgentError>;

    /// Final answer text for the chosen path (root included).
    async fn synthesize_answer(
        &self,
        problem: &str,
        path: &[StepRecord],
    ) -> Result<String, AgentError>;
}

/// Scores single steps and aggregates path scores.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn score_step(&self, request: &ScoreRequest) -> Result<StepScore, AgentError>;

    /// Aggregate of the normalized scores of a path, root excluded.
    fn aggregate(&self, scores: &[f64]) -> f64 {
        mean_score(scores)
    }
}
