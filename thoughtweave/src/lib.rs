//! # Thoughtweave
//!
//! Gated tree search over LLM-proposed reasoning chains. A generator proposes a
//! chain of next steps, an evaluator scores each one, and only steps that clear
//! the node threshold are attached to the tree. A priority frontier decides which
//! node to grow next; the first complete path whose mean score clears the path
//! threshold wins, and when the budget runs out the best collected path is used.
//!
//! ## Main modules
//!
//! - [`tree`]: [`ThoughtTree`] arena, [`ThoughtNode`], [`NodeId`], [`ReasoningPath`].
//! - [`search`]: [`SearchEngine`] (`expand`, `run`), [`SearchConfig`], [`SearchEvent`], [`FallbackPool`].
//! - [`agents`]: [`Generator`] and [`Evaluator`] contracts, [`LlmGenerator`], [`LlmEvaluator`], [`StepParser`].
//! - [`llm`]: [`LlmClient`] trait, [`MockLlm`], [`ChatOpenAI`].
//! - [`solver`]: [`Solver`] and the returned [`Solution`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use thoughtweave::{LlmEvaluator, LlmGenerator, MockLlm, Problem, SearchConfig, Solver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = Arc::new(MockLlm::fixed("Thought: t\nAction: a\nResult: r\nFinal Score: 90\nHint: ok"));
//! let solver = Solver::new(
//!     Arc::new(LlmGenerator::new(llm.clone())),
//!     Arc::new(LlmEvaluator::new(llm)),
//!     SearchConfig::default(),
//! )?;
//! let problem = Problem::new("2 + 2?", "two and two", "what is the sum?", "arithmetic");
//! let solution = solver.solve(problem).await?;
//! println!("{}", solution.answer);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod error;
pub mod llm;
pub mod message;
pub mod search;
pub mod solver;
pub mod tree;

pub use agents::{
    ChainRequest, Evaluator, Generator, LlmEvaluator, LlmGenerator, Problem, ScoreRequest,
    StepParser, StepScore,
};
pub use error::{AgentError, ConfigError, SolveError};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use message::Message;
pub use search::{
    mean_score, EvaluationAnchor, ExpansionOutcome, FallbackPool, SearchConfig, SearchEngine,
    SearchEvent, SearchOutcome, SearchOutcomeKind, SearchStrategy, StopReason, TraversalBias,
};
pub use solver::{PathStep, Solution, SolveStats, Solver};
pub use tree::{NodeId, NodeIdAllocator, ReasoningPath, StepRecord, ThoughtNode, ThoughtTree, TreeError};
