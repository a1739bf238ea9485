//! Search engine: gated chain expansion driven by a priority frontier.
//!
//! [`SearchEngine`] owns the tree, the observation log and the fallback pool for
//! one run. [`SearchEngine::expand`] grows the tree from one node;
//! [`SearchEngine::run`] schedules expansions until a leaf path is accepted or
//! the iteration budget runs out. Collaborator calls are issued one at a time.

mod config;
mod event;
mod expand;
mod scheduler;
mod selector;

pub use config::{EvaluationAnchor, SearchConfig, SearchStrategy, TraversalBias};
pub use event::{SearchEvent, SearchOutcomeKind};
pub use expand::{ExpansionOutcome, StopReason};
pub use scheduler::SearchOutcome;
pub use selector::{mean_score, path_scores, CandidatePath, FallbackPool};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::agents::{Evaluator, Generator, Problem};
use crate::error::{AgentError, ConfigError};
use crate::tree::{NodeIdAllocator, StepRecord, ThoughtTree};

/// Mutable state of one run.
#[derive(Debug)]
pub struct SearchState {
    pub tree: ThoughtTree,
    pub ids: NodeIdAllocator,
    /// Every evaluated step, accepted or rejected, in evaluation order.
    pub observations: Vec<StepRecord>,
    pub fallback: FallbackPool,
}

impl SearchState {
    /// Fresh state with a root built from the problem.
    pub fn new(problem: &Problem) -> Self {
        let mut ids = NodeIdAllocator::new();
        let tree = ThoughtTree::new(&mut ids, &problem.prior_knowledge, &problem.question);
        Self {
            tree,
            ids,
            observations: Vec::new(),
            fallback: FallbackPool::default(),
        }
    }
}

pub struct SearchEngine {
    generator: Arc<dyn Generator>,
    evaluator: Arc<dyn Evaluator>,
    problem: Problem,
    config: SearchConfig,
    events: Option<mpsc::Sender<SearchEvent>>,
    state: SearchState,
}

impl SearchEngine {
    /// Validates `config` and creates the root node. No collaborator is called.
    pub fn new(
        generator: Arc<dyn Generator>,
        evaluator: Arc<dyn Evaluator>,
        problem: Problem,
        config: SearchConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = SearchState::new(&problem);
        Ok(Self {
            generator,
            evaluator,
            problem,
            config,
            events: None,
            state,
        })
    }

    /// Sends progress events to `tx`. A closed receiver is ignored.
    pub fn with_events(mut self, tx: mpsc::Sender<SearchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn tree(&self) -> &ThoughtTree {
        &self.state.tree
    }

    pub fn observations(&self) -> &[StepRecord] {
        &self.state.observations
    }

    pub fn fallback(&self) -> &FallbackPool {
        &self.state.fallback
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Consumes the engine, returning its final state.
    pub fn into_state(self) -> SearchState {
        self.state
    }

    async fn emit(&self, event: SearchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

/// Runs `fut`, failing with [`AgentError::Timeout`] after `limit`.
pub(crate) async fn with_timeout<T, F>(
    limit: Option<Duration>,
    call: &'static str,
    fut: F,
) -> Result<T, AgentError>
where
    F: Future<Output = Result<T, AgentError>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| AgentError::Timeout { call, after })?,
        None => fut.await,
    }
}
