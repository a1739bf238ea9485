//! Solver: strategy lookup, priming expansion, search and answer synthesis.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::agents::{Evaluator, Generator, Problem};
use crate::error::{ConfigError, SolveError};
use crate::search::{
    with_timeout, SearchConfig, SearchEngine, SearchEvent, SearchOutcomeKind, SearchStrategy,
};
use crate::tree::{NodeId, StepRecord};

/// One node of the returned path.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathStep {
    pub id: NodeId,
    pub depth: usize,
    #[serde(flatten)]
    pub step: StepRecord,
    /// `None` on the root.
    pub score: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SolveStats {
    pub iterations: usize,
    /// Attached nodes, root included.
    pub nodes: usize,
    /// Evaluated steps, accepted or rejected.
    pub evaluations: usize,
    pub fallback_candidates: usize,
}

/// Answer plus the path it was synthesized from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Solution {
    pub answer: String,
    pub path: Vec<PathStep>,
    pub path_score: f64,
    pub outcome: SearchOutcomeKind,
    pub stats: SolveStats,
}

/// Entry point: owns the collaborators and the run configuration.
///
/// Every [`solve`](Solver::solve) call builds a fresh tree, so one solver can
/// serve many problems.
pub struct Solver {
    generator: Arc<dyn Generator>,
    evaluator: Arc<dyn Evaluator>,
    config: SearchConfig,
    events: Option<mpsc::Sender<SearchEvent>>,
}

impl Solver {
    /// Fails fast on an invalid configuration or unknown strategy name.
    pub fn new(
        generator: Arc<dyn Generator>,
        evaluator: Arc<dyn Evaluator>,
        config: SearchConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            generator,
            evaluator,
            config,
            events: None,
        })
    }

    pub fn with_events(mut self, tx: mpsc::Sender<SearchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Solves with the configured strategy.
    pub async fn solve(&self, problem: Problem) -> Result<Solution, SolveError> {
        self.solve_with(&self.config.strategy, problem).await
    }

    /// Solves with the strategy named `strategy`. Unknown names fail before any
    /// collaborator call.
    pub async fn solve_with(&self, strategy: &str, problem: Problem) -> Result<Solution, SolveError> {
        match strategy.parse::<SearchStrategy>()? {
            SearchStrategy::Search => self.search(problem).await,
        }
    }

    #[instrument(skip_all, fields(domain = %problem.domain))]
    async fn search(&self, problem: Problem) -> Result<Solution, SolveError> {
        let mut engine = SearchEngine::new(
            self.generator.clone(),
            self.evaluator.clone(),
            problem,
            self.config.clone(),
        )?;
        if let Some(tx) = &self.events {
            engine = engine.with_events(tx.clone());
        }

        let root = engine.tree().root();
        engine.expand(root).await?;
        let outcome = engine.run().await?;

        let mut path = Vec::with_capacity(outcome.path.len());
        for id in &outcome.path {
            let node = engine.tree().node(*id)?;
            path.push(PathStep {
                id: *id,
                depth: node.depth(),
                step: node.step().clone(),
                score: node.score(),
            });
        }
        let steps: Vec<StepRecord> = path.iter().map(|p| p.step.clone()).collect();
        let answer = with_timeout(
            self.config.call_timeout(),
            "synthesize_answer",
            self.generator
                .synthesize_answer(&engine.problem().statement, &steps),
        )
        .await?;

        let stats = SolveStats {
            iterations: outcome.iterations,
            nodes: engine.tree().len(),
            evaluations: engine.observations().len(),
            fallback_candidates: engine.fallback().len(),
        };
        info!(
            outcome = ?outcome.kind,
            score = outcome.score,
            nodes = stats.nodes,
            "solved"
        );
        Ok(Solution {
            answer,
            path,
            path_score: outcome.score,
            outcome: outcome.kind,
            stats,
        })
    }
}
