//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thoughtweave::{
    AgentError, ChainRequest, Evaluator, Generator, Problem, ScoreRequest, StepRecord, StepScore,
};

pub fn step(thought: &str) -> StepRecord {
    StepRecord::new(thought, format!("do {}", thought), format!("got {}", thought))
}

pub fn train_problem() -> Problem {
    Problem::new(
        "A train travels 60 mph for 2 hours. How far does it go?",
        "A train travels 60 mph for 2 hours",
        "How far does it go?",
        "arithmetic",
    )
}

type ChainFn = Box<dyn Fn(usize) -> Vec<StepRecord> + Send + Sync>;

/// Returns the scripted chains in call order, then whatever `fresh` builds
/// (an empty chain by default).
pub struct ScriptedGenerator {
    chains: Vec<Vec<StepRecord>>,
    fresh: Option<ChainFn>,
    fail_with: Option<String>,
    requests: Mutex<Vec<ChainRequest>>,
}

impl ScriptedGenerator {
    pub fn new(chains: Vec<Vec<StepRecord>>) -> Self {
        Self {
            chains,
            fresh: None,
            fail_with: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// After the script, call `f(call_index)` for every further chain.
    pub fn then(mut self, f: impl Fn(usize) -> Vec<StepRecord> + Send + Sync + 'static) -> Self {
        self.fresh = Some(Box::new(f));
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<ChainRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn propose_chain(&self, request: &ChainRequest) -> Result<Vec<StepRecord>, AgentError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        if let Some(message) = &self.fail_with {
            return Err(AgentError::ExecutionFailed(message.clone()));
        }
        Ok(match self.chains.get(n) {
            Some(chain) => chain.clone(),
            None => self.fresh.as_ref().map(|f| f(n)).unwrap_or_default(),
        })
    }

    async fn synthesize_answer(
        &self,
        _problem: &str,
        path: &[StepRecord],
    ) -> Result<String, AgentError> {
        Ok(path
            .last()
            .map(|s| s.result.clone())
            .unwrap_or_default())
    }
}

/// Scores candidates by thought text (0–100 scale), `default` for unknown thoughts.
pub struct ScriptedEvaluator {
    scores: HashMap<String, f64>,
    default: f64,
    requests: Mutex<Vec<ScoreRequest>>,
}

impl ScriptedEvaluator {
    pub fn new(default: f64) -> Self {
        Self {
            scores: HashMap::new(),
            default,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, thought: &str, score: f64) -> Self {
        self.scores.insert(thought.to_string(), score);
        self
    }

    pub fn requests(&self) -> Vec<ScoreRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn score_step(&self, request: &ScoreRequest) -> Result<StepScore, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        let thought = request
            .candidate_text
            .lines()
            .next()
            .and_then(|l| l.strip_prefix("Thought: "))
            .unwrap_or_default();
        let score = self.scores.get(thought).copied().unwrap_or(self.default);
        Ok(StepScore::new(score, format!("after {}", thought)))
    }
}
