//! Library side of the `thoughtweave` binary: flag merging, model setup, the
//! solve run and text rendering. `main.rs` only parses arguments and prints.

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use clap::Args;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use thoughtweave::{
    AgentError, ChatOpenAI, ConfigError, EvaluationAnchor, LlmClient, LlmEvaluator, LlmGenerator,
    SearchConfig, SearchEvent, SolveError, Solution, Solver, StepParser, TraversalBias,
};

/// Name used for `$XDG_CONFIG_HOME/<APP_NAME>/config.toml`.
pub const APP_NAME: &str = "thoughtweave";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Load(#[from] thoughtweave_config::LoadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not read the problem: {0}")]
    Problem(#[source] AgentError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("empty problem: pass the problem text as arguments")]
    EmptyProblem,
}

/// Search flags; each one overrides the `[search]` table of the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct SearchArgs {
    /// Search strategy (only `search` is available)
    #[arg(long, value_name = "NAME")]
    pub strategy: Option<String>,

    /// Minimum step score (0-1) for a step to join the tree
    #[arg(long, value_name = "SCORE")]
    pub node_threshold: Option<f64>,

    /// Minimum mean path score (0-1) to accept a finished path
    #[arg(long, value_name = "SCORE")]
    pub path_threshold: Option<f64>,

    /// Maximum children per node
    #[arg(long, value_name = "N")]
    pub max_width: Option<usize>,

    /// Nodes deeper than this are not expanded
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Frontier pops before falling back to the best path
    #[arg(long, value_name = "N")]
    pub iterations: Option<usize>,

    /// prefer-deep or prefer-shallow
    #[arg(long, value_name = "BIAS")]
    pub bias: Option<TraversalBias>,

    /// expansion-root or chain-tip
    #[arg(long, value_name = "ANCHOR")]
    pub anchor: Option<EvaluationAnchor>,

    /// Per model call, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl SearchArgs {
    /// Overlays the flags that were given onto `base` and validates the result.
    pub fn apply(self, mut base: SearchConfig) -> Result<SearchConfig, ConfigError> {
        if let Some(v) = self.strategy {
            base.strategy = v;
        }
        if let Some(v) = self.node_threshold {
            base.node_threshold = v;
        }
        if let Some(v) = self.path_threshold {
            base.path_threshold = v;
        }
        if let Some(v) = self.max_width {
            base.max_width = v;
        }
        if let Some(v) = self.max_depth {
            base.max_depth = v;
        }
        if let Some(v) = self.iterations {
            base.iteration_budget = v;
        }
        if let Some(v) = self.bias {
            base.traversal_bias = v;
        }
        if let Some(v) = self.anchor {
            base.evaluation_anchor = v;
        }
        if self.timeout.is_some() {
            base.call_timeout_secs = self.timeout;
        }
        base.validate()?;
        Ok(base)
    }
}

/// Model endpoint settings, from `OPENAI_*` env vars and the `--model` flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSettings {
    pub model: String,
    pub base_url: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

impl ModelSettings {
    /// `flag_model` wins over `OPENAI_MODEL`.
    pub fn from_env(flag_model: Option<String>) -> Self {
        Self::from_lookup(flag_model, |k| std::env::var(k).ok())
    }

    fn from_lookup(flag_model: Option<String>, get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        Self {
            model: flag_model
                .or_else(|| non_empty("OPENAI_MODEL"))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty("OPENAI_BASE_URL"),
            api_key: non_empty("OPENAI_API_KEY"),
            temperature: non_empty("OPENAI_TEMPERATURE").and_then(|t| t.parse().ok()),
        }
    }

    pub fn build_client(&self) -> Arc<dyn LlmClient> {
        let mut config = OpenAIConfig::new();
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key);
        }
        if let Some(url) = &self.base_url {
            config = config.with_api_base(url);
        }
        let mut client = ChatOpenAI::with_config(config, &self.model);
        if let Some(t) = self.temperature {
            client = client.with_temperature(t);
        }
        Arc::new(client)
    }
}

/// Effective configuration, as printed by `thoughtweave config`.
#[derive(Debug, Serialize)]
pub struct EffectiveConfig {
    pub search: SearchConfig,
    pub model: ModelSettings,
    pub config_file: Option<String>,
}

impl EffectiveConfig {
    pub fn to_text(&self) -> String {
        let s = &self.search;
        let mut lines = vec![
            format!(
                "config file      {}",
                self.config_file.as_deref().unwrap_or("(none)")
            ),
            format!("model            {}", self.model.model),
            format!(
                "base url         {}",
                self.model.base_url.as_deref().unwrap_or("(default)")
            ),
            format!("strategy         {}", s.strategy),
            format!("node threshold   {}", s.node_threshold),
            format!("path threshold   {}", s.path_threshold),
            format!("max width        {}", s.max_width),
            format!("max depth        {}", s.max_depth),
            format!("iterations       {}", s.iteration_budget),
            format!("bias             {:?}", s.traversal_bias),
            format!("anchor           {:?}", s.evaluation_anchor),
        ];
        if let Some(t) = s.call_timeout_secs {
            lines.push(format!("call timeout     {}s", t));
        }
        lines.join("\n")
    }
}

/// Parses the raw problem through the model, then runs the solver on it.
pub async fn solve_text(
    llm: Arc<dyn LlmClient>,
    problem_text: &str,
    config: SearchConfig,
    events: Option<mpsc::Sender<SearchEvent>>,
) -> Result<Solution, CliError> {
    if problem_text.trim().is_empty() {
        return Err(CliError::EmptyProblem);
    }
    let problem = StepParser::new(llm.clone())
        .parse_problem(problem_text)
        .await
        .map_err(CliError::Problem)?;
    info!(domain = %problem.domain, question = %problem.question, "problem parsed");

    let mut solver = Solver::new(
        Arc::new(LlmGenerator::new(llm.clone())),
        Arc::new(LlmEvaluator::new(llm)),
        config,
    )?;
    if let Some(tx) = events {
        solver = solver.with_events(tx);
    }
    Ok(solver.solve(problem).await?)
}

/// One line per event, for `--verbose` progress on stderr.
pub fn render_event(event: &SearchEvent) -> String {
    match event {
        SearchEvent::ExpansionStarted { node, depth } => {
            format!("expand {} (depth {})", node, depth)
        }
        SearchEvent::ChainProposed { node, candidates } => {
            format!("  {} candidate step(s) for {}", candidates, node)
        }
        SearchEvent::CandidateAccepted {
            node,
            parent,
            score,
        } => format!("  + {} under {} ({:.2})", node, parent, score),
        SearchEvent::CandidateRejected { parent, score } => {
            format!("  - rejected under {} ({:.2})", parent, score)
        }
        SearchEvent::LeafMarked { node } => format!("  leaf {}", node),
        SearchEvent::PathScored { leaf, score } => format!("path to {} scored {:.2}", leaf, score),
        SearchEvent::Finished {
            outcome,
            score,
            iterations,
        } => format!(
            "finished: {:?} ({:.2}) after {} iteration(s)",
            outcome, score, iterations
        ),
    }
}

/// Human-readable solution: the steps, then the answer on the last line.
pub fn render_solution(solution: &Solution) -> String {
    let mut out = String::new();
    for (i, p) in solution.path.iter().enumerate().skip(1) {
        let score = p.score.map(|s| format!(" ({:.2})", s)).unwrap_or_default();
        out.push_str(&format!(
            "Step {}{}: {}\n  {}\n  => {}\n",
            i, score, p.step.thought, p.step.action, p.step.result
        ));
    }
    out.push_str(&format!(
        "Path score: {:.2} ({:?})\n",
        solution.path_score, solution.outcome
    ));
    out.push_str(&format!("Answer: {}", solution.answer));
    out
}
