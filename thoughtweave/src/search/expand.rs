//! One expansion: propose a chain, score it step by step, attach the accepted prefix.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::agents::{ChainRequest, ScoreRequest, NO_OBSERVATIONS};
use crate::error::SolveError;
use crate::tree::{NodeId, ReasoningPath, StepRecord, ThoughtNode};

use super::{with_timeout, EvaluationAnchor, SearchEngine, SearchEvent};

/// Why a chain walk ended before the chain was consumed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StopReason {
    /// A candidate scored below the node threshold.
    Gated { score: f64 },
    /// The generator produced nothing new.
    EmptyChain,
    GeneratorTimeout,
    /// Treated like a gating stop for the rest of the chain.
    EvaluatorTimeout,
}

/// Result of [`SearchEngine::expand`].
#[derive(Clone, Debug, PartialEq)]
pub struct ExpansionOutcome {
    pub node: NodeId,
    /// Candidates left after deduplication.
    pub proposed: usize,
    /// Candidates the evaluator scored.
    pub evaluated: usize,
    /// Newly attached nodes, top-down.
    pub attached: Vec<NodeId>,
    /// Set when the whole chain was accepted.
    pub leaf: Option<NodeId>,
    pub stop: Option<StopReason>,
}

impl ExpansionOutcome {
    fn new(node: NodeId) -> Self {
        Self {
            node,
            proposed: 0,
            evaluated: 0,
            attached: Vec::new(),
            leaf: None,
            stop: None,
        }
    }

    fn stopped(node: NodeId, reason: StopReason) -> Self {
        Self {
            stop: Some(reason),
            ..Self::new(node)
        }
    }
}

/// Results of observed steps that are not on `path`, one `- result` line each.
pub(crate) fn exclusion_text(observations: &[StepRecord], path: &ReasoningPath) -> String {
    let lines: Vec<String> = observations
        .iter()
        .filter(|step| !path.contains(step))
        .map(|step| format!("- {}", step.result))
        .collect();
    if lines.is_empty() {
        NO_OBSERVATIONS.to_string()
    } else {
        lines.join("\n")
    }
}

pub(crate) fn hint_text(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("Hint: {}", hint)
    }
}

/// Drops candidates whose normalized thought was already seen; keeps first occurrences.
pub(crate) fn dedup_by_thought(chain: Vec<StepRecord>) -> Vec<StepRecord> {
    let mut seen = HashSet::new();
    chain
        .into_iter()
        .filter(|step| seen.insert(step.normalized_thought()))
        .collect()
}

impl SearchEngine {
    /// Expands `id` with one generator chain.
    ///
    /// Each candidate is scored, logged and, if it clears the node threshold,
    /// attached under the previous accepted one. The first rejection stops the
    /// walk and leaves the stopping node open. A fully accepted chain marks its
    /// last node as a leaf. Timeouts end the attempt without failing the run.
    #[instrument(skip_all, fields(node = %id))]
    pub async fn expand(&mut self, id: NodeId) -> Result<ExpansionOutcome, SolveError> {
        let node = self.state.tree.node(id)?;
        let depth = node.depth();
        let hint = hint_text(node.hint());
        self.emit(SearchEvent::ExpansionStarted { node: id, depth })
            .await;

        let path = ReasoningPath::build(&self.state.tree, id)?;
        let request = ChainRequest {
            problem: self.problem.statement.clone(),
            domain: self.problem.domain.clone(),
            path_text: path.text.clone(),
            exclusion_text: exclusion_text(&self.state.observations, &path),
            hint_text: hint,
            next_step_number: path.step_count + 1,
        };

        let timeout = self.config.call_timeout();
        let chain = match with_timeout(
            timeout,
            "propose_chain",
            self.generator.propose_chain(&request),
        )
        .await
        {
            Ok(chain) => chain,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "generator timed out, node stays open");
                return Ok(ExpansionOutcome::stopped(id, StopReason::GeneratorTimeout));
            }
            Err(e) => return Err(e.into()),
        };
        let chain = dedup_by_thought(chain);
        self.emit(SearchEvent::ChainProposed {
            node: id,
            candidates: chain.len(),
        })
        .await;

        let mut outcome = ExpansionOutcome::new(id);
        outcome.proposed = chain.len();
        self.state.tree.set_leaf(id, false)?;
        if chain.is_empty() {
            debug!("empty chain");
            outcome.stop = Some(StopReason::EmptyChain);
            return Ok(outcome);
        }

        let mut current_parent = id;
        let mut anchor_text = path.text;
        for step in chain {
            let candidate_id = self.state.ids.allocate();
            if self.config.evaluation_anchor == EvaluationAnchor::ChainTip && current_parent != id
            {
                anchor_text = ReasoningPath::build(&self.state.tree, current_parent)?.text;
            }
            let request = ScoreRequest {
                problem: self.problem.statement.clone(),
                domain: self.problem.domain.clone(),
                path_text: anchor_text.clone(),
                candidate_text: step.as_text(),
            };
            let verdict = match with_timeout(
                timeout,
                "score_step",
                self.evaluator.score_step(&request),
            )
            .await
            {
                Ok(verdict) => verdict,
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, candidate = %candidate_id, "evaluator timed out, chain stopped");
                    outcome.stop = Some(StopReason::EvaluatorTimeout);
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            outcome.evaluated += 1;

            let score = verdict.normalized();
            self.state.observations.push(step.clone());
            self.state.tree.set_hint(current_parent, verdict.hint)?;

            if score >= self.config.node_threshold {
                let parent = current_parent;
                current_parent = self
                    .state
                    .tree
                    .attach(parent, ThoughtNode::candidate(candidate_id, step).with_score(score))?;
                debug!(node = %current_parent, %parent, score, "candidate accepted");
                outcome.attached.push(current_parent);
                self.emit(SearchEvent::CandidateAccepted {
                    node: current_parent,
                    parent,
                    score,
                })
                .await;
            } else {
                debug!(
                    candidate = %candidate_id,
                    score,
                    threshold = self.config.node_threshold,
                    "gating stop"
                );
                outcome.stop = Some(StopReason::Gated { score });
                self.emit(SearchEvent::CandidateRejected {
                    parent: current_parent,
                    score,
                })
                .await;
                break;
            }
        }

        if outcome.stop.is_none() {
            self.state.tree.set_leaf(current_parent, true)?;
            outcome.leaf = Some(current_parent);
            debug!(leaf = %current_parent, "chain consumed");
            self.emit(SearchEvent::LeafMarked {
                node: current_parent,
            })
            .await;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::agents::{Evaluator, Generator, Problem, StepScore};
    use crate::error::AgentError;
    use crate::search::SearchConfig;

    struct ChainScript {
        chains: Mutex<VecDeque<Vec<StepRecord>>>,
        requests: Mutex<Vec<ChainRequest>>,
        delay: Option<Duration>,
    }

    impl ChainScript {
        fn new(chains: Vec<Vec<StepRecord>>) -> Self {
            Self {
                chains: Mutex::new(chains.into()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Generator for ChainScript {
        async fn propose_chain(&self, request: &ChainRequest) -> Result<Vec<StepRecord>, AgentError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            Ok(self.chains.lock().unwrap().pop_front().unwrap_or_default())
        }

        async fn synthesize_answer(&self, _: &str, _: &[StepRecord]) -> Result<String, AgentError> {
            Ok(String::new())
        }
    }

    struct ScoreScript {
        scores: Mutex<VecDeque<f64>>,
        requests: Mutex<Vec<ScoreRequest>>,
        delay: Option<Duration>,
    }

    impl ScoreScript {
        fn new(scores: &[f64]) -> Self {
            Self {
                scores: Mutex::new(scores.iter().copied().collect()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Evaluator for ScoreScript {
        async fn score_step(&self, request: &ScoreRequest) -> Result<StepScore, AgentError> {
            let n = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len()
            };
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            let score = self.scores.lock().unwrap().pop_front().unwrap_or(0.0);
            Ok(StepScore::new(score, format!("hint {}", n)))
        }
    }

    fn step(s: &str) -> StepRecord {
        StepRecord::new(s, format!("do {}", s), format!("got {}", s))
    }

    fn engine(
        generator: Arc<ChainScript>,
        evaluator: Arc<ScoreScript>,
        config: SearchConfig,
    ) -> SearchEngine {
        let problem = Problem::new(
            "A train travels 60 mph for 2 hours. How far?",
            "60 mph for 2 hours",
            "How far?",
            "arithmetic",
        );
        SearchEngine::new(generator, evaluator, problem, config).unwrap()
    }

    /// **Scenario**: one candidate scored 90 is attached at depth 1 and marked leaf.
    #[tokio::test]
    async fn single_accepted_candidate_becomes_leaf() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("multiply")]]));
        let eval = Arc::new(ScoreScript::new(&[90.0]));
        let mut engine = engine(gen.clone(), eval, SearchConfig::default());
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert_eq!(outcome.attached.len(), 1);
        let child = outcome.attached[0];
        assert_eq!(outcome.leaf, Some(child));
        let node = engine.tree().node(child).unwrap();
        assert_eq!(node.depth(), 1);
        assert_eq!(node.score(), Some(0.9));
        assert!(node.is_leaf());
        assert_eq!(engine.tree().path_to(child).unwrap(), vec![root, child]);
        assert_eq!(engine.observations().len(), 1);

        let requests = gen.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.next_step_number, 2);
        assert_eq!(request.exclusion_text, NO_OBSERVATIONS);
        assert_eq!(request.hint_text, "");
        assert!(request.path_text.contains("Initial State: 60 mph for 2 hours"));
    }

    /// **Scenario**: one candidate scored 30 is discarded; the root stays open and
    /// the observation log grows by one.
    #[tokio::test]
    async fn rejected_candidate_is_logged_not_attached() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("guess")]]));
        let eval = Arc::new(ScoreScript::new(&[30.0]));
        let mut engine = engine(gen, eval, SearchConfig::default());
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert!(outcome.attached.is_empty());
        assert_eq!(outcome.leaf, None);
        assert_eq!(outcome.stop, Some(StopReason::Gated { score: 0.3 }));
        assert_eq!(engine.tree().len(), 1);
        let root_node = engine.tree().node(root).unwrap();
        assert!(!root_node.is_leaf());
        assert!(root_node.children().is_empty());
        assert_eq!(root_node.hint(), "hint 1");
        assert_eq!(engine.observations(), &[step("guess")]);
    }

    /// **Scenario**: a 90/40 chain attaches the first step only; nothing is marked
    /// leaf and the new child can be expanded again.
    #[tokio::test]
    async fn gating_stop_keeps_prefix_open() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("a"), step("b")]]));
        let eval = Arc::new(ScoreScript::new(&[90.0, 40.0]));
        let mut engine = engine(gen, eval, SearchConfig::default());
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert_eq!(outcome.attached.len(), 1);
        assert_eq!(outcome.evaluated, 2);
        assert_eq!(outcome.leaf, None);
        let a = outcome.attached[0];
        let node = engine.tree().node(a).unwrap();
        assert_eq!(node.depth(), 1);
        assert!(!node.is_leaf());
        assert!(node.children().is_empty());
        assert_eq!(node.hint(), "hint 2");
        assert_eq!(engine.tree().node(root).unwrap().hint(), "hint 1");
        assert_eq!(engine.observations().len(), 2);
    }

    #[tokio::test]
    async fn retry_excludes_rejected_results_and_passes_hint() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("guess")], vec![step("multiply")]]));
        let eval = Arc::new(ScoreScript::new(&[20.0, 95.0]));
        let mut engine = engine(gen.clone(), eval, SearchConfig::default());
        let root = engine.tree().root();

        engine.expand(root).await.unwrap();
        engine.expand(root).await.unwrap();

        let requests = gen.requests.lock().unwrap();
        assert_eq!(requests[1].exclusion_text, "- got guess");
        assert_eq!(requests[1].hint_text, "Hint: hint 1");
    }

    /// **Scenario**: steps on the path are not listed as already-tried.
    #[tokio::test]
    async fn exclusion_skips_steps_on_the_path() {
        let gen = Arc::new(ChainScript::new(vec![
            vec![step("a"), step("b")],
            vec![step("c")],
        ]));
        let eval = Arc::new(ScoreScript::new(&[90.0, 10.0, 90.0]));
        let mut engine = engine(gen.clone(), eval, SearchConfig::default());
        let root = engine.tree().root();

        let first = engine.expand(root).await.unwrap();
        engine.expand(first.attached[0]).await.unwrap();

        let requests = gen.requests.lock().unwrap();
        assert_eq!(requests[1].exclusion_text, "- got b");
        assert_eq!(requests[1].next_step_number, 3);
    }

    #[tokio::test]
    async fn duplicate_thoughts_are_dropped() {
        let gen = Arc::new(ChainScript::new(vec![vec![
            step("Multiply"),
            StepRecord::new("'multiply' ", "again", "again"),
            step("report"),
        ]]));
        let eval = Arc::new(ScoreScript::new(&[90.0, 90.0]));
        let mut engine = engine(gen, eval, SearchConfig::default());
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert_eq!(outcome.proposed, 2);
        assert_eq!(outcome.attached.len(), 2);
        let leaf = outcome.leaf.unwrap();
        assert_eq!(engine.tree().node(leaf).unwrap().step().thought, "report");
        assert_eq!(engine.tree().node(leaf).unwrap().depth(), 2);
    }

    #[tokio::test]
    async fn empty_chain_marks_nothing() {
        let gen = Arc::new(ChainScript::new(vec![vec![]]));
        let eval = Arc::new(ScoreScript::new(&[]));
        let mut engine = engine(gen, eval.clone(), SearchConfig::default());
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert_eq!(outcome.stop, Some(StopReason::EmptyChain));
        assert!(!engine.tree().node(root).unwrap().is_leaf());
        assert!(eval.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn expansion_root_anchor_scores_every_candidate_on_the_same_path() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("a"), step("b")]]));
        let eval = Arc::new(ScoreScript::new(&[90.0, 90.0]));
        let mut engine = engine(gen, eval.clone(), SearchConfig::default());
        let root = engine.tree().root();
        engine.expand(root).await.unwrap();

        let requests = eval.requests.lock().unwrap();
        assert_eq!(requests[0].path_text, requests[1].path_text);
    }

    #[tokio::test]
    async fn chain_tip_anchor_scores_against_growing_chain() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("a"), step("b")]]));
        let eval = Arc::new(ScoreScript::new(&[90.0, 90.0]));
        let config = SearchConfig {
            evaluation_anchor: EvaluationAnchor::ChainTip,
            ..SearchConfig::default()
        };
        let mut engine = engine(gen, eval.clone(), config);
        let root = engine.tree().root();
        engine.expand(root).await.unwrap();

        let requests = eval.requests.lock().unwrap();
        assert!(!requests[0].path_text.contains("Thought: a"));
        assert!(requests[1].path_text.contains("Thought: a"));
    }

    #[tokio::test(start_paused = true)]
    async fn generator_timeout_leaves_node_open() {
        let mut gen = ChainScript::new(vec![vec![step("a")]]);
        gen.delay = Some(Duration::from_secs(10));
        let eval = Arc::new(ScoreScript::new(&[90.0]));
        let config = SearchConfig {
            call_timeout_secs: Some(1),
            ..SearchConfig::default()
        };
        let mut engine = engine(Arc::new(gen), eval, config);
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert_eq!(outcome.stop, Some(StopReason::GeneratorTimeout));
        assert_eq!(engine.tree().len(), 1);
        assert!(engine.observations().is_empty());
    }

    /// **Scenario**: an evaluator timeout acts as a gating stop; nothing is logged.
    #[tokio::test(start_paused = true)]
    async fn evaluator_timeout_is_a_gating_stop() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("a"), step("b")]]));
        let mut eval = ScoreScript::new(&[90.0, 90.0]);
        eval.delay = Some(Duration::from_secs(10));
        let config = SearchConfig {
            call_timeout_secs: Some(1),
            ..SearchConfig::default()
        };
        let mut engine = engine(gen, Arc::new(eval), config);
        let root = engine.tree().root();

        let outcome = engine.expand(root).await.unwrap();

        assert_eq!(outcome.stop, Some(StopReason::EvaluatorTimeout));
        assert!(outcome.attached.is_empty());
        assert!(engine.observations().is_empty());
        assert!(!engine.tree().node(root).unwrap().is_leaf());
    }

    #[tokio::test]
    async fn events_follow_the_walk() {
        let gen = Arc::new(ChainScript::new(vec![vec![step("a"), step("b")]]));
        let eval = Arc::new(ScoreScript::new(&[90.0, 40.0]));
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);
        let mut engine = engine(gen, eval, SearchConfig::default()).with_events(tx);
        let root = engine.tree().root();
        let outcome = engine.expand(root).await.unwrap();
        drop(engine);

        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        assert_eq!(
            events,
            vec![
                SearchEvent::ExpansionStarted { node: root, depth: 0 },
                SearchEvent::ChainProposed { node: root, candidates: 2 },
                SearchEvent::CandidateAccepted {
                    node: outcome.attached[0],
                    parent: root,
                    score: 0.9
                },
                SearchEvent::CandidateRejected {
                    parent: outcome.attached[0],
                    score: 0.4
                },
            ]
        );
    }

    #[test]
    fn exclusion_text_when_nothing_tried() {
        let mut ids = crate::tree::NodeIdAllocator::new();
        let tree = crate::tree::ThoughtTree::new(&mut ids, "p", "q");
        let path = ReasoningPath::build(&tree, tree.root()).unwrap();
        assert_eq!(exclusion_text(&[], &path), NO_OBSERVATIONS);
        assert_eq!(
            exclusion_text(&[step("x"), step("y")], &path),
            "- got x\n- got y"
        );
    }
}
