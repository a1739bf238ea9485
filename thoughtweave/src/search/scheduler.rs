//! Priority frontier and the main search loop.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, info, instrument, trace};

use crate::error::SolveError;
use crate::tree::{NodeId, ThoughtNode, TreeError};

use super::selector::path_scores;
use super::{SearchConfig, SearchEngine, SearchEvent, SearchOutcomeKind};

/// Result of [`SearchEngine::run`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Root-to-node ids of the chosen path.
    pub path: Vec<NodeId>,
    pub score: f64,
    pub kind: SearchOutcomeKind,
    /// Frontier pops consumed.
    pub iterations: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeState {
    Leaf,
    Open,
    Closed,
}

fn classify(node: &ThoughtNode, config: &SearchConfig) -> NodeState {
    if node.is_leaf() {
        NodeState::Leaf
    } else if node.depth() <= config.max_depth && node.children().len() < config.max_width {
        NodeState::Open
    } else {
        NodeState::Closed
    }
}

/// Min-heap of `(priority, id)`; duplicates allowed, staleness is checked on pop.
#[derive(Debug, Default)]
struct Frontier {
    heap: BinaryHeap<Reverse<(i64, NodeId)>>,
    /// Nodes that reached max width; never enqueued again.
    saturated: HashSet<NodeId>,
}

impl Frontier {
    fn push(&mut self, priority: i64, id: NodeId) {
        self.heap.push(Reverse((priority, id)));
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.heap.pop().map(|Reverse((_, id))| id)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

impl SearchEngine {
    /// Enqueues every open or leaf node in creation order.
    fn seed(&self, frontier: &mut Frontier) {
        for node in self.state.tree.iter() {
            let id = node.id();
            if frontier.saturated.contains(&id) {
                continue;
            }
            if node.children().len() >= self.config.max_width {
                trace!(node = %id, "saturated");
                frontier.saturated.insert(id);
                continue;
            }
            match classify(node, &self.config) {
                NodeState::Leaf | NodeState::Open => {
                    frontier.push(self.config.traversal_bias.priority(node.depth()), id)
                }
                NodeState::Closed => {}
            }
        }
    }

    /// Root-to-`id` path and its aggregate score.
    fn score_path(&self, id: NodeId) -> Result<(Vec<NodeId>, f64), TreeError> {
        let path = self.state.tree.path_to(id)?;
        let scores = path_scores(&self.state.tree, &path)?;
        Ok((path, self.evaluator.aggregate(&scores)))
    }

    /// Runs the scheduled search for at most `iteration_budget` pops.
    ///
    /// Returns the first popped leaf path whose aggregate clears the path
    /// threshold. Otherwise, once the budget is spent or the frontier is empty,
    /// returns the best path among rejected leaves and every childless node.
    #[instrument(skip_all, fields(budget = self.config.iteration_budget))]
    pub async fn run(&mut self) -> Result<SearchOutcome, SolveError> {
        let mut frontier = Frontier::default();
        self.seed(&mut frontier);

        let mut iterations = 0;
        while iterations < self.config.iteration_budget {
            let Some(id) = frontier.pop() else {
                debug!(iterations, "frontier empty");
                break;
            };
            iterations += 1;

            let state = classify(self.state.tree.node(id)?, &self.config);
            match state {
                NodeState::Leaf => {
                    let (path, score) = self.score_path(id)?;
                    self.emit(SearchEvent::PathScored { leaf: id, score }).await;
                    if score >= self.config.path_threshold {
                        info!(leaf = %id, score, iterations, "path accepted");
                        self.emit(SearchEvent::Finished {
                            outcome: SearchOutcomeKind::Accepted,
                            score,
                            iterations,
                        })
                        .await;
                        return Ok(SearchOutcome {
                            path,
                            score,
                            kind: SearchOutcomeKind::Accepted,
                            iterations,
                        });
                    }
                    debug!(leaf = %id, score, "leaf below path threshold");
                    self.state.fallback.push(path, score);
                }
                NodeState::Open => {
                    self.expand(id).await?;
                    self.seed(&mut frontier);
                    trace!(queued = frontier.len(), "reseeded");
                }
                NodeState::Closed => trace!(node = %id, "stale entry skipped"),
            }
        }

        let childless: Vec<NodeId> = self
            .state
            .tree
            .iter()
            .filter(|n| n.children().is_empty())
            .map(ThoughtNode::id)
            .collect();
        for id in childless {
            let (path, score) = self.score_path(id)?;
            self.state.fallback.push(path, score);
        }

        let best = self
            .state
            .fallback
            .best()
            .cloned()
            .ok_or(SolveError::NoCandidatePath)?;
        info!(
            score = best.score,
            iterations,
            candidates = self.state.fallback.len(),
            "budget spent, best-effort path"
        );
        self.emit(SearchEvent::Finished {
            outcome: SearchOutcomeKind::BestEffort,
            score: best.score,
            iterations,
        })
        .await;
        Ok(SearchOutcome {
            path: best.nodes,
            score: best.score,
            kind: SearchOutcomeKind::BestEffort,
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeIdAllocator, StepRecord};

    #[test]
    fn frontier_pops_lowest_priority_then_lowest_id() {
        let mut ids = NodeIdAllocator::new();
        let (a, b, c) = (ids.allocate(), ids.allocate(), ids.allocate());
        let mut frontier = Frontier::default();
        frontier.push(0, c);
        frontier.push(-1, b);
        frontier.push(-1, a);
        assert_eq!(frontier.pop(), Some(a));
        assert_eq!(frontier.pop(), Some(b));
        assert_eq!(frontier.pop(), Some(c));
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn classify_by_leaf_depth_and_width() {
        let config = SearchConfig {
            max_depth: 1,
            max_width: 1,
            ..SearchConfig::default()
        };
        let mut ids = NodeIdAllocator::new();
        let mut tree = crate::tree::ThoughtTree::new(&mut ids, "p", "q");
        let root = tree.root();
        assert_eq!(classify(tree.node(root).unwrap(), &config), NodeState::Open);

        let a = tree
            .attach(
                root,
                ThoughtNode::candidate(ids.allocate(), StepRecord::default()).with_score(1.0),
            )
            .unwrap();
        let b = tree
            .attach(
                a,
                ThoughtNode::candidate(ids.allocate(), StepRecord::default()).with_score(1.0),
            )
            .unwrap();
        // root is at width 1, b is deeper than max_depth
        assert_eq!(classify(tree.node(root).unwrap(), &config), NodeState::Closed);
        assert_eq!(classify(tree.node(b).unwrap(), &config), NodeState::Closed);
        tree.set_leaf(b, true).unwrap();
        assert_eq!(classify(tree.node(b).unwrap(), &config), NodeState::Leaf);
    }
}
