//! Reasoning-path builder: renders the root-to-node chain for prompts.

use super::{NodeId, StepRecord, ThoughtTree, TreeError};

/// One entry of a reasoning path.
#[derive(Clone, Debug, PartialEq)]
pub enum PathState {
    /// Synthetic first state carrying the problem's prior knowledge.
    Initial(String),
    Step(StepRecord),
}

impl PathState {
    fn render(&self) -> String {
        match self {
            PathState::Initial(prior) => format!("Initial State: {}", prior),
            PathState::Step(step) => step
                .fields()
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Ordered root-to-node states plus their numbered text rendering.
#[derive(Clone, Debug)]
pub struct ReasoningPath {
    /// `Step 1:\n...` blocks joined by newlines.
    pub text: String,
    /// Number of states, root included.
    pub step_count: usize,
    /// Raw states, root first.
    pub states: Vec<PathState>,
}

impl ReasoningPath {
    /// Walks from `id` up to the root. Pure read, O(depth).
    pub fn build(tree: &ThoughtTree, id: NodeId) -> Result<Self, TreeError> {
        let states: Vec<PathState> = tree
            .path_to(id)?
            .into_iter()
            .map(|nid| -> Result<PathState, TreeError> {
                let node = tree.node(nid)?;
                Ok(if node.parent().is_none() {
                    PathState::Initial(tree.prior_knowledge().to_string())
                } else {
                    PathState::Step(node.step().clone())
                })
            })
            .collect::<Result<_, _>>()?;

        let text = states
            .iter()
            .enumerate()
            .map(|(i, s)| format!("Step {}:\n{}", i + 1, s.render()))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Self {
            text,
            step_count: states.len(),
            states,
        })
    }

    /// Whether `step` is one of the (non-initial) states on this path.
    pub fn contains(&self, step: &StepRecord) -> bool {
        self.states
            .iter()
            .any(|s| matches!(s, PathState::Step(own) if own == step))
    }
}
