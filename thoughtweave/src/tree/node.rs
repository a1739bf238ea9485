//! Node identity, step content and the node record stored in the arena.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, assigned once at creation and never reused.
///
/// Ordering follows creation order, which the scheduler uses to break ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Monotonic id source owned by one search run.
///
/// Rejected candidates consume ids too, so attached ids are increasing but not dense.
#[derive(Debug)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next - 1
    }
}

impl Default for NodeIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Content of one reasoning step as produced by the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepRecord {
    pub thought: String,
    pub action: String,
    pub result: String,
}

impl StepRecord {
    pub fn new(
        thought: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: action.into(),
            result: result.into(),
        }
    }

    /// Labelled fields in display order.
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("Thought", self.thought.as_str()),
            ("Action", self.action.as_str()),
            ("Result", self.result.as_str()),
        ]
    }

    /// Multi-line rendering shown to the evaluator and the answer synthesizer.
    pub fn as_text(&self) -> String {
        format!(
            "Thought: {}\nAction: {}\nResult: {}",
            self.thought, self.action, self.result
        )
    }

    /// Thought text normalized for duplicate detection (quotes removed, trimmed, lowercased).
    pub fn normalized_thought(&self) -> String {
        self.thought
            .replace(['"', '\''], "")
            .trim()
            .to_lowercase()
    }
}

/// One node of the reasoning tree.
///
/// Structure fields (`parent`, `depth`, `children`) are only written by
/// [`ThoughtTree`](super::ThoughtTree) when the node is attached.
#[derive(Clone, Debug, Serialize)]
pub struct ThoughtNode {
    id: NodeId,
    step: StepRecord,
    score: Option<f64>,
    hint: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    is_leaf: bool,
}

impl ThoughtNode {
    /// Detached candidate created from a generator step; not yet scored.
    pub fn candidate(id: NodeId, step: StepRecord) -> Self {
        Self {
            id,
            step,
            score: None,
            hint: String::new(),
            parent: None,
            children: Vec::new(),
            depth: 0,
            is_leaf: false,
        }
    }

    /// Records the evaluator score, normalized to `[0, 1]`.
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn step(&self) -> &StepRecord {
        &self.step
    }

    /// `None` on the root.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    pub(super) fn set_parent(&mut self, parent: NodeId, depth: usize) {
        self.parent = Some(parent);
        self.depth = depth;
    }

    pub(super) fn push_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    pub(super) fn set_leaf(&mut self, is_leaf: bool) {
        self.is_leaf = is_leaf;
    }

    pub(super) fn set_hint(&mut self, hint: String) {
        self.hint = hint;
    }
}

impl fmt::Display for ThoughtNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node(id={} children={} depth:{} is_leaf={})",
            self.id,
            self.children.len(),
            self.depth,
            self.is_leaf
        )
    }
}
