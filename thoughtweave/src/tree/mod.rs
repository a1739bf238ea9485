//! Reasoning tree: an arena of [`ThoughtNode`]s keyed by [`NodeId`].
//!
//! Parents are stored as ids and children as id lists, so the tree owns every
//! node and no node owns another. Only nodes that passed the acceptance gate
//! are ever inserted.

mod node;
mod path;

pub use node::{NodeId, NodeIdAllocator, StepRecord, ThoughtNode};
pub use path::{PathState, ReasoningPath};

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("node already attached: {0}")]
    AlreadyAttached(NodeId),
}

/// Arena of attached nodes.
#[derive(Debug)]
pub struct ThoughtTree {
    nodes: HashMap<NodeId, ThoughtNode>,
    order: Vec<NodeId>,
    root: NodeId,
}

impl ThoughtTree {
    /// Creates a tree whose root carries the prior knowledge as its thought and
    /// the question as its action. The root has no score.
    pub fn new(
        ids: &mut NodeIdAllocator,
        prior_knowledge: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        let root_id = ids.allocate();
        let root = ThoughtNode::candidate(
            root_id,
            StepRecord::new(prior_knowledge, question, String::new()),
        );
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            nodes,
            order: vec![root_id],
            root: root_id,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Prior knowledge of the problem, rendered as the "Initial State" of every path.
    pub fn prior_knowledge(&self) -> &str {
        self.nodes
            .get(&self.root)
            .map(|n| n.step().thought.as_str())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&ThoughtNode> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&ThoughtNode, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ThoughtNode, TreeError> {
        self.nodes.get_mut(&id).ok_or(TreeError::UnknownNode(id))
    }

    /// Attached nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ThoughtNode> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Attaches a scored candidate under `parent`, setting its depth to
    /// `parent.depth + 1`. Returns the attached id.
    pub fn attach(&mut self, parent: NodeId, mut node: ThoughtNode) -> Result<NodeId, TreeError> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(TreeError::AlreadyAttached(id));
        }
        let parent_node = self.node_mut(parent)?;
        let depth = parent_node.depth() + 1;
        parent_node.push_child(id);
        node.set_parent(parent, depth);
        self.nodes.insert(id, node);
        self.order.push(id);
        Ok(id)
    }

    pub fn set_leaf(&mut self, id: NodeId, is_leaf: bool) -> Result<(), TreeError> {
        self.node_mut(id)?.set_leaf(is_leaf);
        Ok(())
    }

    pub fn set_hint(&mut self, id: NodeId, hint: impl Into<String>) -> Result<(), TreeError> {
        self.node_mut(id)?.set_hint(hint.into());
        Ok(())
    }

    /// Ids from the root down to `id` (inclusive).
    pub fn path_to(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            path.push(cur);
            current = self.node(cur)?.parent();
        }
        path.reverse();
        Ok(path)
    }
}
