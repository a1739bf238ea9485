//! Progress events emitted while the search runs.
//!
//! Sent through an optional `mpsc::Sender<SearchEvent>`; a closed or missing
//! receiver never affects the search.

use serde::Serialize;

use crate::tree::NodeId;

/// How the search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcomeKind {
    /// A leaf path cleared the path threshold.
    Accepted,
    /// Budget exhausted; the best collected path was returned.
    BestEffort,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    ExpansionStarted {
        node: NodeId,
        depth: usize,
    },
    ChainProposed {
        node: NodeId,
        candidates: usize,
    },
    CandidateAccepted {
        node: NodeId,
        parent: NodeId,
        score: f64,
    },
    CandidateRejected {
        parent: NodeId,
        score: f64,
    },
    /// The chain was consumed entirely and `node` became a leaf.
    LeafMarked {
        node: NodeId,
    },
    PathScored {
        leaf: NodeId,
        score: f64,
    },
    Finished {
        outcome: SearchOutcomeKind,
        score: f64,
        iterations: usize,
    },
}
