//! Path scoring and the best-effort fallback pool.

use serde::Serialize;

use crate::tree::{NodeId, ThoughtTree, TreeError};

/// Arithmetic mean of the scores; an empty slice (root-only path) scores 0.
pub fn mean_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Scores of every node on `path` except the root, in path order.
///
/// Unscored nodes below the root cannot be attached, so they are skipped.
pub fn path_scores(tree: &ThoughtTree, path: &[NodeId]) -> Result<Vec<f64>, TreeError> {
    let mut scores = Vec::with_capacity(path.len().saturating_sub(1));
    for id in path.iter().skip(1) {
        if let Some(score) = tree.node(*id)?.score() {
            scores.push(score);
        }
    }
    Ok(scores)
}

/// A root-to-node path with its aggregate score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidatePath {
    pub nodes: Vec<NodeId>,
    pub score: f64,
}

/// Paths collected for the best-effort answer. Duplicates are allowed; only the
/// maximum matters.
#[derive(Debug, Default)]
pub struct FallbackPool {
    entries: Vec<CandidatePath>,
}

impl FallbackPool {
    pub fn push(&mut self, nodes: Vec<NodeId>, score: f64) {
        self.entries.push(CandidatePath { nodes, score });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CandidatePath] {
        &self.entries
    }

    /// Highest-scoring path; the earliest entry wins ties.
    pub fn best(&self) -> Option<&CandidatePath> {
        self.entries.iter().reduce(|best, candidate| {
            if candidate.score.total_cmp(&best.score).is_gt() {
                candidate
            } else {
                best
            }
        })
    }
}
