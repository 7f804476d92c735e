//! Consensus reduction over a set of responses.
//!
//! Answers are clustered by token-set similarity; the largest cluster is the
//! majority and its size is compared against the consensus threshold.

use crate::request::Response;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum Jaccard similarity for two answers to count as the same answer
pub const DEFAULT_SIMILARITY: f64 = 0.6;

/// Outcome of a consensus reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusOutcome {
    /// The majority cluster reached the threshold
    Agreed,
    /// Enough answers arrived, but no cluster reached the threshold
    Split,
    /// Fewer answers than the threshold arrived
    Insufficient,
}

impl ConsensusOutcome {
    pub fn is_agreed(&self) -> bool {
        matches!(self, ConsensusOutcome::Agreed)
    }
}

impl std::fmt::Display for ConsensusOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusOutcome::Agreed => write!(f, "Agreed"),
            ConsensusOutcome::Split => write!(f, "Split"),
            ConsensusOutcome::Insufficient => write!(f, "Insufficient"),
        }
    }
}

/// Summary of a consensus reduction.
///
/// # Example
///
/// ```
/// use switchboard_domain::strategy::{ConsensusOutcome, ConsensusSummary};
///
/// let summary = ConsensusSummary::from_answers(
///     &[("a", "The answer is 4"), ("b", "the answer is 4."), ("c", "Five")],
///     2,
/// );
/// assert_eq!(summary.outcome, ConsensusOutcome::Agreed);
/// assert_eq!(summary.cluster_size, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusSummary {
    pub outcome: ConsensusOutcome,
    pub threshold: usize,
    /// Whether at least `threshold` answers arrived
    pub eligible: bool,
    /// Size of the majority cluster
    pub cluster_size: usize,
    /// Number of distinct answer clusters
    pub clusters: usize,
    /// Model whose answer represents the majority cluster
    pub representative: Option<String>,
    /// Models in the majority cluster
    pub members: Vec<String>,
}

impl ConsensusSummary {
    /// Reduce successful responses.
    pub fn evaluate(responses: &[Response], threshold: usize) -> Self {
        let answers: Vec<(&str, &str)> = responses
            .iter()
            .map(|r| (r.model_id.as_str(), r.content.as_str()))
            .collect();
        Self::from_answers(&answers, threshold)
    }

    /// Reduce `(model, answer)` pairs.
    pub fn from_answers(answers: &[(&str, &str)], threshold: usize) -> Self {
        let texts: Vec<&str> = answers.iter().map(|(_, text)| *text).collect();
        let clusters = cluster_answers(&texts, DEFAULT_SIMILARITY);

        // Largest cluster; ties go to the cluster formed first
        let majority = clusters
            .iter()
            .fold(None::<&Vec<usize>>, |best, cluster| match best {
                Some(b) if b.len() >= cluster.len() => Some(b),
                _ => Some(cluster),
            });

        let members: Vec<String> = majority
            .map(|cluster| cluster.iter().map(|&i| answers[i].0.to_string()).collect())
            .unwrap_or_default();
        let cluster_size = members.len();
        // No answers never agree, whatever the threshold
        let eligible = !answers.is_empty() && answers.len() >= threshold;

        let outcome = if !eligible {
            ConsensusOutcome::Insufficient
        } else if cluster_size >= threshold {
            ConsensusOutcome::Agreed
        } else {
            ConsensusOutcome::Split
        };

        Self {
            outcome,
            threshold,
            eligible,
            cluster_size,
            clusters: clusters.len(),
            representative: members.first().cloned(),
            members,
        }
    }
}

/// Greedy single-pass clustering.
///
/// Each answer joins the first cluster whose first member is at least
/// `min_similarity` similar, otherwise it opens a new cluster.
pub fn cluster_answers(answers: &[&str], min_similarity: f64) -> Vec<Vec<usize>> {
    let token_sets: Vec<HashSet<String>> = answers.iter().map(|a| tokens(a)).collect();
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for (i, set) in token_sets.iter().enumerate() {
        match clusters
            .iter_mut()
            .find(|cluster| jaccard(&token_sets[cluster[0]], set) >= min_similarity)
        {
            Some(cluster) => cluster.push(i),
            None => clusters.push(vec![i]),
        }
    }

    clusters
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}
