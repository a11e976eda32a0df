use serde::Serialize;
use std::collections::BTreeMap;

use super::effective_vote_index;
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::Destination;

/// Consecutive windows walking back from a node, each with its vote multiplier.
pub const REPUTATION_WINDOWS: [(usize, i64); 3] = [(5000, 4), (10_000, 2), (20_000, 1)];

/// Scores are kept as integers; reports divide by this.
pub const REPUTATION_SCALE: f64 = 4.0;

fn multiplier_at(depth: usize) -> Option<i64> {
    let mut start = 0;
    for (size, multiplier) in REPUTATION_WINDOWS {
        if depth < start + size {
            return Some(multiplier);
        }
        start += size;
    }
    None
}

/// Reputation of every destination voted on in the windows ending at `id`.
pub fn reputation_scores<C: ChainContext>(ctx: &C, id: NodeId) -> BTreeMap<Destination, i64> {
    let mut scores = BTreeMap::new();
    for (depth, ancestor) in ctx.ancestors(id).enumerate() {
        let Some(multiplier) = multiplier_at(depth) else {
            break;
        };
        for vote in &ctx.node(ancestor).vote.reputation_votes {
            let signed = if vote.weight >= 0 { multiplier } else { -multiplier };
            *scores.entry(vote.destination).or_insert(0) += signed;
        }
    }
    scores
}

/// Reputation in force at `id`.
pub fn effective_reputation<C: ChainContext>(ctx: &C, id: NodeId) -> BTreeMap<Destination, i64> {
    reputation_scores(ctx, effective_vote_index(ctx, id))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReputationEntry {
    pub destination: Destination,
    pub score: f64,
}

pub fn reputation_report(scores: &BTreeMap<Destination, i64>) -> Vec<ReputationEntry> {
    scores
        .iter()
        .map(|(destination, score)| ReputationEntry {
            destination: *destination,
            score: *score as f64 / REPUTATION_SCALE,
        })
        .collect()
}
