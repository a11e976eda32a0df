use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::custodian::{VoteShare, VoteTotal};
use super::park_rate::percentage;
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::Hash160;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MotionReport {
    pub motions: BTreeMap<Hash160, VoteShare>,
    pub total: VoteTotal,
}

/// Support of every motion among the proof-of-stake blocks of the
/// `quantity` blocks ending at `id`. A motion listed twice in one vote
/// counts once.
pub fn motion_report<C: ChainContext>(ctx: &C, id: NodeId, quantity: usize) -> MotionReport {
    let mut tally: BTreeMap<Hash160, VoteTotal> = BTreeMap::new();
    let mut total = VoteTotal::default();

    let pos_nodes = ctx
        .ancestors(id)
        .take(quantity)
        .map(|n| ctx.node(n))
        .filter(|node| node.proof_of_stake);
    for node in pos_nodes {
        let vote = &node.vote;
        let motions: BTreeSet<&Hash160> = vote.motions.iter().collect();
        for motion in motions {
            let entry = tally.entry(*motion).or_default();
            entry.blocks += 1;
            entry.sharedays += vote.coin_age_destroyed;
        }
        total.blocks += 1;
        total.sharedays += vote.coin_age_destroyed;
    }

    let motions = tally
        .into_iter()
        .map(|(motion, counted)| {
            let share = VoteShare {
                blocks: counted.blocks,
                block_percentage: percentage(counted.blocks as u64, total.blocks as u64),
                sharedays: counted.sharedays,
                shareday_percentage: percentage(counted.sharedays, total.sharedays),
            };
            (motion, share)
        })
        .collect();

    MotionReport { motions, total }
}
