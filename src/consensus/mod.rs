pub mod asset;
pub mod custodian;
pub mod derive;
pub mod exp_series;
pub mod fee;
pub mod median;
pub mod motion;
pub mod park_rate;
pub mod premium;
pub mod protocol;
pub mod reputation;
pub mod signer_reward;

pub use derive::derive_results;
pub use median::WeightedTally;

use crate::blockchain::{ChainContext, NodeId};
use crate::vote::VoteRecord;

/// Protocol versions.
pub const PROTOCOL_V0_5: u32 = 50_000;
pub const PROTOCOL_V2_0: u32 = 2_000_000;
pub const PROTOCOL_V4_0: u32 = 4_000_000;
pub const PROTOCOL_V5_0: u32 = 5_000_000;

/// Version this engine votes for and understands.
pub const PROTOCOL_VERSION: u32 = PROTOCOL_V5_0;

/// Target seconds between proof-of-stake blocks.
pub const STAKE_TARGET_SPACING: i64 = 60;

/// Julian year in blocks.
pub const BLOCKS_PER_YEAR: i64 = 60 * 60 * 24 * 36525 / 100 / STAKE_TARGET_SPACING;

/// Vote windows, in blocks.
pub const PARK_RATE_VOTES: usize = 2000;
pub const PARK_RATE_PREVIOUS_VOTES: usize = 12;
pub const CUSTODIAN_VOTES: usize = 10_000;
pub const MOTION_VOTES: usize = 10_000;
pub const PROTOCOL_VOTES: usize = 2000;
pub const FEE_VOTES: usize = 2000;
pub const ASSET_VOTES: usize = 2000;
pub const SIGNER_REWARD_PAST_BLOCKS: usize = 2000;
pub const SIGNER_REWARD_VOTE_MEDIAN_BLOCKS: usize = 2000;

/// Blocks between a voted result and the moment it takes effect.
pub const VOTE_DELAY_BLOCKS: usize = 60;

pub const MAX_TRADABLE_UNIT_EXPONENT: u8 = 18;
pub const EXP_SERIES_MAX_PARAM: u8 = 171;

/// The node whose cached results are in force at `id`.
pub fn effective_vote_index<C: ChainContext>(ctx: &C, id: NodeId) -> NodeId {
    walk_back(ctx, id, VOTE_DELAY_BLOCKS)
}

/// The node whose cached results will be in force for a block built on `tip`.
pub fn next_effective_vote_index<C: ChainContext>(ctx: &C, tip: NodeId) -> NodeId {
    walk_back(ctx, tip, VOTE_DELAY_BLOCKS - 1)
}

fn walk_back<C: ChainContext>(ctx: &C, id: NodeId, steps: usize) -> NodeId {
    let mut current = id;
    for _ in 0..steps {
        match ctx.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// The node's own vote followed by the votes of the proof-of-stake blocks
/// among its next `count - 1` ancestors.
pub fn collect_votes<C: ChainContext>(ctx: &C, id: NodeId, count: usize) -> Vec<&VoteRecord> {
    let mut votes = Vec::with_capacity(count.min(PARK_RATE_VOTES));
    votes.push(&ctx.node(id).vote);
    let older = ctx
        .parent(id)
        .into_iter()
        .flat_map(|parent| ctx.ancestors(parent))
        .take(count.saturating_sub(1))
        .map(|ancestor| ctx.node(ancestor))
        .filter(|node| node.proof_of_stake)
        .map(|node| &node.vote);
    votes.extend(older);
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::LinearChain;

    #[test]
    fn blocks_per_year() {
        assert_eq!(BLOCKS_PER_YEAR, 525_960);
    }

    #[test]
    fn effective_index_stops_at_genesis() {
        let mut chain = LinearChain::new();
        let ids: Vec<_> = (0..100).map(|_| chain.push_pos(VoteRecord::default())).collect();
        assert_eq!(effective_vote_index(&chain, ids[99]), ids[99 - VOTE_DELAY_BLOCKS]);
        assert_eq!(next_effective_vote_index(&chain, ids[99]), ids[100 - VOTE_DELAY_BLOCKS]);
        assert_eq!(effective_vote_index(&chain, ids[10]), ids[0]);
    }

    #[test]
    fn collected_votes_skip_proof_of_work() {
        let mut chain = LinearChain::new();
        let mut tip = chain.push_pos(VoteRecord::default());
        for i in 0..10u32 {
            let vote = VoteRecord {
                version_vote: i,
                ..VoteRecord::default()
            };
            tip = if i % 2 == 0 {
                chain.push_pos(vote)
            } else {
                chain.push_pow()
            };
        }
        // tip is a PoW node: its null vote still leads the set
        let votes = collect_votes(&chain, tip, 5);
        let versions: Vec<u32> = votes.iter().map(|v| v.version_vote).collect();
        assert_eq!(versions, vec![0, 8, 6]);
    }
}
