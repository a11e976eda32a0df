use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::park_rate::percentage;
use super::reputation::reputation_scores;
use super::{
    PROTOCOL_V4_0, SIGNER_REWARD_PAST_BLOCKS, SIGNER_REWARD_VOTE_MEDIAN_BLOCKS, WeightedTally,
    effective_vote_index, next_effective_vote_index,
};
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::Destination;

/// Consensus on how many reputed signers share the reward and how much
/// each rewarded block pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignerRewardResult {
    pub count: u16,
    pub amount: u32,
}

impl SignerRewardResult {
    pub fn new(count: u16, amount: u32) -> Self {
        Self { count, amount }
    }
}

/// Reward paid by one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SignerReward {
    pub destination: Destination,
    pub amount: i64,
}

/// Pick the signer owed the reward of the next block.
///
/// Only positive reputations are eligible. Above `count` candidates the
/// best scores are kept, preferring fewer past rewards, then the higher
/// destination hash. The winner is the one furthest behind its expected
/// share of `SIGNER_REWARD_PAST_BLOCKS`, ties going to the higher hash.
pub fn select_recipient(
    reputation: &BTreeMap<Destination, i64>,
    count: u16,
    past_rewards: &BTreeMap<Destination, u32>,
) -> Option<Destination> {
    let past = |d: &Destination| i64::from(past_rewards.get(d).copied().unwrap_or(0));

    let mut eligible: Vec<(Destination, i64)> = reputation
        .iter()
        .filter(|(_, score)| **score > 0)
        .map(|(d, score)| (*d, *score))
        .collect();

    if eligible.len() > usize::from(count) {
        eligible.sort_by(|(ld, ls), (rd, rs)| {
            rs.cmp(ls)
                .then_with(|| past(ld).cmp(&past(rd)))
                .then_with(|| rd.hash().cmp(&ld.hash()))
        });
        eligible.truncate(usize::from(count));
    }

    let total: i64 = eligible.iter().map(|(_, score)| score).sum();
    if total == 0 {
        return None;
    }

    let mut best: Option<(Destination, i64)> = None;
    for (destination, score) in eligible {
        let expected = score * SIGNER_REWARD_PAST_BLOCKS as i64 / total;
        let distance = expected - past(&destination);
        let better = match best {
            None => true,
            Some((current, max_distance)) => match distance.cmp(&max_distance) {
                Ordering::Greater => true,
                Ordering::Equal => destination.hash() > current.hash(),
                Ordering::Less => false,
            },
        };
        if better {
            best = Some((destination, distance));
        }
    }
    best.map(|(destination, _)| destination)
}

/// Rewards received per signer by the `SIGNER_REWARD_PAST_BLOCKS` blocks
/// preceding `id`.
pub fn past_signer_rewards<C: ChainContext>(ctx: &C, id: NodeId) -> BTreeMap<Destination, u32> {
    let mut rewards = BTreeMap::new();
    let past = ctx
        .parent(id)
        .into_iter()
        .flat_map(|parent| ctx.ancestors(parent))
        .take(SIGNER_REWARD_PAST_BLOCKS)
        .filter_map(|ancestor| ctx.results(ancestor))
        .map(|results| results.rewarded_signer)
        .filter(|destination| !destination.is_none());
    for destination in past {
        *rewards.entry(destination).or_insert(0) += 1;
    }
    rewards
}

fn reward_from<C: ChainContext>(ctx: &C, effective: NodeId) -> SignerReward {
    let Some(results) = ctx.results(effective) else {
        return SignerReward::default();
    };
    let vote = results.signer_reward_result;
    let reputation = reputation_scores(ctx, effective);
    let past = past_signer_rewards(ctx, effective);

    match select_recipient(&reputation, vote.count, &past) {
        Some(destination) => SignerReward {
            destination,
            amount: i64::from(vote.amount),
        },
        None => SignerReward::default(),
    }
}

/// Signer reward paid by node `id` running `protocol_version`.
pub fn signer_reward<C: ChainContext>(ctx: &C, id: NodeId, protocol_version: u32) -> SignerReward {
    if protocol_version < PROTOCOL_V4_0 {
        return SignerReward::default();
    }
    let effective = effective_vote_index(ctx, id);
    if effective == id {
        return SignerReward::default();
    }
    reward_from(ctx, effective)
}

/// Signer reward a block built on `tip` running `protocol_version` would pay.
pub fn next_signer_reward<C: ChainContext>(
    ctx: &C,
    tip: NodeId,
    protocol_version: u32,
) -> SignerReward {
    if protocol_version < PROTOCOL_V4_0 {
        return SignerReward::default();
    }
    reward_from(ctx, next_effective_vote_index(ctx, tip))
}

struct SignerRewardTallies {
    count: WeightedTally<u16>,
    amount: WeightedTally<u32>,
}

/// Count and amount votes of the window ending at `id`. Blocks that do not
/// vote, or are missing, vote for `previous`.
fn tally_votes<C: ChainContext>(ctx: &C, id: NodeId, previous: SignerRewardResult) -> SignerRewardTallies {
    let mut count = WeightedTally::new();
    let mut amount = WeightedTally::new();
    let mut counted = 0u64;
    for ancestor in ctx.ancestors(id).take(SIGNER_REWARD_VOTE_MEDIAN_BLOCKS) {
        let vote = ctx.node(ancestor).vote.signer_reward;
        count.add(vote.count.unwrap_or(previous.count), 1);
        amount.add(vote.amount.unwrap_or(previous.amount), 1);
        counted += 1;
    }
    let missing = SIGNER_REWARD_VOTE_MEDIAN_BLOCKS as u64 - counted;
    if missing > 0 {
        count.add(previous.count, missing);
        amount.add(previous.amount, missing);
    }
    SignerRewardTallies { count, amount }
}

fn previous_result<C: ChainContext>(ctx: &C, id: NodeId) -> SignerRewardResult {
    ctx.parent(id)
        .and_then(|parent| ctx.results(parent))
        .map(|results| results.signer_reward_result)
        .unwrap_or_default()
}

/// Signer reward vote result of node `id` running `protocol_version`.
pub fn signer_reward_vote_result<C: ChainContext>(
    ctx: &C,
    id: NodeId,
    protocol_version: u32,
) -> SignerRewardResult {
    if protocol_version < PROTOCOL_V4_0 {
        return SignerRewardResult::default();
    }
    let previous = previous_result(ctx, id);
    let tallies = tally_votes(ctx, id, previous);
    let half = SIGNER_REWARD_VOTE_MEDIAN_BLOCKS as u64 / 2;
    SignerRewardResult {
        count: tallies.count.first_above(half).unwrap_or(previous.count),
        amount: tallies.amount.first_above(half).unwrap_or(previous.amount),
    }
}

/// Signer reward vote result in force at `id`.
pub fn effective_signer_reward_result<C: ChainContext>(ctx: &C, id: NodeId) -> SignerRewardResult {
    ctx.results(effective_vote_index(ctx, id))
        .map(|results| results.signer_reward_result)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoteTallyEntry {
    pub value: i64,
    pub votes: u64,
    pub accumulated_percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignerRewardVoteReport {
    pub count: Vec<VoteTallyEntry>,
    pub amount: Vec<VoteTallyEntry>,
    pub result: Option<SignerRewardResult>,
}

fn tally_entries<V: Ord + Copy + Into<i64>>(tally: &WeightedTally<V>) -> Vec<VoteTallyEntry> {
    let mut accumulated = 0u64;
    tally
        .iter()
        .map(|(value, votes)| {
            accumulated += votes;
            VoteTallyEntry {
                value: (*value).into(),
                votes: *votes,
                accumulated_percentage: percentage(accumulated, tally.total()),
            }
        })
        .collect()
}

/// Signer reward votes of the window ending at `id`, abstentions counted at
/// the previous result.
pub fn signer_reward_vote_report<C: ChainContext>(ctx: &C, id: NodeId) -> SignerRewardVoteReport {
    let previous = previous_result(ctx, id);
    let tallies = tally_votes(ctx, id, previous);
    SignerRewardVoteReport {
        count: tally_entries(&tallies.count),
        amount: tally_entries(&tallies.amount),
        result: ctx.results(id).map(|results| results.signer_reward_result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::LinearChain;
    use crate::consensus::PROTOCOL_V2_0;
    use crate::vote::{Hash160, ReputationVote, SignerRewardVote, VoteRecord};

    fn dest(n: u64) -> Destination {
        Destination::KeyHash(Hash160::from_low_u64(n))
    }

    fn scores(entries: &[(u64, i64)]) -> BTreeMap<Destination, i64> {
        entries.iter().map(|&(d, s)| (dest(d), s)).collect()
    }

    fn rewards(entries: &[(u64, u32)]) -> BTreeMap<Destination, u32> {
        entries.iter().map(|&(d, r)| (dest(d), r)).collect()
    }

    #[test]
    fn recipient_lags_its_expected_share() {
        let reputation = scores(&[(1, 10), (2, 30)]);
        assert_eq!(select_recipient(&reputation, 5, &rewards(&[])), Some(dest(2)));
        // expected 500 and 1500
        let past = rewards(&[(2, 1200)]);
        assert_eq!(select_recipient(&reputation, 5, &past), Some(dest(1)));
    }

    #[test]
    fn only_positive_reputations_are_eligible() {
        let reputation = scores(&[(1, 0), (2, -8)]);
        assert_eq!(select_recipient(&reputation, 5, &rewards(&[])), None);
        assert_eq!(select_recipient(&BTreeMap::new(), 5, &rewards(&[])), None);
        assert_eq!(select_recipient(&scores(&[(1, 4)]), 0, &rewards(&[])), None);
    }

    #[test]
    fn truncation_prefers_fewer_past_rewards_then_higher_hash() {
        let reputation = scores(&[(1, 5), (2, 5), (3, 1)]);
        let past = rewards(&[(2, 3)]);
        assert_eq!(select_recipient(&reputation, 1, &past), Some(dest(1)));
        assert_eq!(select_recipient(&reputation, 1, &rewards(&[])), Some(dest(2)));
    }

    fn signer_vote(count: u16, amount: u32) -> VoteRecord {
        VoteRecord {
            signer_reward: SignerRewardVote::new(count, amount),
            ..VoteRecord::default()
        }
    }

    #[test]
    fn vote_result_keeps_status_quo_without_majority() {
        let mut chain = LinearChain::new();
        let genesis = chain.push_pos(VoteRecord::default());
        assert_eq!(
            signer_reward_vote_result(&chain, genesis, PROTOCOL_V4_0),
            SignerRewardResult::default()
        );
        chain.results_mut(genesis).signer_reward_result = SignerRewardResult::new(3, 500);

        let mut tip = chain.push_pos(VoteRecord::default());
        let unchanged = signer_reward_vote_result(&chain, tip, PROTOCOL_V4_0);
        assert_eq!(unchanged, SignerRewardResult::new(3, 500));
        chain.results_mut(tip).signer_reward_result = unchanged;

        for i in 0..1000 {
            tip = chain.push_pos(signer_vote(5, 800));
            let result = signer_reward_vote_result(&chain, tip, PROTOCOL_V4_0);
            if i < 999 {
                assert_eq!(result, SignerRewardResult::new(3, 500));
            } else {
                // 1000 votes for the new value against 1000 at the old one
                assert_eq!(result, SignerRewardResult::new(5, 800));
            }
            chain.results_mut(tip).signer_reward_result = result;
        }
    }

    #[test]
    fn vote_result_is_zero_before_v4() {
        let mut chain = LinearChain::new();
        let tip = chain.push_pos(signer_vote(5, 800));
        assert_eq!(
            signer_reward_vote_result(&chain, tip, PROTOCOL_V2_0),
            SignerRewardResult::default()
        );
    }

    fn reputed(n: u64) -> VoteRecord {
        VoteRecord {
            reputation_votes: vec![ReputationVote {
                destination: dest(n),
                weight: 1,
            }],
            ..VoteRecord::default()
        }
    }

    #[test]
    fn reward_reads_the_effective_node() {
        let mut chain = LinearChain::new();
        let mut ids = Vec::new();
        for i in 0..100 {
            let vote = match i {
                10 => reputed(1),
                11 => reputed(2),
                _ => VoteRecord::default(),
            };
            ids.push(chain.push_pos(vote));
        }
        let tip = ids[99];
        assert_eq!(signer_reward(&chain, tip, PROTOCOL_V2_0), SignerReward::default());
        // no cached vote result at the effective node
        assert_eq!(signer_reward(&chain, tip, PROTOCOL_V4_0), SignerReward::default());

        chain.results_mut(ids[39]).signer_reward_result = SignerRewardResult::new(2, 50);
        let reward = signer_reward(&chain, tip, PROTOCOL_V4_0);
        assert_eq!(reward, SignerReward { destination: dest(2), amount: 50 });

        chain.results_mut(ids[38]).rewarded_signer = dest(2);
        let reward = signer_reward(&chain, tip, PROTOCOL_V4_0);
        assert_eq!(reward.destination, dest(1));

        // the next block reads one node later
        chain.results_mut(ids[40]).signer_reward_result = SignerRewardResult::new(2, 70);
        let next = next_signer_reward(&chain, tip, PROTOCOL_V4_0);
        assert_eq!(next, SignerReward { destination: dest(1), amount: 70 });
    }

    #[test]
    fn report_places_abstentions_at_previous() {
        let mut chain = LinearChain::new();
        let genesis = chain.push_pos(VoteRecord::default());
        chain.results_mut(genesis).signer_reward_result = SignerRewardResult::new(3, 500);
        let tip = chain.push_pos(signer_vote(5, 800));

        let report = signer_reward_vote_report(&chain, tip);
        assert_eq!(report.count.len(), 2);
        assert_eq!(report.count[0].value, 3);
        assert_eq!(report.count[0].votes, 1999);
        assert_eq!(report.count[1].value, 5);
        assert_eq!(report.count[1].accumulated_percentage, 100.0);
        assert_eq!(report.result, None);
    }
}
