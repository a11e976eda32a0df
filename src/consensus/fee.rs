use std::collections::BTreeMap;

use super::{FEE_VOTES, WeightedTally, effective_vote_index};
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::Unit;

/// Fee per unit voted by the `FEE_VOTES` blocks ending at `id`.
///
/// Every block weighs the same. A block that is missing, or that does not
/// vote a fee for a unit, votes for the unit's default fee.
pub fn voted_fees<C: ChainContext>(ctx: &C, id: NodeId) -> BTreeMap<Unit, u32> {
    let mut tallies: BTreeMap<Unit, WeightedTally<u32>> = Unit::ALL
        .into_iter()
        .map(|unit| (unit, WeightedTally::new()))
        .collect();

    let mut counted = 0u64;
    for ancestor in ctx.ancestors(id).take(FEE_VOTES) {
        let vote = &ctx.node(ancestor).vote;
        for (unit, tally) in tallies.iter_mut() {
            let fee = vote.fee_votes.get(unit).copied().unwrap_or(unit.default_fee());
            tally.add(fee, 1);
        }
        counted += 1;
    }

    let missing = FEE_VOTES as u64 - counted;
    tallies
        .into_iter()
        .map(|(unit, mut tally)| {
            if missing > 0 {
                tally.add(unit.default_fee(), missing);
            }
            let fee = tally
                .first_reaching(FEE_VOTES as u64 / 2)
                .unwrap_or(unit.default_fee());
            (unit, fee)
        })
        .collect()
}

/// Minimum fee per unit in force at `id`.
pub fn effective_fees<C: ChainContext>(ctx: &C, id: NodeId) -> BTreeMap<Unit, u32> {
    let effective = effective_vote_index(ctx, id);
    match ctx.results(effective) {
        Some(results) if !results.voted_fees.is_empty() => results.voted_fees.clone(),
        _ => Unit::ALL.into_iter().map(|u| (u, u.default_fee())).collect(),
    }
}

/// Minimum fee of `unit` at `id`.
pub fn min_fee<C: ChainContext>(ctx: &C, id: NodeId, unit: Unit) -> u32 {
    effective_fees(ctx, id)
        .get(&unit)
        .copied()
        .unwrap_or(unit.default_fee())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::LinearChain;
    use crate::vote::{CENT, COIN, VoteRecord};

    fn fee_vote(fee: u32) -> VoteRecord {
        VoteRecord {
            fee_votes: BTreeMap::from([(Unit::Credits, fee)]),
            ..VoteRecord::default()
        }
    }

    #[test]
    fn short_chain_keeps_defaults() {
        let mut chain = LinearChain::new();
        let mut tip = chain.push_pos(fee_vote(1));
        for _ in 0..10 {
            tip = chain.push_pos(fee_vote(1));
        }
        let fees = voted_fees(&chain, tip);
        assert_eq!(fees[&Unit::Credits], CENT as u32);
        assert_eq!(fees[&Unit::Shares], COIN as u32);
    }

    #[test]
    fn lower_fee_needs_half_the_window() {
        let mut chain = LinearChain::new();
        let mut tip = chain.push_pos(VoteRecord::default());
        for _ in 1..FEE_VOTES / 2 {
            tip = chain.push_pos(fee_vote(5));
        }
        // 999 votes for 5
        assert_eq!(voted_fees(&chain, tip)[&Unit::Credits], CENT as u32);

        tip = chain.push_pos(fee_vote(5));
        assert_eq!(voted_fees(&chain, tip)[&Unit::Credits], 5);
        assert_eq!(voted_fees(&chain, tip)[&Unit::Shares], COIN as u32);
    }

    #[test]
    fn proof_of_work_blocks_vote_defaults() {
        let mut chain = LinearChain::new();
        let mut tip = chain.push_pos(fee_vote(1000));
        for i in 0..FEE_VOTES {
            tip = if i % 2 == 0 {
                chain.push_pos(fee_vote(1000))
            } else {
                chain.push_pow()
            };
        }
        // 1000 PoS blocks vote 1000, 1000 PoW blocks vote CENT
        assert_eq!(voted_fees(&chain, tip)[&Unit::Credits], CENT as u32);
    }

    #[test]
    fn effective_fees_default_without_results() {
        let mut chain = LinearChain::new();
        let tip = chain.push_pos(VoteRecord::default());
        assert_eq!(min_fee(&chain, tip, Unit::Credits), CENT as u32);

        chain.results_mut(tip).voted_fees = BTreeMap::from([(Unit::Credits, 7), (Unit::Shares, 9)]);
        assert_eq!(min_fee(&chain, tip, Unit::Credits), 7);
    }
}
