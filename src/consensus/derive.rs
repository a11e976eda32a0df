use log::debug;

use super::asset::{VotedAssets, voted_assets};
use super::custodian::{currency_coinbases, elect_custodians};
use super::fee::voted_fees;
use super::park_rate::park_rate_results;
use super::protocol::{format_protocol_version, next_protocol};
use super::signer_reward::{signer_reward, signer_reward_vote_result};
use super::{CUSTODIAN_VOTES, collect_votes};
use crate::blockchain::{ChainContext, ChainParams, NodeId, NodeResults};
use crate::vote::{Destination, Unit, VoteError};

/// Compute every cached result of node `id` from its ancestors.
///
/// Each ancestor must already carry its results. `is_elected` tells whether
/// a custodian was elected by an ancestor. The node's own vote is validated
/// against the protocol version it runs.
pub fn derive_results<C, F>(
    ctx: &C,
    params: &ChainParams,
    id: NodeId,
    is_elected: F,
) -> Result<NodeResults, VoteError>
where
    C: ChainContext,
    F: Fn(Unit, &Destination) -> bool,
{
    let node = ctx.node(id);
    let parent = ctx.parent(id);

    let protocol_version = next_protocol(ctx, params, parent);
    node.vote.validate_in_block(protocol_version)?;

    let park_rate_results = if node.proof_of_stake {
        park_rate_results(ctx, id, protocol_version)
    } else {
        parent
            .and_then(|p| ctx.results(p))
            .map(|r| r.park_rate_results.clone())
            .unwrap_or_default()
    };

    let voted_fees = voted_fees(ctx, id);
    let signer_reward_result = signer_reward_vote_result(ctx, id, protocol_version);
    let VotedAssets {
        assets,
        assets_prev,
    } = voted_assets(ctx, id);

    let elected_custodians = if node.proof_of_stake {
        let votes = collect_votes(ctx, id, CUSTODIAN_VOTES);
        elect_custodians(&votes, is_elected)
    } else {
        Vec::new()
    };
    let currency_coinbases = currency_coinbases(&elected_custodians);

    let rewarded_signer = signer_reward(ctx, id, protocol_version).destination;

    debug!(
        "DERIVE - height {} protocol {}: {} custodians elected, {} assets changed",
        node.height,
        format_protocol_version(protocol_version),
        elected_custodians.len(),
        assets.len()
    );

    Ok(NodeResults {
        protocol_version,
        park_rate_results,
        voted_fees,
        signer_reward_result,
        rewarded_signer,
        assets,
        assets_prev,
        elected_custodians,
        currency_coinbases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::testing::LinearChain;
    use crate::consensus::{PROTOCOL_V2_0, PROTOCOL_V4_0};
    use crate::vote::{CustodianVote, Hash160, ParkRate, ParkRateVote, ReputationVote, VoteRecord};
    use std::collections::BTreeSet;

    fn params(initial_protocol: u32) -> ChainParams {
        ChainParams {
            initial_protocol,
            legacy_v2_switch: None,
            ..ChainParams::mainnet()
        }
    }

    fn custodian(n: u64) -> CustodianVote {
        CustodianVote {
            unit: Unit::Credits,
            destination: Destination::KeyHash(Hash160::from_low_u64(n)),
            amount: 1000,
        }
    }

    /// Derive and store results for every pushed node, like the chain does.
    fn derive_all(chain: &mut LinearChain, params: &ChainParams, votes: Vec<VoteRecord>) -> Vec<NodeId> {
        let mut elected: BTreeSet<(Unit, Destination)> = BTreeSet::new();
        let mut ids = Vec::new();
        for vote in votes {
            let id = chain.push_pos(vote);
            let results = derive_results(&*chain, params, id, |unit, d| elected.contains(&(unit, *d)))
                .expect("valid vote");
            for custodian_vote in &results.elected_custodians {
                elected.insert((custodian_vote.unit, custodian_vote.destination));
            }
            *chain.results_mut(id) = results;
            ids.push(id);
        }
        ids
    }

    #[test]
    fn custodian_elected_once() {
        let mut chain = LinearChain::new();
        let vote = VoteRecord {
            custodian_votes: vec![custodian(1)],
            coin_age_destroyed: 10,
            ..VoteRecord::default()
        };
        let ids = derive_all(&mut chain, &params(PROTOCOL_V2_0), vec![vote; 4]);

        let first = chain.results(ids[0]).expect("derived");
        assert_eq!(first.elected_custodians, vec![custodian(1)]);
        assert_eq!(first.currency_coinbases.len(), 1);
        assert_eq!(first.currency_coinbases[0].total_output_amount(), 1000);
        for id in &ids[1..] {
            let results = chain.results(*id).expect("derived");
            assert!(results.elected_custodians.is_empty());
            assert!(results.currency_coinbases.is_empty());
        }
    }

    #[test]
    fn proof_of_work_carries_park_rates() {
        let mut chain = LinearChain::new();
        let vote = VoteRecord {
            park_rate_votes: vec![ParkRateVote::new(Unit::Credits, vec![ParkRate::new(10, 1)])],
            coin_age_destroyed: 10,
            ..VoteRecord::default()
        };
        let params = params(PROTOCOL_V2_0);
        let ids = derive_all(&mut chain, &params, vec![vote]);
        let expected = chain.results(ids[0]).expect("derived").park_rate_results.clone();
        assert_eq!(expected[0].rates, vec![ParkRate::new(10, 1)]);

        let pow = chain.push_pow();
        let results = derive_results(&chain, &params, pow, |_, _| false).expect("null vote");
        assert_eq!(results.park_rate_results, expected);
        assert!(results.elected_custodians.is_empty());
    }

    #[test]
    fn vote_checked_against_running_protocol() {
        let reputation = VoteRecord {
            reputation_votes: vec![ReputationVote {
                destination: Destination::KeyHash(Hash160::from_low_u64(1)),
                weight: 1,
            }],
            ..VoteRecord::default()
        };

        let mut chain = LinearChain::new();
        let id = chain.push_pos(reputation.clone());
        let result = derive_results(&chain, &params(PROTOCOL_V2_0), id, |_, _| false);
        assert_eq!(result, Err(VoteError::ReputationVotesNotActive));

        let mut chain = LinearChain::new();
        let id = chain.push_pos(reputation);
        let results = derive_results(&chain, &params(PROTOCOL_V4_0), id, |_, _| false).expect("valid");
        assert_eq!(results.protocol_version, PROTOCOL_V4_0);
        assert!(results.rewarded_signer.is_none());
    }
}
