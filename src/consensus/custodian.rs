use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

use super::park_rate::percentage;
use crate::blockchain::{ChainContext, NodeId};
use crate::transaction::{Transaction, TxOutput};
use crate::vote::{CustodianVote, Destination, Unit, VoteRecord};

#[derive(Debug, Default, Clone, Copy)]
struct Counter {
    weight: u64,
    count: usize,
}

/// Custodians newly elected by `votes`.
///
/// A proposal wins with more than half of the total weight and more than
/// half of the votes. A destination keeps only its heaviest winning amount
/// per unit, and destinations for which `already_elected` holds are skipped.
pub fn elect_custodians<F>(votes: &[&VoteRecord], already_elected: F) -> Vec<CustodianVote>
where
    F: Fn(Unit, &Destination) -> bool,
{
    if votes.is_empty() {
        return Vec::new();
    }

    let mut counters: BTreeMap<&CustodianVote, Counter> = BTreeMap::new();
    let mut total_weight = 0u64;
    for vote in votes {
        total_weight += vote.coin_age_destroyed;
        for custodian_vote in &vote.custodian_votes {
            let counter = counters.entry(custodian_vote).or_default();
            counter.weight += vote.coin_age_destroyed;
            counter.count += 1;
        }
    }

    let half_weight = total_weight / 2;
    let half_count = votes.len() / 2;

    let mut granted: BTreeMap<(Unit, Destination), (u64, &CustodianVote)> = BTreeMap::new();
    for (custodian_vote, counter) in &counters {
        if counter.weight <= half_weight || counter.count <= half_count {
            continue;
        }
        let key = (custodian_vote.unit, custodian_vote.destination);
        let heavier = granted
            .get(&key)
            .is_none_or(|(weight, _)| counter.weight > *weight);
        if heavier {
            granted.insert(key, (counter.weight, *custodian_vote));
        }
    }

    granted
        .into_iter()
        .filter(|((unit, destination), _)| !already_elected(*unit, destination))
        .map(|(_, (_, custodian_vote))| custodian_vote.clone())
        .inspect(|c| debug!("CUSTODIAN - elected {} for {} {}", c.destination, c.amount, c.unit))
        .collect()
}

/// One currency coinbase per unit paying every newly elected custodian.
pub fn currency_coinbases(elected: &[CustodianVote]) -> Vec<Transaction> {
    let mut per_unit: BTreeMap<Unit, Vec<TxOutput>> = BTreeMap::new();
    for custodian_vote in elected {
        per_unit.entry(custodian_vote.unit).or_default().push(TxOutput {
            destination: custodian_vote.destination,
            amount: custodian_vote.amount,
        });
    }
    per_unit
        .into_iter()
        .filter(|(_, outputs)| !outputs.is_empty())
        .map(|(unit, outputs)| Transaction::currency_coinbase(unit, outputs))
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct VoteShare {
    pub blocks: usize,
    pub block_percentage: f64,
    pub sharedays: u64,
    pub shareday_percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustodianVoteEntry {
    pub unit: Unit,
    pub destination: Destination,
    pub amount: i64,
    #[serde(flatten)]
    pub share: VoteShare,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct VoteTotal {
    pub blocks: usize,
    pub sharedays: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustodianVoteReport {
    pub custodians: Vec<CustodianVoteEntry>,
    pub total: VoteTotal,
}

/// Support of every custodian proposal among the proof-of-stake blocks of
/// the `quantity` blocks ending at `id`.
pub fn custodian_vote_report<C: ChainContext>(
    ctx: &C,
    id: NodeId,
    quantity: usize,
) -> CustodianVoteReport {
    let mut tally: BTreeMap<(Unit, Destination, i64), VoteTotal> = BTreeMap::new();
    let mut total = VoteTotal::default();

    let pos_nodes = ctx
        .ancestors(id)
        .take(quantity)
        .map(|n| ctx.node(n))
        .filter(|node| node.proof_of_stake);
    for node in pos_nodes {
        let vote = &node.vote;
        for custodian_vote in &vote.custodian_votes {
            let key = (custodian_vote.unit, custodian_vote.destination, custodian_vote.amount);
            let entry = tally.entry(key).or_default();
            entry.blocks += 1;
            entry.sharedays += vote.coin_age_destroyed;
        }
        total.blocks += 1;
        total.sharedays += vote.coin_age_destroyed;
    }

    let custodians = tally
        .into_iter()
        .map(|((unit, destination, amount), counted)| CustodianVoteEntry {
            unit,
            destination,
            amount,
            share: VoteShare {
                blocks: counted.blocks,
                block_percentage: percentage(counted.blocks as u64, total.blocks as u64),
                sharedays: counted.sharedays,
                shareday_percentage: percentage(counted.sharedays, total.sharedays),
            },
        })
        .collect();

    CustodianVoteReport { custodians, total }
}
