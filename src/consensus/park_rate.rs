use serde::Serialize;
use std::collections::BTreeMap;

use super::{
    BLOCKS_PER_YEAR, PARK_RATE_PREVIOUS_VOTES, PARK_RATE_VOTES, PROTOCOL_V2_0, WeightedTally,
    collect_votes, effective_vote_index,
};
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::{CENT, PARK_RATE_SCALE, ParkRate, ParkRateVote, Unit, VoteRecord, model};

/// Rate unit of one percent.
const ENCODED_PERCENTAGE: i64 = PARK_RATE_SCALE / CENT;

/// Weighted median park-rate curve of each currency unit.
///
/// A vote that leaves a duration out abstains for it, which counts as a
/// vote for rate 0. Durations whose median is 0 are not offered.
pub fn calculate_park_rate_vote(votes: &[&VoteRecord]) -> Vec<ParkRateVote> {
    if votes.is_empty() {
        return Vec::new();
    }

    let total_weight: u64 = votes.iter().map(|v| v.coin_age_destroyed).sum();

    Unit::ALL
        .into_iter()
        .filter(|unit| unit.is_currency())
        .map(|unit| {
            let mut tallies: BTreeMap<u8, WeightedTally<i64>> = BTreeMap::new();
            for vote in votes {
                let curves = vote.park_rate_votes.iter().filter(|v| v.unit == unit);
                for park_rate in curves.flat_map(|v| v.rates.iter()) {
                    tallies
                        .entry(park_rate.compact_duration)
                        .or_default()
                        .add(park_rate.rate, vote.coin_age_destroyed);
                }
            }

            let rates = tallies
                .into_iter()
                .filter_map(|(compact_duration, mut tally)| {
                    let abstained = total_weight - tally.total();
                    tally.add(0, abstained);
                    match tally.median() {
                        Some(rate) if rate != 0 => Some(ParkRate::new(compact_duration, rate)),
                        _ => None,
                    }
                })
                .collect();

            ParkRateVote::new(unit, rates)
        })
        .collect()
}

fn max_change(per_mille_of_percent: i64, compact_duration: u8) -> i64 {
    let duration = model::compact_to_duration(compact_duration);
    ENCODED_PERCENTAGE * per_mille_of_percent / 1000 * duration / BLOCKS_PER_YEAR
}

/// Rate limiter used before protocol 2.0: a rate may rise at most 1% per
/// year of duration above the lowest rate of the previous results.
/// Decreases are not limited.
pub fn limit_change_v0_5(results: &mut [ParkRateVote], previous: &[&[ParkRateVote]]) {
    for result in results.iter_mut() {
        let mut min_previous: BTreeMap<u8, i64> = BTreeMap::new();
        let previous_curves = previous
            .iter()
            .flat_map(|curves| curves.iter())
            .filter(|curve| curve.unit == result.unit);
        for park_rate in previous_curves.flat_map(|curve| curve.rates.iter()) {
            min_previous
                .entry(park_rate.compact_duration)
                .and_modify(|min| *min = (*min).min(park_rate.rate))
                .or_insert(park_rate.rate);
        }

        for park_rate in &mut result.rates {
            let floor = min_previous
                .get(&park_rate.compact_duration)
                .copied()
                .unwrap_or(0);
            let ceiling = floor + max_change(1000, park_rate.compact_duration);
            if park_rate.rate > ceiling {
                park_rate.rate = ceiling;
            }
        }
    }
}

/// Rate limiter from protocol 2.0: against the parent's result a rate may
/// rise 0.002% and fall 0.004% per year of duration. A duration dropped by
/// the vote decays from its previous rate instead of vanishing.
pub fn limit_change_v2_0(results: &mut [ParkRateVote], previous: &[ParkRateVote]) {
    for result in results.iter_mut() {
        let previous_rates: BTreeMap<u8, i64> = previous
            .iter()
            .filter(|curve| curve.unit == result.unit)
            .flat_map(|curve| curve.rates.iter())
            .map(|r| (r.compact_duration, r.rate))
            .collect();

        let voted: BTreeMap<u8, i64> = result
            .rates
            .iter()
            .map(|r| (r.compact_duration, r.rate))
            .collect();

        let mut durations: Vec<u8> = previous_rates.keys().chain(voted.keys()).copied().collect();
        durations.sort_unstable();
        durations.dedup();

        let mut limited = Vec::with_capacity(durations.len());
        for compact_duration in durations {
            let previous_rate = previous_rates.get(&compact_duration).copied().unwrap_or(0);
            let voted_rate = voted.get(&compact_duration).copied();
            let max_increase = max_change(2, compact_duration);
            let max_decrease = max_change(4, compact_duration);

            let rate = match voted_rate {
                Some(rate) if rate > previous_rate + max_increase => previous_rate + max_increase,
                Some(rate) if rate < previous_rate - max_decrease => previous_rate - max_decrease,
                Some(rate) => rate,
                None if previous_rate - max_decrease > 0 => previous_rate - max_decrease,
                None => continue,
            };
            limited.push(ParkRate::new(compact_duration, rate));
        }
        result.rates = limited;
    }
}

/// Park-rate result of the proof-of-stake node `id` running `protocol_version`.
pub fn park_rate_results<C: ChainContext>(
    ctx: &C,
    id: NodeId,
    protocol_version: u32,
) -> Vec<ParkRateVote> {
    let votes = collect_votes(ctx, id, PARK_RATE_VOTES);
    let mut results = calculate_park_rate_vote(&votes);

    let parent = ctx.parent(id);
    if protocol_version >= PROTOCOL_V2_0 {
        let previous = parent
            .and_then(|p| ctx.results(p))
            .map(|r| r.park_rate_results.as_slice())
            .unwrap_or(&[]);
        limit_change_v2_0(&mut results, previous);
    } else {
        let previous: Vec<&[ParkRateVote]> = parent
            .into_iter()
            .flat_map(|p| ctx.ancestors(p))
            .take(PARK_RATE_PREVIOUS_VOTES)
            .filter_map(|ancestor| ctx.results(ancestor))
            .map(|r| r.park_rate_results.as_slice())
            .collect();
        limit_change_v0_5(&mut results, &previous);
    }
    results
}

/// Park rates in force at `id`.
pub fn effective_park_rates<C: ChainContext>(ctx: &C, id: NodeId) -> Vec<ParkRateVote> {
    let effective = effective_vote_index(ctx, id);
    ctx.results(effective)
        .map(|r| r.park_rate_results.clone())
        .unwrap_or_default()
}

/// Annual interest percentage of `rate` over `blocks`.
pub fn annual_percentage(rate: i64, blocks: i64) -> f64 {
    rate as f64 / PARK_RATE_SCALE as f64 * BLOCKS_PER_YEAR as f64 / blocks as f64 * 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RateVoteDetail {
    pub rate: i64,
    pub annual_percentage: f64,
    pub sharedays: f64,
    pub shareday_percentage: f64,
    pub accumulated_percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DurationVotes {
    pub blocks: i64,
    pub votes: Vec<RateVoteDetail>,
}

/// Park-rate vote summary of the proof-of-stake blocks among the
/// `quantity` blocks ending at `id`, abstentions included as rate 0.
pub fn park_vote_report<C: ChainContext>(
    ctx: &C,
    id: NodeId,
    quantity: usize,
) -> BTreeMap<Unit, BTreeMap<u8, DurationVotes>> {
    let votes: Vec<&VoteRecord> = ctx
        .ancestors(id)
        .take(quantity)
        .map(|n| ctx.node(n))
        .filter(|node| node.proof_of_stake)
        .map(|node| &node.vote)
        .collect();
    let total_weight: u64 = votes.iter().map(|v| v.coin_age_destroyed).sum();

    let mut report = BTreeMap::new();
    for unit in Unit::ALL.into_iter().filter(|u| u.is_currency()) {
        let mut tallies: BTreeMap<u8, WeightedTally<i64>> = BTreeMap::new();
        for vote in &votes {
            for curve in vote.park_rate_votes.iter().filter(|c| c.unit == unit) {
                for park_rate in &curve.rates {
                    tallies
                        .entry(park_rate.compact_duration)
                        .or_default()
                        .add(park_rate.rate, vote.coin_age_destroyed);
                }
            }
        }

        let durations = tallies
            .into_iter()
            .map(|(compact_duration, mut tally)| {
                let abstained = total_weight - tally.total();
                if abstained > 0 {
                    tally.add(0, abstained);
                }
                let blocks = model::compact_to_duration(compact_duration);
                let mut accumulated = 0u64;
                let details = tally
                    .iter()
                    .map(|(rate, weight)| {
                        accumulated += weight;
                        RateVoteDetail {
                            rate: *rate,
                            annual_percentage: annual_percentage(*rate, blocks),
                            sharedays: *weight as f64 / (24.0 * 60.0 * 60.0),
                            shareday_percentage: percentage(*weight, total_weight),
                            accumulated_percentage: percentage(accumulated, total_weight),
                        }
                    })
                    .collect();
                (
                    compact_duration,
                    DurationVotes {
                        blocks,
                        votes: details,
                    },
                )
            })
            .collect();
        report.insert(unit, durations);
    }
    report
}

pub(crate) fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
