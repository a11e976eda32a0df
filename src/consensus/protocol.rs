use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

use super::park_rate::percentage;
use super::{PROTOCOL_V2_0, PROTOCOL_V4_0, PROTOCOL_V5_0, PROTOCOL_VOTES};
use crate::blockchain::params::LegacySwitch;
use crate::blockchain::{ChainContext, ChainParams, NodeId};

const DAY: i64 = 24 * 60 * 60;

/// Hour of the day (UTC) at which upgrades take effect.
pub const SWITCH_HOUR: u32 = 14;

/// Days between a passing vote and the upgrade.
pub const ACTIVATION_DELAY_DAYS: i64 = 14;

/// Days scanned at the switch time, the passing block must sit in the last one.
const VOTE_WINDOW_DAYS: i64 = ACTIVATION_DELAY_DAYS + 1;

fn cutoff_of_day(time: i64) -> Option<DateTime<Utc>> {
    let datetime = DateTime::from_timestamp(time, 0)?;
    let cutoff = datetime.date_naive().and_hms_opt(SWITCH_HOUR, 0, 0)?;
    Some(cutoff.and_utc())
}

/// Most recent cutoff at or before `time`.
pub fn switch_time(time: i64) -> Option<i64> {
    let cutoff = cutoff_of_day(time)?.timestamp();
    Some(if cutoff > time { cutoff - DAY } else { cutoff })
}

/// First cutoff at or after `time`.
pub fn next_cutoff(time: i64) -> Option<i64> {
    let cutoff = cutoff_of_day(time)?.timestamp();
    Some(if cutoff < time { cutoff + DAY } else { cutoff })
}

/// Time at which an upgrade voted by a block at `pass_time` takes effect.
pub fn activation_time(pass_time: i64) -> Option<i64> {
    next_cutoff(pass_time.checked_add(ACTIVATION_DELAY_DAYS * DAY)?)
}

/// Block count and required votes of an upgrade to `version`.
///
/// # Panics
///
/// On a version without an upgrade vote.
pub fn switch_votes(version: u32) -> (usize, usize) {
    match version {
        PROTOCOL_V4_0 => (PROTOCOL_VOTES, 1800),
        PROTOCOL_V5_0 => (PROTOCOL_VOTES, 1800),
        _ => panic!("no upgrade vote defined for protocol {version}"),
    }
}

fn vote_passed<C: ChainContext>(ctx: &C, candidate: NodeId, version: u32) -> bool {
    let (count, required) = switch_votes(version);
    ctx.ancestors(candidate)
        .take(count)
        .filter(|id| ctx.node(*id).vote.version_vote >= version)
        .count()
        >= required
}

/// Whether any block from `from` back, stamped in the day ending
/// `ACTIVATION_DELAY_DAYS` before `switch`, passed the vote for `version`.
fn passed_before_switch<C: ChainContext>(ctx: &C, from: NodeId, switch: i64, version: u32) -> bool {
    let min_time = switch - VOTE_WINDOW_DAYS * DAY;
    let max_time = switch - ACTIVATION_DELAY_DAYS * DAY;
    ctx.ancestors(from)
        .take_while(|id| ctx.node(*id).time > min_time)
        .filter(|id| ctx.node(*id).time <= max_time)
        .any(|candidate| vote_passed(ctx, candidate, version))
}

/// Whether the block after `prev` must run `version`.
///
/// Only evaluated on the first block past a cutoff.
pub fn must_upgrade<C: ChainContext>(ctx: &C, prev: NodeId, version: u32) -> bool {
    switch_votes(version);

    let Some(parent) = ctx.parent(prev) else {
        return false;
    };
    let prev_time = ctx.node(prev).time;
    let Some(switch) = switch_time(prev_time) else {
        return false;
    };
    if ctx.node(parent).time >= switch {
        return false;
    }
    passed_before_switch(ctx, prev, switch, version)
}

/// Pre-2.0 rule: after the switch time, enough recent blocks voting for
/// 2.0 activate it for the next block.
fn legacy_switch_passed<C: ChainContext>(ctx: &C, prev: NodeId, switch: &LegacySwitch) -> bool {
    if ctx.node(prev).time < switch.time {
        return false;
    }
    ctx.ancestors(prev)
        .take(switch.to_check)
        .filter(|id| ctx.node(*id).vote.version_vote >= PROTOCOL_V2_0)
        .count()
        >= switch.required
}

/// Protocol version of the block after `prev`.
pub fn next_protocol<C: ChainContext>(ctx: &C, params: &ChainParams, prev: Option<NodeId>) -> u32 {
    let Some(prev) = prev else {
        return params.initial_protocol;
    };
    let current = ctx
        .results(prev)
        .map(|results| results.protocol_version)
        .unwrap_or(params.initial_protocol);

    let next = if current < PROTOCOL_V2_0 {
        match &params.legacy_v2_switch {
            Some(switch) if legacy_switch_passed(ctx, prev, switch) => PROTOCOL_V2_0,
            _ => current,
        }
    } else if current < PROTOCOL_V4_0 {
        if must_upgrade(ctx, prev, PROTOCOL_V4_0) { PROTOCOL_V4_0 } else { current }
    } else if current < PROTOCOL_V5_0 {
        if must_upgrade(ctx, prev, PROTOCOL_V5_0) { PROTOCOL_V5_0 } else { current }
    } else {
        current
    };

    if next != current {
        info!(
            "PROTOCOL - switching from {} to {} after block at {}",
            format_protocol_version(current),
            format_protocol_version(next),
            ctx.node(prev).time
        );
    }
    next
}

/// Cutoff at which an upgrade to `version` would happen if the next block
/// were built on `tip`, looking `VOTE_WINDOW_DAYS` cutoffs ahead.
pub fn scheduled_switch_time<C: ChainContext>(ctx: &C, tip: NodeId, version: u32) -> Option<i64> {
    let first = next_cutoff(ctx.node(tip).time.checked_add(1)?)?;
    (0..VOTE_WINDOW_DAYS)
        .map(|day| first + day * DAY)
        .find(|switch| passed_before_switch(ctx, tip, *switch, version))
}

pub fn format_protocol_version(version: u32) -> String {
    format!(
        "{}.{}.{}",
        version / 1_000_000,
        (version / 10_000) % 100,
        (version / 100) % 100
    )
}

pub fn format_time(time: i64) -> String {
    DateTime::from_timestamp(time, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProtocolVotes {
    pub blocks: usize,
    pub block_percentage: f64,
    pub switch_to_date_time: String,
}

/// Version votes of the `quantity` blocks ending at `id`, keyed by version.
pub fn protocol_vote_report<C: ChainContext>(
    ctx: &C,
    id: NodeId,
    quantity: usize,
) -> BTreeMap<String, ProtocolVotes> {
    let mut blocks: BTreeMap<u32, usize> = BTreeMap::new();
    let mut scanned = 0usize;
    for ancestor in ctx.ancestors(id).take(quantity) {
        *blocks.entry(ctx.node(ancestor).vote.version_vote).or_insert(0) += 1;
        scanned += 1;
    }

    blocks
        .into_iter()
        .map(|(version, count)| {
            let switch_to_date_time = match version {
                PROTOCOL_V4_0 | PROTOCOL_V5_0 => scheduled_switch_time(ctx, id, version)
                    .map(format_time)
                    .unwrap_or_default(),
                _ => String::new(),
            };
            (
                format_protocol_version(version),
                ProtocolVotes {
                    blocks: count,
                    block_percentage: percentage(count as u64, scanned as u64),
                    switch_to_date_time,
                },
            )
        })
        .collect()
}
