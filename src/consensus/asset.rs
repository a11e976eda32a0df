use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::exp_series::{convert_exp_parameter, exp_series_value};
use super::{ASSET_VOTES, WeightedTally, effective_vote_index};
use crate::blockchain::{ChainContext, NodeId};
use crate::vote::{AssetVote, VoteRecord, asset_id};

/// Consensus parameters of an external asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: u32,
    pub confirmations: u16,
    pub required_signers: u8,
    pub total_signers: u8,
    pub max_trade: u8,
    pub min_trade: u8,
    pub unit_exponent: u8,
}

impl Asset {
    /// Largest trade, in the asset's smallest unit.
    pub fn max_trade_amount(&self) -> i64 {
        exp_series_value(self.max_trade)
    }

    pub fn min_trade_amount(&self) -> i64 {
        exp_series_value(self.min_trade)
    }

    /// Whether `vote` asks for exactly these parameters.
    pub fn is_voted_by(&self, vote: &AssetVote) -> bool {
        self.asset_id == vote.asset_id
            && self.confirmations == vote.confirmations
            && self.required_signers == vote.required_signers
            && self.total_signers == vote.total_signers
            && self.max_trade == vote.max_trade
            && self.min_trade == vote.min_trade
            && self.unit_exponent == vote.unit_exponent
    }
}

/// Assets changed by one node, and for every other known asset the most
/// recent ancestor that changed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VotedAssets {
    pub assets: BTreeMap<u32, Asset>,
    pub assets_prev: BTreeMap<u32, NodeId>,
}

#[derive(Default)]
struct AssetTallies {
    confirmations: WeightedTally<u16>,
    required_signers: WeightedTally<u8>,
    total_signers: WeightedTally<u8>,
    max_trade: WeightedTally<u8>,
    min_trade: WeightedTally<u8>,
}

/// Asset parameters voted by `votes`, the window of `ASSET_VOTES` blocks.
///
/// `current` gives the existing value of an asset. An existing asset is
/// always recomputed and blocks that do not vote on it vote for its current
/// value. A new asset needs votes from more than half of the window and an
/// absolute majority on its unit exponent, which never changes afterwards.
pub fn extract_asset_vote_result<F>(votes: &[&VoteRecord], current: F) -> Vec<Asset>
where
    F: Fn(u32) -> Option<Asset>,
{
    let half = ASSET_VOTES / 2;

    let mut votes_by_id: BTreeMap<u32, Vec<&AssetVote>> = BTreeMap::new();
    for asset_vote in votes.iter().flat_map(|v| v.asset_votes.iter()) {
        votes_by_id.entry(asset_vote.asset_id).or_default().push(asset_vote);
    }

    let mut assets = Vec::new();
    for (id, asset_votes) in votes_by_id {
        let existing = current(id);
        if existing.is_none() && asset_votes.len() <= half {
            continue;
        }

        let unit_exponent = match existing {
            Some(asset) => asset.unit_exponent,
            None => {
                let exponents: WeightedTally<u8> =
                    asset_votes.iter().map(|v| (v.unit_exponent, 1)).collect();
                let mut winner = (0u8, 0u64);
                for (exponent, count) in exponents.iter() {
                    // ties go to the highest exponent
                    if *count >= winner.1 {
                        winner = (*exponent, *count);
                    }
                }
                if winner.1 <= half as u64 {
                    continue;
                }
                winner.0
            }
        };

        let mut tallies = AssetTallies::default();
        for vote in &asset_votes {
            tallies.confirmations.add(vote.confirmations, 1);
            tallies.required_signers.add(vote.required_signers, 1);
            tallies.total_signers.add(vote.total_signers, 1);
            tallies
                .max_trade
                .add(convert_exp_parameter(vote.max_trade, vote.unit_exponent, unit_exponent), 1);
            tallies
                .min_trade
                .add(convert_exp_parameter(vote.min_trade, vote.unit_exponent, unit_exponent), 1);
        }

        let default_votes = ASSET_VOTES.saturating_sub(asset_votes.len()) as u64;
        let total_votes = match existing {
            Some(asset) => {
                if default_votes > 0 {
                    tallies.confirmations.add(asset.confirmations, default_votes);
                    tallies.required_signers.add(asset.required_signers, default_votes);
                    tallies.total_signers.add(asset.total_signers, default_votes);
                    tallies.max_trade.add(asset.max_trade, default_votes);
                    tallies.min_trade.add(asset.min_trade, default_votes);
                }
                ASSET_VOTES as u64
            }
            None => {
                // trade sizes always count the whole window
                if default_votes > 0 {
                    tallies.max_trade.add(0, default_votes);
                    tallies.min_trade.add(0, default_votes);
                }
                asset_votes.len() as u64
            }
        };

        let window_half = ASSET_VOTES as u64 / 2;
        assets.push(Asset {
            asset_id: id,
            confirmations: tallies.confirmations.first_above(total_votes / 2).unwrap_or_default(),
            required_signers: tallies.required_signers.first_above(total_votes / 2).unwrap_or_default(),
            total_signers: tallies.total_signers.first_above(total_votes / 2).unwrap_or_default(),
            max_trade: tallies.max_trade.first_above(window_half).unwrap_or_default(),
            min_trade: tallies.min_trade.first_above(window_half).unwrap_or_default(),
            unit_exponent,
        });
    }
    assets
}

fn lookup<C: ChainContext>(
    ctx: &C,
    assets: &BTreeMap<u32, Asset>,
    assets_prev: &BTreeMap<u32, NodeId>,
    id: u32,
) -> Option<Asset> {
    if let Some(asset) = assets.get(&id) {
        return Some(*asset);
    }
    let changed_at = assets_prev.get(&id)?;
    ctx.results(*changed_at)?.assets.get(&id).copied()
}

/// Latest voted value of an asset as seen from `node`.
pub fn voted_asset<C: ChainContext>(ctx: &C, node: NodeId, id: u32) -> Option<Asset> {
    let results = ctx.results(node)?;
    lookup(ctx, &results.assets, &results.assets_prev, id)
}

/// Every asset voted into existence as of `node`.
pub fn voted_asset_table<C: ChainContext>(ctx: &C, node: NodeId) -> BTreeMap<u32, Asset> {
    let Some(results) = ctx.results(node) else {
        return BTreeMap::new();
    };
    results
        .assets_prev
        .keys()
        .chain(results.assets.keys())
        .filter_map(|id| lookup(ctx, &results.assets, &results.assets_prev, *id).map(|a| (*id, a)))
        .collect()
}

/// Asset changes voted at `id`.
pub fn voted_assets<C: ChainContext>(ctx: &C, id: NodeId) -> VotedAssets {
    let mut assets_prev = BTreeMap::new();
    if let Some(parent) = ctx.parent(id) {
        if let Some(parent_results) = ctx.results(parent) {
            assets_prev = parent_results.assets_prev.clone();
            for id in parent_results.assets.keys() {
                assets_prev.insert(*id, parent);
            }
        }
    }

    let votes: Vec<&VoteRecord> = ctx
        .ancestors(id)
        .take(ASSET_VOTES)
        .map(|ancestor| &ctx.node(ancestor).vote)
        .collect();

    let no_changes = BTreeMap::new();
    let current = |id| lookup(ctx, &no_changes, &assets_prev, id);

    let mut assets = BTreeMap::new();
    for asset in extract_asset_vote_result(&votes, &current) {
        if current(asset.asset_id) != Some(asset) {
            info!(
                "ASSET - {} voted: {} confirmations, {}-of-{} signers",
                asset_id::to_display(asset.asset_id),
                asset.confirmations,
                asset.required_signers,
                asset.total_signers
            );
            assets.insert(asset.asset_id, asset);
        }
    }

    VotedAssets {
        assets,
        assets_prev,
    }
}

/// Assets in force at `id`.
pub fn effective_assets<C: ChainContext>(ctx: &C, id: NodeId) -> BTreeMap<u32, Asset> {
    voted_asset_table(ctx, effective_vote_index(ctx, id))
}

pub fn effective_asset<C: ChainContext>(ctx: &C, id: NodeId, asset_id: u32) -> Option<Asset> {
    voted_asset(ctx, effective_vote_index(ctx, id), asset_id)
}

/// Asset as reported to clients, trade sizes in whole asset units.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssetInfo {
    pub asset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub confirmations: u16,
    pub required_signers: u8,
    pub total_signers: u8,
    pub max_trade: f64,
    pub min_trade: f64,
    pub unit_exponent: u8,
}

impl AssetInfo {
    pub fn new(asset: &Asset, with_metadata: bool) -> Self {
        let metadata = with_metadata
            .then(|| asset_id::metadata(asset.asset_id))
            .flatten();
        let scale = 10f64.powi(i32::from(asset.unit_exponent));
        AssetInfo {
            asset_id: asset_id::to_display(asset.asset_id),
            name: metadata.map(|m| m.name.to_string()),
            symbol: metadata.map(|m| m.symbol.to_string()),
            confirmations: asset.confirmations,
            required_signers: asset.required_signers,
            total_signers: asset.total_signers,
            max_trade: asset.max_trade_amount() as f64 / scale,
            min_trade: asset.min_trade_amount() as f64 / scale,
            unit_exponent: asset.unit_exponent,
        }
    }
}
