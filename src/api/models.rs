use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::blockchain::{Chain, ChainParams, Connected, NodeId};
use crate::consensus::signer_reward::SignerRewardResult;
use crate::vote::{Destination, Unit};

/// Shared application state with the in-memory chain.
pub struct AppState {
    pub chain: Mutex<Chain>,
}

impl AppState {
    pub fn new(params: ChainParams) -> Self {
        Self {
            chain: Mutex::new(Chain::new(params)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ChainParams::mainnet())
    }
}

/* ---------- Query Parameters ---------- */

/// Selects a best-chain block; the tip when absent.
#[derive(Deserialize)]
pub struct HeightQuery {
    pub height: Option<u64>,
}

/// A window of `quantity` blocks ending at `height`.
#[derive(Deserialize)]
pub struct WindowQuery {
    pub height: Option<u64>,
    pub quantity: Option<usize>,
}

#[derive(Deserialize)]
pub struct PremiumQuery {
    pub amount: i64,
    pub duration: i64,
    pub unit: String,
}

/// Resolve a requested height against the best chain.
pub fn node_at(chain: &Chain, height: Option<u64>) -> Result<NodeId, HttpResponse> {
    match height {
        None => Ok(chain.tip()),
        Some(h) => chain
            .node_at_height(h)
            .ok_or_else(|| HttpResponse::BadRequest().body("block height out of range")),
    }
}

/// Resolve the end block and the size of a report window.
pub fn window_at(
    chain: &Chain,
    query: &WindowQuery,
    default_quantity: usize,
) -> Result<(NodeId, usize), HttpResponse> {
    let id = node_at(chain, query.height)?;
    match query.quantity {
        Some(0) => Err(HttpResponse::BadRequest().body("quantity must be > 0")),
        Some(quantity) => Ok((id, quantity)),
        None => Ok((id, default_quantity)),
    }
}

pub fn parse_unit(symbol: &str) -> Result<Unit, HttpResponse> {
    let mut chars = symbol.chars();
    match (chars.next().and_then(Unit::from_symbol), chars.next()) {
        (Some(unit), None) => Ok(unit),
        _ => Err(HttpResponse::BadRequest().body("invalid unit")),
    }
}

pub fn parse_currency(symbol: &str) -> Result<Unit, HttpResponse> {
    let unit = parse_unit(symbol)?;
    if !unit.is_currency() {
        return Err(HttpResponse::BadRequest().body("unit is not a currency"));
    }
    Ok(unit)
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub network: String,
    pub height: u64,
    pub tip_hash: String,
    pub tip_time: i64,
    pub protocol_version: u32,
    pub protocol: String,
    pub blocks_known: usize,
}

#[derive(Deserialize)]
pub struct NewBlockRequest {
    pub previous_hash: String,
    /// Defaults to the current time.
    pub time: Option<i64>,
    pub proof_of_stake: bool,
    #[serde(default)]
    pub coin_age: u64,
    pub vote: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct NewBlockResponse {
    pub hash: String,
    pub height: u64,
    pub connected: Connected,
}

/* ---------- Vote API Models ---------- */

#[derive(Serialize)]
pub struct ParkRateEntry {
    pub duration: String,
    pub blocks: i64,
    pub rate: f64,
}

#[derive(Serialize)]
pub struct PremiumResponse {
    pub unit: Unit,
    pub amount: i64,
    pub duration: i64,
    pub premium: i64,
}

#[derive(Serialize)]
pub struct SignerRewardResponse {
    pub height: u64,
    #[serde(flatten)]
    pub result: SignerRewardResult,
}

#[derive(Serialize)]
pub struct NextSignerRewardResponse {
    pub destination: Option<Destination>,
    pub amount: i64,
}
