use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::Utc;
use log::{debug, warn};

use super::models::{
    AppState, ChainResponse, HeightQuery, NewBlockRequest, NewBlockResponse, WindowQuery, node_at,
    window_at,
};
use crate::blockchain::{Block, ChainContext, ChainError};
use crate::consensus::PROTOCOL_VOTES;
use crate::consensus::fee::effective_fees;
use crate::consensus::protocol::{format_protocol_version, protocol_vote_report};

/// Summary of the best chain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let tip = chain.tip_node();
    let protocol_version = chain.protocol_version();
    HttpResponse::Ok().json(ChainResponse {
        network: chain.params().network.to_string(),
        height: tip.height,
        tip_hash: tip.hash.clone(),
        tip_time: tip.time,
        protocol_version,
        protocol: format_protocol_version(protocol_version),
        blocks_known: chain.len(),
    })
}

/// Connect a block to the tree.
#[post("/blocks/")]
pub async fn post_block(
    state: web::Data<AppState>,
    body: web::Json<NewBlockRequest>,
) -> impl Responder {
    let req = body.into_inner();
    let block = Block::new(
        req.previous_hash,
        req.time.unwrap_or_else(|| Utc::now().timestamp()),
        req.proof_of_stake,
        req.coin_age,
        req.vote,
    );
    let hash = block.hash.clone();
    debug!("POST /blocks/ - received {hash} on {}", block.previous_hash);

    let mut chain = state.chain.lock().expect("mutex poisoned");
    match chain.connect_block(block) {
        Ok(connected) => {
            let height = chain
                .node_by_hash(&hash)
                .map_or(0, |id| chain.node(id).height);
            HttpResponse::Ok().json(NewBlockResponse {
                hash,
                height,
                connected,
            })
        }
        Err(e) => {
            warn!("POST /blocks/ - rejected {hash}: {e}");
            match &e {
                ChainError::DuplicateBlock(_) => HttpResponse::Conflict().body(e.to_string()),
                ChainError::UnknownParent(_) => HttpResponse::NotFound().body(e.to_string()),
                _ => HttpResponse::BadRequest().body(e.to_string()),
            }
        }
    }
}

/// Minimum fee per unit in force at a block.
#[get("/fees/")]
pub async fn get_fees(state: web::Data<AppState>, query: web::Query<HeightQuery>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(effective_fees(&*chain, id))
}

/// Protocol version votes of a block window.
#[get("/protocolvotes/")]
pub async fn get_protocol_votes(
    state: web::Data<AppState>,
    query: web::Query<WindowQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let (id, quantity) = match window_at(&chain, &query, PROTOCOL_VOTES) {
        Ok(selected) => selected,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(protocol_vote_report(&*chain, id, quantity))
}
