use actix_web::{HttpResponse, Responder, get, web};

use super::models::{
    AppState, HeightQuery, NextSignerRewardResponse, SignerRewardResponse, node_at,
};
use crate::blockchain::ChainContext;
use crate::consensus::protocol::next_protocol;
use crate::consensus::reputation::{effective_reputation, reputation_report};
use crate::consensus::signer_reward::{
    effective_signer_reward_result, next_signer_reward, signer_reward_vote_report,
};

/// Reputation of every signer in force at a block.
#[get("/reputations/")]
pub async fn get_reputations(
    state: web::Data<AppState>,
    query: web::Query<HeightQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(reputation_report(&effective_reputation(&*chain, id)))
}

/// Signer reward vote result in force at a block.
#[get("/signerreward/")]
pub async fn get_signer_reward(
    state: web::Data<AppState>,
    query: web::Query<HeightQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(SignerRewardResponse {
        height: chain.node(id).height,
        result: effective_signer_reward_result(&*chain, id),
    })
}

/// Who the next block rewards, and how much.
#[get("/signerreward/next/")]
pub async fn get_next_signer_reward(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let tip = chain.tip();
    let protocol_version = next_protocol(&*chain, chain.params(), Some(tip));
    let reward = next_signer_reward(&*chain, tip, protocol_version);
    HttpResponse::Ok().json(NextSignerRewardResponse {
        destination: (!reward.destination.is_none()).then_some(reward.destination),
        amount: reward.amount,
    })
}

/// Signer reward count and amount votes of the window ending at a block.
#[get("/signerrewardvotes/")]
pub async fn get_signer_reward_votes(
    state: web::Data<AppState>,
    query: web::Query<HeightQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(signer_reward_vote_report(&*chain, id))
}
