use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, WindowQuery, window_at};
use crate::consensus::custodian::custodian_vote_report;
use crate::consensus::motion::motion_report;
use crate::consensus::{CUSTODIAN_VOTES, MOTION_VOTES};

/// Custodian proposals of a block window.
#[get("/custodianvotes/")]
pub async fn get_custodian_votes(
    state: web::Data<AppState>,
    query: web::Query<WindowQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let (id, quantity) = match window_at(&chain, &query, CUSTODIAN_VOTES) {
        Ok(selected) => selected,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(custodian_vote_report(&*chain, id, quantity))
}

/// Custodians elected on the best chain.
#[get("/electedcustodians/")]
pub async fn get_elected_custodians(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(chain.elected_custodians())
}

/// Motion support of a block window.
#[get("/motions/")]
pub async fn get_motions(
    state: web::Data<AppState>,
    query: web::Query<WindowQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let (id, quantity) = match window_at(&chain, &query, MOTION_VOTES) {
        Ok(selected) => selected,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(motion_report(&*chain, id, quantity))
}
