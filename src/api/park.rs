use actix_web::{HttpResponse, Responder, get, web};

use super::models::{
    AppState, HeightQuery, ParkRateEntry, PremiumQuery, PremiumResponse, WindowQuery, node_at,
    parse_currency, window_at,
};
use crate::consensus::PARK_RATE_VOTES;
use crate::consensus::park_rate::{effective_park_rates, park_vote_report};
use crate::consensus::premium::next_premium;
use crate::vote::PARK_RATE_SCALE;

/// Park rate curve of a currency in force at a block.
#[get("/parkrates/{unit}/")]
pub async fn get_park_rates(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HeightQuery>,
) -> impl Responder {
    let unit = match parse_currency(&path) {
        Ok(unit) => unit,
        Err(resp) => return resp,
    };
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let entries: Vec<ParkRateEntry> = effective_park_rates(&*chain, id)
        .into_iter()
        .filter(|curve| curve.unit == unit)
        .flat_map(|curve| curve.rates)
        .map(|park_rate| ParkRateEntry {
            duration: format!("{} blocks", park_rate.duration()),
            blocks: park_rate.duration(),
            rate: park_rate.rate as f64 / PARK_RATE_SCALE as f64,
        })
        .collect();
    HttpResponse::Ok().json(entries)
}

/// Premium a park of `amount` for `duration` blocks would earn in the next block.
#[get("/premium/")]
pub async fn get_premium(
    state: web::Data<AppState>,
    query: web::Query<PremiumQuery>,
) -> impl Responder {
    let unit = match parse_currency(&query.unit) {
        Ok(unit) => unit,
        Err(resp) => return resp,
    };
    let chain = state.chain.lock().expect("mutex poisoned");
    let premium = next_premium(&*chain, chain.tip(), query.amount, query.duration, unit);
    HttpResponse::Ok().json(PremiumResponse {
        unit,
        amount: query.amount,
        duration: query.duration,
        premium,
    })
}

/// Park rate votes of a block window, per unit and duration.
#[get("/parkvotes/")]
pub async fn get_park_votes(
    state: web::Data<AppState>,
    query: web::Query<WindowQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let (id, quantity) = match window_at(&chain, &query, PARK_RATE_VOTES) {
        Ok(selected) => selected,
        Err(resp) => return resp,
    };
    HttpResponse::Ok().json(park_vote_report(&*chain, id, quantity))
}
