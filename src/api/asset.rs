use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, HeightQuery, node_at};
use crate::consensus::asset::{AssetInfo, effective_asset, effective_assets};
use crate::vote::asset_id;

/// Assets in force at a block.
#[get("/assets/")]
pub async fn get_assets(
    state: web::Data<AppState>,
    query: web::Query<HeightQuery>,
) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let assets: Vec<AssetInfo> = effective_assets(&*chain, id)
        .values()
        .map(|asset| AssetInfo::new(asset, false))
        .collect();
    HttpResponse::Ok().json(assets)
}

/// One asset, by symbol or raw id, with its display metadata.
#[get("/assets/{id}/")]
pub async fn get_asset(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HeightQuery>,
) -> impl Responder {
    let requested = asset_id::encode(&path);
    if !asset_id::is_valid(requested) {
        return HttpResponse::BadRequest().body("invalid asset id");
    }
    let chain = state.chain.lock().expect("mutex poisoned");
    let id = match node_at(&chain, query.height) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match effective_asset(&*chain, id, requested) {
        Some(asset) => HttpResponse::Ok().json(AssetInfo::new(&asset, true)),
        None => HttpResponse::NotFound().body("asset not found"),
    }
}
