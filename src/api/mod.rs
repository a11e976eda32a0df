mod asset;
mod chain;
mod custodian;
mod health;
pub mod models;
mod park;
mod signer;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::post_block)
            .service(chain::get_fees)
            .service(chain::get_protocol_votes)
            .service(park::get_park_rates)
            .service(park::get_premium)
            .service(park::get_park_votes)
            .service(custodian::get_custodian_votes)
            .service(custodian::get_elected_custodians)
            .service(custodian::get_motions)
            .service(signer::get_reputations)
            .service(signer::get_next_signer_reward)
            .service(signer::get_signer_reward)
            .service(signer::get_signer_reward_votes)
            .service(asset::get_assets)
            .service(asset::get_asset),
    );
}
