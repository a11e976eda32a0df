use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use vote_consensus::api::{self, AppState};
use vote_consensus::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    info!(
        "🗳️ Starting vote engine API ({}) at http://{}:{}",
        config.network, config.host, config.port
    );

    let state = web::Data::new(AppState::new(config.chain_params()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
