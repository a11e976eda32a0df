use log::warn;
use std::env;

use crate::blockchain::{ChainParams, Network};

/// Runtime settings read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub network: Network,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let network = match lookup("VOTE_NETWORK") {
            Some(name) => name.parse().unwrap_or_else(|e| {
                warn!("CONFIG - {e}, using mainnet");
                Network::Mainnet
            }),
            None => Network::Mainnet,
        };
        Self {
            host,
            port,
            network,
        }
    }

    pub fn chain_params(&self) -> ChainParams {
        ChainParams::for_network(self.network)
    }
}
