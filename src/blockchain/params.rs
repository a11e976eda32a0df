use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::consensus::PROTOCOL_V2_0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            other => Err(format!("unknown network '{other}'")),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

/// Time-based activation of protocol 2.0 on networks launched before it.
///
/// Once the parent block is at or past `time`, 2.0 activates as soon as
/// `required` of the last `to_check` blocks voted for it. The built-in
/// networks already start at 2.0 and carry no switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacySwitch {
    pub time: i64,
    pub required: usize,
    pub to_check: usize,
}

/// Per-network consensus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub network: Network,
    /// Timestamp of the genesis block.
    pub genesis_time: i64,
    /// Protocol version run by genesis.
    pub initial_protocol: u32,
    pub legacy_v2_switch: Option<LegacySwitch>,
}

impl ChainParams {
    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            genesis_time: 1_407_023_435,
            initial_protocol: PROTOCOL_V2_0,
            legacy_v2_switch: None,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            genesis_time: 1_406_887_200,
            initial_protocol: PROTOCOL_V2_0,
            legacy_v2_switch: None,
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
        }
    }
}
