pub mod block;
pub mod context;
pub mod model;
pub mod params;

pub use block::Block;
pub use context::{Ancestors, ChainContext, NodeId};
pub use model::{Chain, ChainError, ChainNode, Connected, ElectedCustodian, NodeResults};
pub use params::{ChainParams, Network};

#[cfg(test)]
pub(crate) use context::testing;
