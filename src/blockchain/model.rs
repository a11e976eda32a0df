use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::params::ChainParams;
use super::{Block, ChainContext, NodeId};
use crate::consensus::asset::Asset;
use crate::consensus::derive_results;
use crate::consensus::signer_reward::SignerRewardResult;
use crate::transaction::Transaction;
use crate::vote::{CustodianVote, Destination, ParkRateVote, Unit, VoteError, VoteRecord};

/// Values derived once per node and read by later blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeResults {
    pub protocol_version: u32,
    pub park_rate_results: Vec<ParkRateVote>,
    pub voted_fees: BTreeMap<Unit, u32>,
    pub signer_reward_result: SignerRewardResult,
    pub rewarded_signer: Destination,
    /// Assets whose voted parameters changed at this node.
    pub assets: BTreeMap<u32, Asset>,
    /// Most recent node that changed each known asset.
    pub assets_prev: BTreeMap<u32, NodeId>,
    pub elected_custodians: Vec<CustodianVote>,
    pub currency_coinbases: Vec<Transaction>,
}

/// A block in the arena. `results` is only set while the node is on the
/// best chain.
#[derive(Debug, Clone)]
pub struct ChainNode {
    pub hash: String,
    pub parent: Option<NodeId>,
    pub height: u64,
    pub time: i64,
    pub proof_of_stake: bool,
    pub vote: VoteRecord,
    pub results: Option<NodeResults>,
    pub invalid: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("block {0} is already known")]
    DuplicateBlock(String),
    #[error("unknown parent block {0}")]
    UnknownParent(String),
    #[error("block hash does not match its contents")]
    HashMismatch,
    #[error("block time {0} out of range")]
    TimeOutOfRange(i64),
    #[error("parent block {0} is invalid")]
    InvalidAncestor(String),
    #[error("invalid vote: {0}")]
    InvalidVote(#[from] VoteError),
}

/// How a connected block changed the best chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Connected {
    Extended,
    Reorganized { detached: usize, attached: usize },
    SideBranch,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ElectedCustodian {
    pub unit: Unit,
    pub destination: Destination,
    pub amount: i64,
    pub block_hash: String,
    pub time: i64,
}

/// In-memory block tree with the best chain and its derived vote results.
#[derive(Debug)]
pub struct Chain {
    params: ChainParams,
    nodes: Vec<ChainNode>,
    by_hash: HashMap<String, NodeId>,
    /// Best chain, indexed by height.
    best: Vec<NodeId>,
    elected: BTreeMap<(Unit, Destination), NodeId>,
}

impl ChainContext for Chain {
    fn node(&self, id: NodeId) -> &ChainNode {
        &self.nodes[id.0]
    }
}

impl Chain {
    /// Initialize a new chain with the network's genesis block.
    pub fn new(params: ChainParams) -> Self {
        let genesis = Block::genesis(params.genesis_time);
        let id = NodeId(0);
        let mut chain = Self {
            params,
            nodes: Vec::new(),
            by_hash: HashMap::new(),
            best: vec![id],
            elected: BTreeMap::new(),
        };
        chain.by_hash.insert(genesis.hash.clone(), id);
        chain.nodes.push(ChainNode {
            hash: genesis.hash,
            parent: None,
            height: 0,
            time: genesis.time,
            proof_of_stake: false,
            vote: VoteRecord::default(),
            results: None,
            invalid: false,
        });
        chain.nodes[0].results = derive_results(&chain, &chain.params, id, |_, _| false).ok();
        chain
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn tip(&self) -> NodeId {
        *self
            .best
            .last()
            .expect("Chain should always have at least the genesis block")
    }

    pub fn tip_node(&self) -> &ChainNode {
        self.node(self.tip())
    }

    pub fn height(&self) -> u64 {
        self.tip_node().height
    }

    pub fn node_at_height(&self, height: u64) -> Option<NodeId> {
        usize::try_from(height).ok().and_then(|h| self.best.get(h)).copied()
    }

    pub fn node_by_hash(&self, hash: &str) -> Option<NodeId> {
        self.by_hash.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Protocol version run by the tip.
    pub fn protocol_version(&self) -> u32 {
        self.results(self.tip())
            .map_or(self.params.initial_protocol, |r| r.protocol_version)
    }

    pub fn is_on_best_chain(&self, id: NodeId) -> bool {
        self.node_at_height(self.node(id).height) == Some(id)
    }

    /// Every custodian elected on the best chain, in (unit, destination)
    /// order.
    pub fn elected_custodians(&self) -> Vec<ElectedCustodian> {
        self.elected
            .iter()
            .filter_map(|((unit, destination), id)| {
                let node = self.node(*id);
                let vote = node
                    .results
                    .as_ref()?
                    .elected_custodians
                    .iter()
                    .find(|v| v.unit == *unit && v.destination == *destination)?;
                Some(ElectedCustodian {
                    unit: *unit,
                    destination: *destination,
                    amount: vote.amount,
                    block_hash: node.hash.clone(),
                    time: node.time,
                })
            })
            .collect()
    }

    /// Add a block to the tree, extending or reorganizing the best chain.
    pub fn connect_block(&mut self, block: Block) -> Result<Connected, ChainError> {
        if self.by_hash.contains_key(&block.hash) {
            return Err(ChainError::DuplicateBlock(block.hash));
        }
        if !block.has_valid_hash() {
            return Err(ChainError::HashMismatch);
        }
        if !block.has_valid_time() {
            return Err(ChainError::TimeOutOfRange(block.time));
        }
        let Some(parent) = self.node_by_hash(&block.previous_hash) else {
            return Err(ChainError::UnknownParent(block.previous_hash));
        };
        if self.node(parent).invalid {
            return Err(ChainError::InvalidAncestor(block.previous_hash));
        }

        let vote = block.decode_vote();
        let id = NodeId(self.nodes.len());
        let height = self.node(parent).height + 1;
        self.by_hash.insert(block.hash.clone(), id);
        self.nodes.push(ChainNode {
            hash: block.hash,
            parent: Some(parent),
            height,
            time: block.time,
            proof_of_stake: block.proof_of_stake,
            vote,
            results: None,
            invalid: false,
        });

        if parent == self.tip() {
            if let Err(e) = self.attach(id) {
                warn!("CHAIN - rejected block at height {height}: {e}");
                self.nodes[id.0].invalid = true;
                return Err(e.into());
            }
            info!(
                "CHAIN - extended to height {height} ({})",
                self.nodes[id.0].hash
            );
            Ok(Connected::Extended)
        } else if height > self.height() {
            self.reorganize(id)
        } else {
            debug!("CHAIN - stored side branch block at height {height}");
            Ok(Connected::SideBranch)
        }
    }

    /// Derive the results of `id`, whose parent must be the tip, and make
    /// it the new tip.
    fn attach(&mut self, id: NodeId) -> Result<(), VoteError> {
        let elected = &self.elected;
        let results = derive_results(&*self, &self.params, id, |unit, destination| {
            elected.contains_key(&(unit, *destination))
        })?;
        for custodian_vote in &results.elected_custodians {
            info!(
                "CHAIN - custodian {} elected for {} {}",
                custodian_vote.destination, custodian_vote.amount, custodian_vote.unit
            );
            self.elected
                .insert((custodian_vote.unit, custodian_vote.destination), id);
        }
        self.nodes[id.0].results = Some(results);
        self.best.push(id);
        Ok(())
    }

    /// Remove the tip from the best chain, forgetting its results.
    fn detach_tip(&mut self) -> Option<NodeId> {
        if self.best.len() <= 1 {
            return None;
        }
        let id = self.best.pop()?;
        self.nodes[id.0].results = None;
        self.elected.retain(|_, elected_by| *elected_by != id);
        Some(id)
    }

    fn reorganize(&mut self, new_tip: NodeId) -> Result<Connected, ChainError> {
        let mut branch = Vec::new();
        let mut cursor = new_tip;
        while !self.is_on_best_chain(cursor) {
            branch.push(cursor);
            match self.node(cursor).parent {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        branch.reverse();
        let fork = cursor;

        let mut detached = Vec::new();
        while self.tip() != fork {
            match self.detach_tip() {
                Some(id) => detached.push(id),
                None => break,
            }
        }

        for (attached, id) in branch.iter().enumerate() {
            if let Err(e) = self.attach(*id) {
                warn!(
                    "CHAIN - reorganization aborted at height {}: {e}",
                    self.node(*id).height
                );
                for failed in &branch[attached..] {
                    self.nodes[failed.0].invalid = true;
                }
                for _ in 0..attached {
                    self.detach_tip();
                }
                for old in detached.iter().rev() {
                    if let Err(e) = self.attach(*old) {
                        warn!("CHAIN - could not restore block {}: {e}", self.node(*old).hash);
                        break;
                    }
                }
                return Err(e.into());
            }
        }

        info!(
            "CHAIN - reorganized at height {}: {} blocks detached, {} attached",
            self.node(fork).height,
            detached.len(),
            branch.len()
        );
        Ok(Connected::Reorganized {
            detached: detached.len(),
            attached: branch.len(),
        })
    }
}
