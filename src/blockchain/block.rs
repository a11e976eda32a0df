use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::vote::VoteRecord;

/// Block times are unsigned 32-bit seconds.
pub const MAX_BLOCK_TIME: i64 = u32::MAX as i64;

/// A block as seen by the vote engine: linkage, time, the stake flag and
/// the embedded vote payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Hex SHA-256 of the other fields, see `compute_hash`.
    pub hash: String,
    pub previous_hash: String,
    /// Seconds since the Unix epoch, at most `MAX_BLOCK_TIME`.
    pub time: i64,
    pub proof_of_stake: bool,
    /// Coin age destroyed by the coinstake, in share-days.
    #[serde(default)]
    pub coin_age: u64,
    #[serde(default)]
    pub vote: Option<serde_json::Value>,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    pub fn genesis(time: i64) -> Self {
        Self::new(String::from("0"), time, false, 0, None)
    }

    pub fn new(
        previous_hash: String,
        time: i64,
        proof_of_stake: bool,
        coin_age: u64,
        vote: Option<serde_json::Value>,
    ) -> Self {
        let mut block = Self {
            hash: String::new(),
            previous_hash,
            time,
            proof_of_stake,
            coin_age,
            vote,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Compute the SHA-256 hash of this block using its fields
    /// (excluding the `hash` field itself). The vote payload enters the
    /// preimage as compact JSON.
    pub fn compute_hash(&self) -> String {
        let vote_json = self.vote.as_ref().map(|v| v.to_string()).unwrap_or_default();
        let preimage = format!(
            "{}:{}:{}:{}:{}",
            self.previous_hash, self.time, self.proof_of_stake, self.coin_age, vote_json
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest)
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn has_valid_time(&self) -> bool {
        (0..=MAX_BLOCK_TIME).contains(&self.time)
    }

    /// The vote this block casts. Proof-of-work blocks and blocks without
    /// a readable payload cast the null vote.
    pub fn decode_vote(&self) -> VoteRecord {
        if !self.proof_of_stake {
            return VoteRecord::default();
        }
        VoteRecord::from_payload(self.vote.as_ref(), self.coin_age)
    }
}
