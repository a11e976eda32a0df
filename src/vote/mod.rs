pub mod asset_id;
pub mod destination;
pub mod model;
pub mod validate;

pub use destination::{Destination, Hash160};
pub use model::{
    AssetVote, CustodianVote, ParkRate, ParkRateVote, ReputationVote, SignerRewardVote, Unit,
    VoteRecord,
};
pub use validate::VoteError;

/// Smallest-unit count of one coin.
pub const COIN: i64 = 10_000;
pub const CENT: i64 = 100;

/// Upper bound of any amount of money.
pub const MAX_MONEY: i64 = 2_000_000_000 * COIN;

/// Park-rate fixed-point scale. The smallest rate is 1 / PARK_RATE_SCALE
/// coins per parked coin.
pub const PARK_RATE_SCALE: i64 = 100_000 * COIN;
pub const MAX_PARK_RATE: i64 = 1_000_000 * PARK_RATE_SCALE;

/// Compact durations must stay strictly below this.
pub const MAX_COMPACT_DURATION: u8 = 30;

/// Longest park duration in blocks.
pub const MAX_PARK_DURATION: i64 = 1_000_000_000;

/// Maximum number of reputation votes a block may carry.
pub const REPUTATION_VOTES_PER_BLOCK: usize = 3;

pub fn money_range(amount: i64) -> bool {
    (0..=MAX_MONEY).contains(&amount)
}

pub fn park_duration_range(duration: i64) -> bool {
    (1..=MAX_PARK_DURATION).contains(&duration)
}

pub fn compact_duration_range(compact_duration: u8) -> bool {
    compact_duration < MAX_COMPACT_DURATION
}

pub fn park_rate_range(rate: i64) -> bool {
    (0..=MAX_PARK_RATE).contains(&rate)
}
