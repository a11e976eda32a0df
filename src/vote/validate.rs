use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use super::asset_id;
use super::model::{AssetVote, ParkRateVote, SignerRewardVote, Unit, VoteRecord};
use super::{
    REPUTATION_VOTES_PER_BLOCK, compact_duration_range, money_range, park_rate_range,
};
use crate::consensus::{EXP_SERIES_MAX_PARAM, MAX_TRADABLE_UNIT_EXPONENT, PROTOCOL_V2_0, PROTOCOL_V4_0};

/// Minimum number of deposit signers an asset may require.
pub const MIN_REQ_SIGNERS: u8 = 1;
pub const MIN_TOTAL_SIGNERS: u8 = 1;

/// Reasons a decoded vote is structurally invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("vote on unknown unit {0}")]
    InvalidUnit(Unit),

    #[error("park rate vote on non-currency unit {0}")]
    ParkRateUnit(Unit),

    #[error("duplicate park rate vote for unit {0}")]
    DuplicateParkRateUnit(Unit),

    #[error("duplicate compact duration {compact_duration} for unit {unit}")]
    DuplicateDuration { unit: Unit, compact_duration: u8 },

    #[error("compact duration {0} out of range")]
    CompactDurationOutOfRange(u8),

    #[error("park rate {0} out of range")]
    ParkRateOutOfRange(i64),

    #[error("custodian vote on unit {0} not allowed before protocol 2.0")]
    CustodianUnit(Unit),

    #[error("custodian amount {0} out of range")]
    CustodianAmountOutOfRange(i64),

    #[error("duplicate custodian vote")]
    DuplicateCustodianVote,

    #[error("signer reward vote out of range")]
    SignerRewardOutOfRange,

    #[error("signer reward vote not allowed before protocol 4.0")]
    SignerRewardNotActive,

    #[error("invalid asset vote for id {0:#010x}")]
    InvalidAssetVote(u32),

    #[error("duplicate asset vote for id {0:#010x}")]
    DuplicateAssetVote(u32),

    #[error("asset votes not allowed before protocol 4.0")]
    AssetVotesNotActive,

    #[error("reputation votes not allowed before protocol 4.0")]
    ReputationVotesNotActive,

    #[error("too many reputation votes: {0}")]
    TooManyReputationVotes(usize),

    #[error("reputation vote weight must be 1 or -1, got {0}")]
    ReputationWeight(i8),
}

impl ParkRateVote {
    pub fn validate(&self) -> Result<(), VoteError> {
        if !self.unit.is_valid() {
            return Err(VoteError::InvalidUnit(self.unit));
        }
        if !self.unit.is_currency() {
            return Err(VoteError::ParkRateUnit(self.unit));
        }

        let mut seen = BTreeSet::new();
        for park_rate in &self.rates {
            if !compact_duration_range(park_rate.compact_duration) {
                return Err(VoteError::CompactDurationOutOfRange(park_rate.compact_duration));
            }
            if !park_rate_range(park_rate.rate) {
                return Err(VoteError::ParkRateOutOfRange(park_rate.rate));
            }
            if !seen.insert(park_rate.compact_duration) {
                return Err(VoteError::DuplicateDuration {
                    unit: self.unit,
                    compact_duration: park_rate.compact_duration,
                });
            }
        }
        Ok(())
    }
}

impl AssetVote {
    pub fn is_valid(&self) -> bool {
        asset_id::is_valid(self.asset_id)
            && self.confirmations > 0
            && self.required_signers >= MIN_REQ_SIGNERS
            && self.total_signers >= MIN_TOTAL_SIGNERS
            && self.required_signers < self.total_signers
            && self.max_trade <= EXP_SERIES_MAX_PARAM
            && self.min_trade <= self.max_trade
            && self.unit_exponent <= MAX_TRADABLE_UNIT_EXPONENT
    }
}

impl SignerRewardVote {
    fn validate(&self) -> Result<(), VoteError> {
        let count_ok = self.count.is_none_or(|c| c <= i16::MAX as u16);
        let amount_ok = self.amount.is_none_or(|a| a <= i32::MAX as u32);
        if count_ok && amount_ok {
            Ok(())
        } else {
            Err(VoteError::SignerRewardOutOfRange)
        }
    }
}

impl VoteRecord {
    /// Structural checks that apply wherever a vote is used.
    pub fn validate(&self, protocol_version: u32) -> Result<(), VoteError> {
        let mut park_units = BTreeSet::new();
        for park_rate_vote in &self.park_rate_votes {
            park_rate_vote.validate()?;
            if !park_units.insert(park_rate_vote.unit) {
                return Err(VoteError::DuplicateParkRateUnit(park_rate_vote.unit));
            }
        }

        let mut seen_custodians = HashSet::new();
        for custodian_vote in &self.custodian_votes {
            if !custodian_vote.unit.is_valid() {
                return Err(VoteError::InvalidUnit(custodian_vote.unit));
            }
            if protocol_version < PROTOCOL_V2_0 && !custodian_vote.unit.is_currency() {
                return Err(VoteError::CustodianUnit(custodian_vote.unit));
            }
            if !money_range(custodian_vote.amount) {
                return Err(VoteError::CustodianAmountOutOfRange(custodian_vote.amount));
            }
            if !seen_custodians.insert(custodian_vote) {
                return Err(VoteError::DuplicateCustodianVote);
            }
        }

        if let Some(unit) = self.fee_votes.keys().find(|unit| !unit.is_valid()) {
            return Err(VoteError::InvalidUnit(*unit));
        }

        self.signer_reward.validate()?;

        let mut seen_assets = BTreeSet::new();
        for asset_vote in &self.asset_votes {
            if !asset_vote.is_valid() {
                return Err(VoteError::InvalidAssetVote(asset_vote.asset_id));
            }
            if !seen_assets.insert(asset_vote.asset_id) {
                return Err(VoteError::DuplicateAssetVote(asset_vote.asset_id));
            }
        }

        Ok(())
    }

    /// Checks for a vote embedded in a block running `protocol_version`.
    pub fn validate_in_block(&self, protocol_version: u32) -> Result<(), VoteError> {
        self.validate(protocol_version)?;

        let v4 = protocol_version >= PROTOCOL_V4_0;
        if !self.reputation_votes.is_empty() && !v4 {
            return Err(VoteError::ReputationVotesNotActive);
        }
        if self.reputation_votes.len() > REPUTATION_VOTES_PER_BLOCK {
            return Err(VoteError::TooManyReputationVotes(self.reputation_votes.len()));
        }
        if let Some(vote) = self
            .reputation_votes
            .iter()
            .find(|v| v.weight != 1 && v.weight != -1)
        {
            return Err(VoteError::ReputationWeight(vote.weight));
        }
        if !self.asset_votes.is_empty() && !v4 {
            return Err(VoteError::AssetVotesNotActive);
        }
        if !v4 && self.signer_reward.is_nonzero() {
            return Err(VoteError::SignerRewardNotActive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{PROTOCOL_V0_5, PROTOCOL_V5_0};
    use crate::vote::{
        CustodianVote, Destination, Hash160, MAX_MONEY, MAX_PARK_RATE, ParkRate, ReputationVote,
    };

    fn custodian(amount: i64) -> CustodianVote {
        CustodianVote {
            unit: Unit::Credits,
            destination: Destination::KeyHash(Hash160::from_low_u64(1)),
            amount,
        }
    }

    fn btc_vote() -> AssetVote {
        AssetVote {
            asset_id: asset_id::encode("BTC"),
            confirmations: 6,
            required_signers: 2,
            total_signers: 3,
            max_trade: 80,
            min_trade: 10,
            unit_exponent: 8,
        }
    }

    #[test]
    fn null_vote_is_valid_everywhere() {
        let vote = VoteRecord::default();
        assert_eq!(vote.validate_in_block(PROTOCOL_V0_5), Ok(()));
        assert_eq!(vote.validate_in_block(PROTOCOL_V5_0), Ok(()));
    }

    #[test]
    fn park_rate_votes() {
        let mut vote = VoteRecord::default();
        vote.park_rate_votes
            .push(ParkRateVote::new(Unit::Shares, vec![ParkRate::new(8, 1)]));
        assert_eq!(vote.validate(PROTOCOL_V2_0), Err(VoteError::ParkRateUnit(Unit::Shares)));

        vote.park_rate_votes = vec![ParkRateVote::new(
            Unit::Credits,
            vec![ParkRate::new(8, 1), ParkRate::new(8, 2)],
        )];
        assert_eq!(
            vote.validate(PROTOCOL_V2_0),
            Err(VoteError::DuplicateDuration {
                unit: Unit::Credits,
                compact_duration: 8
            })
        );

        vote.park_rate_votes = vec![ParkRateVote::new(Unit::Credits, vec![ParkRate::new(30, 1)])];
        assert_eq!(
            vote.validate(PROTOCOL_V2_0),
            Err(VoteError::CompactDurationOutOfRange(30))
        );

        vote.park_rate_votes = vec![ParkRateVote::new(
            Unit::Credits,
            vec![ParkRate::new(29, MAX_PARK_RATE + 1)],
        )];
        assert_eq!(
            vote.validate(PROTOCOL_V2_0),
            Err(VoteError::ParkRateOutOfRange(MAX_PARK_RATE + 1))
        );

        let curve = ParkRateVote::new(Unit::Credits, vec![ParkRate::new(29, MAX_PARK_RATE)]);
        vote.park_rate_votes = vec![curve.clone()];
        assert_eq!(vote.validate(PROTOCOL_V2_0), Ok(()));
        vote.park_rate_votes.push(curve);
        assert_eq!(
            vote.validate(PROTOCOL_V2_0),
            Err(VoteError::DuplicateParkRateUnit(Unit::Credits))
        );
    }

    #[test]
    fn custodian_votes() {
        let mut vote = VoteRecord::default();
        vote.custodian_votes = vec![custodian(10), custodian(10)];
        assert_eq!(vote.validate(PROTOCOL_V2_0), Err(VoteError::DuplicateCustodianVote));

        vote.custodian_votes = vec![custodian(10), custodian(11)];
        assert_eq!(vote.validate(PROTOCOL_V2_0), Ok(()));

        vote.custodian_votes = vec![custodian(MAX_MONEY + 1)];
        assert_eq!(
            vote.validate(PROTOCOL_V2_0),
            Err(VoteError::CustodianAmountOutOfRange(MAX_MONEY + 1))
        );

        let mut shares = custodian(10);
        shares.unit = Unit::Shares;
        vote.custodian_votes = vec![shares];
        assert_eq!(
            vote.validate(PROTOCOL_V0_5),
            Err(VoteError::CustodianUnit(Unit::Shares))
        );
        assert_eq!(vote.validate(PROTOCOL_V2_0), Ok(()));
    }

    #[test]
    fn unknown_units_are_invalid() {
        let unknown = Unit::Unknown('X');
        let mut vote = VoteRecord::default();
        vote.park_rate_votes = vec![ParkRateVote::new(unknown, vec![])];
        assert_eq!(vote.validate(PROTOCOL_V2_0), Err(VoteError::InvalidUnit(unknown)));

        let mut vote = VoteRecord::default();
        let mut grant = custodian(10);
        grant.unit = unknown;
        vote.custodian_votes = vec![grant];
        assert_eq!(vote.validate(PROTOCOL_V2_0), Err(VoteError::InvalidUnit(unknown)));
        assert_eq!(vote.validate(PROTOCOL_V0_5), Err(VoteError::InvalidUnit(unknown)));

        let mut vote = VoteRecord::default();
        vote.fee_votes.insert(Unit::Credits, 5);
        assert_eq!(vote.validate(PROTOCOL_V2_0), Ok(()));
        vote.fee_votes.insert(unknown, 5);
        assert_eq!(vote.validate_in_block(PROTOCOL_V2_0), Err(VoteError::InvalidUnit(unknown)));
    }

    #[test]
    fn reputation_votes_are_gated() {
        let up = ReputationVote {
            destination: Destination::KeyHash(Hash160::from_low_u64(5)),
            weight: 1,
        };
        let mut vote = VoteRecord::default();
        vote.reputation_votes = vec![up.clone()];
        assert_eq!(
            vote.validate_in_block(PROTOCOL_V2_0),
            Err(VoteError::ReputationVotesNotActive)
        );
        assert_eq!(vote.validate_in_block(PROTOCOL_V4_0), Ok(()));

        vote.reputation_votes = vec![up.clone(); 4];
        assert_eq!(
            vote.validate_in_block(PROTOCOL_V4_0),
            Err(VoteError::TooManyReputationVotes(4))
        );

        let mut heavy = up;
        heavy.weight = 2;
        vote.reputation_votes = vec![heavy];
        assert_eq!(
            vote.validate_in_block(PROTOCOL_V4_0),
            Err(VoteError::ReputationWeight(2))
        );
    }

    #[test]
    fn asset_votes() {
        let mut vote = VoteRecord::default();
        vote.asset_votes = vec![btc_vote()];
        assert_eq!(vote.validate_in_block(PROTOCOL_V4_0), Ok(()));
        assert_eq!(
            vote.validate_in_block(PROTOCOL_V2_0),
            Err(VoteError::AssetVotesNotActive)
        );

        vote.asset_votes = vec![btc_vote(), btc_vote()];
        assert!(matches!(
            vote.validate(PROTOCOL_V4_0),
            Err(VoteError::DuplicateAssetVote(_))
        ));

        let mut bad = btc_vote();
        bad.required_signers = 3;
        assert!(!bad.is_valid());
        let mut bad = btc_vote();
        bad.min_trade = 81;
        assert!(!bad.is_valid());
        let mut bad = btc_vote();
        bad.unit_exponent = 19;
        assert!(!bad.is_valid());
        let mut bad = btc_vote();
        bad.confirmations = 0;
        assert!(!bad.is_valid());
        let mut bad = btc_vote();
        bad.asset_id = 0;
        assert!(!bad.is_valid());
    }

    #[test]
    fn signer_reward_votes() {
        let mut vote = VoteRecord::default();
        vote.signer_reward = SignerRewardVote::new(3, 100);
        assert_eq!(
            vote.validate_in_block(PROTOCOL_V2_0),
            Err(VoteError::SignerRewardNotActive)
        );
        assert_eq!(vote.validate_in_block(PROTOCOL_V4_0), Ok(()));

        vote.signer_reward = SignerRewardVote::new(0, 0);
        assert_eq!(vote.validate_in_block(PROTOCOL_V2_0), Ok(()));

        vote.signer_reward = SignerRewardVote {
            count: Some(u16::MAX),
            amount: None,
        };
        assert_eq!(
            vote.validate(PROTOCOL_V4_0),
            Err(VoteError::SignerRewardOutOfRange)
        );
    }
}
