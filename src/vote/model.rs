use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::destination::{Destination, Hash160};
use super::{CENT, COIN};

/// Currency units of the network. Shares (`'8'`) carry votes, credits
/// (`'C'`) are the custodian-issued currency.
///
/// Votes are decoded with whatever symbol they name, so a vote for a unit
/// the network does not have is invalid rather than absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    Shares,
    Credits,
    Unknown(char),
}

impl Unit {
    pub const ALL: [Unit; 2] = [Unit::Shares, Unit::Credits];

    pub fn symbol(self) -> char {
        match self {
            Unit::Shares => '8',
            Unit::Credits => 'C',
            Unit::Unknown(c) => c,
        }
    }

    /// Known unit with symbol `c`.
    pub fn from_symbol(c: char) -> Option<Unit> {
        match c {
            '8' => Some(Unit::Shares),
            'C' => Some(Unit::Credits),
            _ => None,
        }
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, Unit::Unknown(_))
    }

    /// Park rates and pre-v2.0 custodian grants only exist for currencies.
    pub fn is_currency(self) -> bool {
        matches!(self, Unit::Credits)
    }

    /// Fee voted implicitly by blocks that do not vote a fee for this unit.
    pub fn default_fee(self) -> u32 {
        match self {
            Unit::Shares => COIN as u32,
            Unit::Credits => CENT as u32,
            Unit::Unknown(_) => 0,
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = String;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Unit::from_symbol(c).unwrap_or(Unit::Unknown(c))),
            _ => Err(format!("unit must be a single symbol, got '{symbol}'")),
        }
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> String {
        unit.symbol().to_string()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A proposed mint authorization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustodianVote {
    pub unit: Unit,
    pub destination: Destination,
    pub amount: i64,
}

impl CustodianVote {
    fn sort_key(&self) -> (Unit, i64, &Destination) {
        (self.unit, self.amount, &self.destination)
    }
}

impl Ord for CustodianVote {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for CustodianVote {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// One point of a park-rate curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParkRate {
    /// log2 of the park duration in blocks.
    pub compact_duration: u8,
    /// Premium per parked coin, scaled by `PARK_RATE_SCALE`.
    pub rate: i64,
}

impl ParkRate {
    pub fn new(compact_duration: u8, rate: i64) -> Self {
        Self {
            compact_duration,
            rate,
        }
    }

    /// Duration in blocks.
    pub fn duration(&self) -> i64 {
        compact_to_duration(self.compact_duration)
    }
}

pub fn compact_to_duration(compact_duration: u8) -> i64 {
    1i64 << compact_duration
}

/// A unit's full rate curve, also used for park-rate results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkRateVote {
    pub unit: Unit,
    #[serde(default)]
    pub rates: Vec<ParkRate>,
}

impl ParkRateVote {
    pub fn new(unit: Unit, rates: Vec<ParkRate>) -> Self {
        Self { unit, rates }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationVote {
    pub destination: Destination,
    pub weight: i8,
}

/// Raw signer reward vote. `None` means "keep the previous value".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignerRewardVote {
    #[serde(default)]
    pub count: Option<u16>,
    #[serde(default)]
    pub amount: Option<u32>,
}

impl SignerRewardVote {
    pub fn new(count: u16, amount: u32) -> Self {
        Self {
            count: Some(count),
            amount: Some(amount),
        }
    }

    /// Whether the vote asks for a non-zero count or amount.
    pub fn is_nonzero(&self) -> bool {
        self.count.is_some_and(|c| c > 0) || self.amount.is_some_and(|a| a > 0)
    }
}

/// Proposed parameters of an external tradable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetVote {
    pub asset_id: u32,
    pub confirmations: u16,
    pub required_signers: u8,
    pub total_signers: u8,
    /// Exponential series parameter of the maximum trade size.
    pub max_trade: u8,
    /// Exponential series parameter of the minimum trade size.
    pub min_trade: u8,
    pub unit_exponent: u8,
}

/// One block's economic vote.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteRecord {
    pub version_vote: u32,
    pub custodian_votes: Vec<CustodianVote>,
    pub park_rate_votes: Vec<ParkRateVote>,
    pub motions: Vec<Hash160>,
    pub fee_votes: BTreeMap<Unit, u32>,
    pub reputation_votes: Vec<ReputationVote>,
    pub signer_reward: SignerRewardVote,
    pub asset_votes: Vec<AssetVote>,
    /// Vote weight, computed from the block's coinstake and never part of
    /// the embedded payload.
    #[serde(skip_deserializing)]
    pub coin_age_destroyed: u64,
}

impl VoteRecord {
    /// Decode an embedded vote payload. A payload that does not parse is
    /// treated as an absent vote.
    pub fn decode(payload: &serde_json::Value) -> Option<VoteRecord> {
        match VoteRecord::deserialize(payload) {
            Ok(vote) => Some(vote),
            Err(e) => {
                debug!("VOTE - malformed payload ignored: {e}");
                None
            }
        }
    }

    /// Decode a payload and attach the externally computed coin age.
    /// Absent or malformed payloads give the null vote.
    pub fn from_payload(payload: Option<&serde_json::Value>, coin_age: u64) -> VoteRecord {
        match payload.and_then(VoteRecord::decode) {
            Some(mut vote) => {
                vote.coin_age_destroyed = coin_age;
                vote
            }
            None => VoteRecord::default(),
        }
    }

    pub fn is_null(&self) -> bool {
        *self == VoteRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_full_payload() {
        let payload = json!({
            "version_vote": 4000000,
            "custodian_votes": [
                {"unit": "C", "destination": {"type": "key_hash", "hash": "0000000000000000000000000000000000000001"}, "amount": 500}
            ],
            "park_rate_votes": [{"unit": "C", "rates": [{"compact_duration": 8, "rate": 100}]}],
            "motions": ["8151325dcdbae9e0ff95f9f9658432dbedfdb209"],
            "fee_votes": {"C": 200},
            "signer_reward": {"count": 5, "amount": null}
        });
        let vote = VoteRecord::from_payload(Some(&payload), 77);
        assert_eq!(vote.version_vote, 4_000_000);
        assert_eq!(vote.custodian_votes.len(), 1);
        assert_eq!(vote.park_rate_votes[0].rates[0], ParkRate::new(8, 100));
        assert_eq!(vote.fee_votes.get(&Unit::Credits), Some(&200));
        assert_eq!(vote.signer_reward.count, Some(5));
        assert_eq!(vote.signer_reward.amount, None);
        assert!(vote.asset_votes.is_empty());
        assert_eq!(vote.coin_age_destroyed, 77);
    }

    #[test]
    fn malformed_payload_is_absent() {
        let payload = json!({"park_rate_votes": [{"unit": "CC", "rates": []}]});
        assert!(VoteRecord::decode(&payload).is_none());

        let vote = VoteRecord::from_payload(Some(&payload), 500);
        assert!(vote.is_null());
        assert_eq!(vote.coin_age_destroyed, 0);
    }

    #[test]
    fn unknown_units_are_kept() {
        let payload = json!({
            "park_rate_votes": [{"unit": "X", "rates": []}],
            "fee_votes": {"Y": 5},
            "custodian_votes": [{"unit": "Z", "destination": {"type": "none"}, "amount": 1}]
        });
        let vote = VoteRecord::decode(&payload).expect("units are single symbols");
        assert_eq!(vote.park_rate_votes[0].unit, Unit::Unknown('X'));
        assert_eq!(vote.fee_votes.get(&Unit::Unknown('Y')), Some(&5));
        assert_eq!(vote.custodian_votes[0].unit, Unit::Unknown('Z'));

        let json = serde_json::to_value(&vote).expect("vote serializes");
        assert_eq!(json["park_rate_votes"][0]["unit"], "X");
        assert_eq!(json["fee_votes"]["Y"], 5);
    }

    #[test]
    fn payload_cannot_set_its_own_weight() {
        let payload = json!({"coin_age_destroyed": 1_000_000});
        let vote = VoteRecord::from_payload(Some(&payload), 3);
        assert_eq!(vote.coin_age_destroyed, 3);
    }

    #[test]
    fn custodian_votes_sort_by_unit_then_amount() {
        let a = CustodianVote {
            unit: Unit::Credits,
            destination: Destination::KeyHash(Hash160::from_low_u64(9)),
            amount: 1,
        };
        let b = CustodianVote {
            unit: Unit::Credits,
            destination: Destination::KeyHash(Hash160::from_low_u64(1)),
            amount: 2,
        };
        let c = CustodianVote {
            unit: Unit::Shares,
            destination: Destination::None,
            amount: 100,
        };
        let mut votes = vec![a.clone(), b.clone(), c.clone()];
        votes.sort();
        assert_eq!(votes, vec![c, a, b]);
    }

    #[test]
    fn units() {
        assert_eq!(Unit::from_symbol('C'), Some(Unit::Credits));
        assert_eq!(Unit::from_symbol('B'), None);
        assert_eq!(Unit::try_from("8".to_string()), Ok(Unit::Shares));
        assert_eq!(Unit::try_from("B".to_string()), Ok(Unit::Unknown('B')));
        assert!(Unit::try_from(String::new()).is_err());
        assert!(!Unit::Unknown('B').is_valid());
        assert!(!Unit::Unknown('B').is_currency());
        assert_eq!(Unit::Unknown('B').to_string(), "B");
        assert!(Unit::Credits.is_currency());
        assert!(!Unit::Shares.is_currency());
        assert_eq!(Unit::Credits.default_fee(), 100);
        assert_eq!(compact_to_duration(8), 256);
    }
}
