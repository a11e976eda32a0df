use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::vote::{Destination, Unit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub destination: Destination,
    pub amount: i64,
}

/// Synthetic transaction minting currency to newly elected custodians.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// A stable identifier computed from content.
    pub txid: String,
    pub unit: Unit,
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Build a currency coinbase and compute its txid deterministically
    /// from its content.
    pub fn currency_coinbase(unit: Unit, outputs: Vec<TxOutput>) -> Self {
        let payload = serde_json::json!({
            "unit": unit,
            "outputs": outputs,
        });
        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        let txid = hex::encode(hasher.finalize());

        Self { txid, unit, outputs }
    }

    pub fn total_output_amount(&self) -> i64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::Hash160;

    fn output(n: u64, amount: i64) -> TxOutput {
        TxOutput {
            destination: Destination::KeyHash(Hash160::from_low_u64(n)),
            amount,
        }
    }

    #[test]
    fn txid_depends_on_content() {
        let a = Transaction::currency_coinbase(Unit::Credits, vec![output(1, 10), output(2, 5)]);
        let same = Transaction::currency_coinbase(Unit::Credits, vec![output(1, 10), output(2, 5)]);
        let other_unit = Transaction::currency_coinbase(Unit::Shares, vec![output(1, 10), output(2, 5)]);
        let other_amount = Transaction::currency_coinbase(Unit::Credits, vec![output(1, 11), output(2, 5)]);

        assert_eq!(a.txid, same.txid);
        assert_eq!(a.txid.len(), 64);
        assert_ne!(a.txid, other_unit.txid);
        assert_ne!(a.txid, other_amount.txid);
        assert_eq!(a.total_output_amount(), 15);
    }
}
