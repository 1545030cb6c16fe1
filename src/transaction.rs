//! Transfer records carried by ledger blocks

use crate::blockchain::Payload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value transfer between two addresses.
///
/// An empty `from` marks a minted reward: nothing is debited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: String,
    pub to: String,
    pub amount: i64,
}

impl TransferRecord {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: i64) -> Self {
        TransferRecord {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    /// Mining reward credited to `to`.
    pub fn reward(to: impl Into<String>, amount: i64) -> Self {
        Self::new(String::new(), to, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_empty()
    }

    /// Signed effect of this record on the balance of `address`.
    ///
    /// Widened to `i128` so any pair of `i64` amounts combines exactly.
    pub fn balance_delta(&self, address: &str) -> i128 {
        let amount = i128::from(self.amount);
        let mut delta = 0;
        if self.from == address {
            delta -= amount;
        }
        if self.to == address {
            delta += amount;
        }
        delta
    }

    /// Length-prefixed encoding of the three fields.
    fn encode_into(&self, bytes: &mut Vec<u8>) {
        for field in [&self.from, &self.to] {
            bytes.extend_from_slice(&(field.len() as u64).to_le_bytes());
            bytes.extend_from_slice(field.as_bytes());
        }
        bytes.extend_from_slice(&self.amount.to_le_bytes());
    }
}

impl fmt::Display for TransferRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "from_address: {}, to_address: {}, amount: {}",
            self.from, self.to, self.amount
        )
    }
}

impl Payload for Vec<TransferRecord> {
    const LABEL: &'static str = "transactions";

    fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for record in self {
            record.encode_into(&mut bytes);
        }
        bytes
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for record in self {
            out.push_str("\n\t");
            out.push_str(&record.to_string());
        }
        out
    }
}
