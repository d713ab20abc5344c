//! Transaction Log Entries
//!
//! One entry per successful state-mutating ledger call. Append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::hash::{Fingerprint, Fingerprinter};
use crate::ledger::wallet::Address;

/// Kind of ledger mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionKind {
    /// New tokens credited to `to`
    Mint = 0,
    /// `from` balance moved to `to` balance
    Transfer = 1,
    /// Balance moved into staked within one wallet
    Stake = 2,
    /// Staked moved back into balance within one wallet
    Unstake = 3,
}

/// Logged ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID
    pub id: Uuid,
    /// What happened
    pub kind: TransactionKind,
    /// Debited wallet (transfer, stake, unstake)
    pub from: Option<Address>,
    /// Credited wallet (mint, transfer, stake, unstake)
    pub to: Option<Address>,
    /// Always > 0
    pub amount: u64,
    /// Why tokens were minted
    pub reason: Option<String>,
    /// When it was applied
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        from: Option<Address>,
        to: Option<Address>,
        amount: u64,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            from,
            to,
            amount,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Mint into `to`.
    pub fn mint(to: Address, amount: u64, reason: &str) -> Self {
        Self::new(TransactionKind::Mint, None, Some(to), amount, Some(reason.to_string()))
    }

    /// Move balance from `from` to `to`.
    pub fn transfer(from: Address, to: Address, amount: u64) -> Self {
        Self::new(TransactionKind::Transfer, Some(from), Some(to), amount, None)
    }

    /// Lock balance in `address`.
    pub fn stake(address: Address, amount: u64) -> Self {
        Self::new(TransactionKind::Stake, Some(address), Some(address), amount, None)
    }

    /// Unlock stake in `address`.
    pub fn unstake(address: Address, amount: u64) -> Self {
        Self::new(TransactionKind::Unstake, Some(address), Some(address), amount, None)
    }

    /// Whether `address` is on either side.
    pub fn involves(&self, address: &Address) -> bool {
        self.from.as_ref() == Some(address) || self.to.as_ref() == Some(address)
    }

    /// Leaf hash for the log commitment.
    pub fn leaf_hash(&self) -> Fingerprint {
        let mut hasher = Fingerprinter::for_transaction();
        hasher.update_uuid(&self.id);
        hasher.update_u8(self.kind as u8);
        for side in [&self.from, &self.to] {
            match side {
                Some(address) => {
                    hasher.update_bool(true);
                    hasher.update_bytes(address.as_bytes());
                }
                None => hasher.update_bool(false),
            }
        }
        hasher.update_u64(self.amount);
        hasher.update_opt_str(self.reason.as_deref());
        hasher.update_timestamp(&self.timestamp);
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_sides() {
        let a = Address::new([1; 16]);
        let b = Address::new([2; 16]);

        let mint = Transaction::mint(a, 10, "knowledge");
        assert_eq!((mint.from, mint.to), (None, Some(a)));
        assert_eq!(mint.reason.as_deref(), Some("knowledge"));

        let transfer = Transaction::transfer(a, b, 5);
        assert!(transfer.involves(&a) && transfer.involves(&b));
        assert!(transfer.reason.is_none());

        let stake = Transaction::stake(b, 3);
        assert!(!stake.involves(&a));
    }

    #[test]
    fn test_leaf_hash_covers_fields() {
        let a = Address::new([1; 16]);
        let tx = Transaction::mint(a, 10, "knowledge");
        assert_eq!(tx.leaf_hash(), tx.clone().leaf_hash());

        let mut altered = tx.clone();
        altered.amount = 11;
        assert_ne!(tx.leaf_hash(), altered.leaf_hash());

        let mut altered = tx.clone();
        altered.reason = None;
        assert_ne!(tx.leaf_hash(), altered.leaf_hash());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&TransactionKind::Unstake).unwrap(), "\"unstake\"");
    }
}
