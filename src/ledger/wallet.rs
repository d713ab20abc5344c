//! Wallets and Addresses

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet address: 128 random bits, rendered as 32 lowercase hex chars.
///
/// Implements Ord so the wallet table iterates in a stable order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub [u8; 16]);

impl Address {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Uniformly random address.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// First 4 bytes in hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Error parsing an address string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address {0:?}: expected 32 hex characters")]
pub struct ParseAddressError(pub String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|_| ParseAddressError(s.to_string()))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| ParseAddressError(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A user's wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owner (not unique: one user may hold several wallets)
    pub user_id: String,
    /// Primary key in the ledger
    pub address: Address,
    /// Spendable tokens
    pub balance: u64,
    /// Locked tokens
    pub staked: u64,
    /// Lifetime minted to this wallet (monotone)
    pub earned: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Fresh zero-balance wallet.
    pub fn new(user_id: &str, address: Address) -> Self {
        Self {
            user_id: user_id.to_string(),
            address,
            balance: 0,
            staked: 0,
            earned: 0,
            created_at: Utc::now(),
        }
    }

    /// Value held: `balance + staked`.
    #[inline]
    pub fn holdings(&self) -> u64 {
        self.balance + self.staked
    }

    /// Read-only projection.
    pub fn view(&self) -> BalanceView {
        BalanceView {
            balance: self.balance,
            staked: self.staked,
            earned: self.earned,
        }
    }
}

/// Balance projection returned by `get_balance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    /// Spendable tokens
    pub balance: u64,
    /// Locked tokens
    pub staked: u64,
    /// Lifetime minted
    pub earned: u64,
}
