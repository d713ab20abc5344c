//! Wallet Ledger
//!
//! Wallets, balances and the append-only transaction log. All supply
//! changes are delegated to the monetary policy the ledger owns.

pub mod book;
pub mod transaction;
pub mod wallet;

pub use book::{
    AuditError, Ledger, LedgerError, MintOutcome, StakeOutcome, SupplyStats, TransferOutcome,
    UbiDistribution, STAKING_REASON, UBI_REASON,
};
pub use transaction::{Transaction, TransactionKind};
pub use wallet::{Address, BalanceView, ParseAddressError, Wallet};
