//! # Proof-of-Knowledge Token Economy
//!
//! Knowledge verification, monetary policy and a wallet ledger for a
//! learning platform whose tokens are minted for demonstrated knowledge.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     POK ECONOMY ENGINE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rate.rs     - Parts-per-million rates                   │
//! │  ├── hash.rs     - Domain-separated SHA-256 fingerprints     │
//! │  └── merkle.rs   - Transaction log commitments               │
//! │                                                              │
//! │  knowledge/      - Proof-of-Knowledge verifier               │
//! │  ├── challenge.rs- Question banks and challenges             │
//! │  ├── verifier.rs - Scoring and reward calculation            │
//! │  └── record.rs   - Fingerprinted mined records               │
//! │                                                              │
//! │  policy/         - Monetary policy engine                    │
//! │  └── monetary.rs - Supply cap, halving, UBI, staking         │
//! │                                                              │
//! │  ledger/         - Wallet ledger                             │
//! │  ├── wallet.rs   - Addresses and wallets                     │
//! │  ├── transaction.rs - Append-only log entries                │
//! │  └── book.rs     - Mint, transfer, stake, audit              │
//! │                                                              │
//! │  service/        - Shared async service                      │
//! │  ├── economy.rs  - Ledger behind one RwLock                  │
//! │  └── protocol.rs - Request/response messages                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supply Guarantee
//!
//! All token amounts are integers and all rates are fixed-point, so every
//! reward, yield and projection floors identically on every platform.
//! Supply only grows through `MonetaryPolicy::mint_tokens`, the cap is
//! never exceeded, and inside a `Ledger` the issued supply always equals
//! the sum of wallet balances and stakes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod knowledge;
pub mod ledger;
pub mod policy;
pub mod service;

// Re-export commonly used types
pub use config::{ConfigError, EconomyConfig, RewardSchedule};
pub use crate::core::rate::{Rate, RATE_SCALE};
pub use knowledge::{Challenge, KnowledgeVerifier, MinedRecord, MiningError, Proof};
pub use ledger::{Address, BalanceView, Ledger, LedgerError, Wallet};
pub use policy::{MonetaryPolicy, PolicyError, UbiPeriod};
pub use service::EconomyService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
