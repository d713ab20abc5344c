//! Monetary Policy
//!
//! Supply cap, halving curve, inflation adjustment, staking yield and UBI
//! projection. Wallet-agnostic: the ledger asks, the policy answers.

pub mod monetary;

pub use monetary::{
    MarketConditions, MintReceipt, MonetaryPolicy, PolicyError, SupplyState, UbiPeriod,
    UbiProjection,
};
