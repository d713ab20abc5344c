//! Monetary Policy Engine
//!
//! Owns the supply state and answers two kinds of question:
//! "is this mint allowed" and "what should this reward/yield be".
//! It knows nothing about wallets.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{EconomyConfig, MAX_INFLATION_RATE, MIN_INFLATION_RATE};
use crate::core::rate::Rate;

/// Days per year for staking accrual.
pub const DAYS_PER_YEAR: u64 = 365;

/// Inflation step when demand exceeds supply: ×1.1
pub const INFLATION_STEP_UP: Rate = Rate::from_ppm(1_100_000);

/// Inflation step otherwise: ×0.9
pub const INFLATION_STEP_DOWN: Rate = Rate::from_ppm(900_000);

// =============================================================================
// SUPPLY STATE
// =============================================================================

/// Global supply state.
///
/// `current_supply <= max_supply` always holds; every increment is exactly
/// one accepted [`MonetaryPolicy::mint_tokens`] call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyState {
    /// Hard cap
    pub max_supply: u64,
    /// Tokens issued so far
    pub current_supply: u64,
    /// Reward before halving
    pub block_reward: u64,
    /// Heights per halving
    pub halving_interval: u64,
    /// Current inflation rate, kept within [0.01, 0.05]
    pub inflation_rate: Rate,
    /// UBI pool share of supply
    pub ubi_rate: Rate,
    /// Annual staking yield
    pub staking_apy: Rate,
}

impl SupplyState {
    /// Fresh state from configuration (nothing issued yet).
    pub fn from_config(config: &EconomyConfig) -> Self {
        Self {
            max_supply: config.max_supply,
            current_supply: 0,
            block_reward: config.block_reward,
            halving_interval: config.halving_interval,
            inflation_rate: config.inflation_rate,
            ubi_rate: config.ubi_rate,
            staking_apy: config.staking_apy,
        }
    }

    /// Tokens that can still be minted.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.max_supply - self.current_supply
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Accepted mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Tokens minted
    pub minted: u64,
    /// Supply after the mint
    pub new_supply: u64,
}

/// UBI distribution period. Echoed back, not used to scale the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UbiPeriod {
    /// Once per day
    Daily,
    /// Once per week
    Weekly,
    /// Once per month
    #[default]
    Monthly,
    /// Once per year
    Yearly,
}

/// Read-only UBI projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UbiProjection {
    /// `floor(current_supply × ubi_rate)`
    pub total_ubi: u64,
    /// `floor(total_ubi / user_count)`
    pub per_user: u64,
    /// Requested period
    pub period: UbiPeriod,
}

/// Observed market pressure for inflation adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConditions {
    /// Demand signal
    pub demand: u64,
    /// Supply signal
    pub supply: u64,
}

/// Policy errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Mint would breach the supply cap.
    #[error("mint of {requested} would exceed max supply {max} (current {current})")]
    SupplyExceeded {
        /// Requested amount.
        requested: u64,
        /// Supply at the time of the request.
        current: u64,
        /// Supply cap.
        max: u64,
    },

    /// Amount must be strictly positive.
    #[error("invalid amount {amount}: must be greater than zero")]
    InvalidAmount {
        /// Offending amount.
        amount: u64,
    },

    /// Debit exceeds balance.
    #[error("insufficient balance: requested {amount}, available {balance}")]
    InsufficientBalance {
        /// Requested debit.
        amount: u64,
        /// Available balance.
        balance: u64,
    },

    /// UBI requested for zero users.
    #[error("UBI requires at least one recipient")]
    NoRecipients,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Monetary policy engine.
#[derive(Clone, Debug)]
pub struct MonetaryPolicy {
    state: SupplyState,
}

impl MonetaryPolicy {
    /// Create engine from configuration.
    pub fn new(config: &EconomyConfig) -> Self {
        Self {
            state: SupplyState::from_config(config),
        }
    }

    /// Current supply state.
    pub fn state(&self) -> &SupplyState {
        &self.state
    }

    /// Tokens issued so far.
    pub fn current_supply(&self) -> u64 {
        self.state.current_supply
    }

    /// Current inflation rate.
    pub fn inflation_rate(&self) -> Rate {
        self.state.inflation_rate
    }

    /// Block reward at `height`: `block_reward / 2^floor(height / halving_interval)`.
    ///
    /// Integer halving; reaches zero once the shifted reward underflows.
    pub fn calculate_block_reward(&self, height: u64) -> u64 {
        let halvings = height / self.state.halving_interval.max(1);
        u32::try_from(halvings)
            .ok()
            .and_then(|h| self.state.block_reward.checked_shr(h))
            .unwrap_or(0)
    }

    /// Check a mint without applying it.
    pub fn check_mint(&self, amount: u64) -> Result<(), PolicyError> {
        if amount == 0 {
            return Err(PolicyError::InvalidAmount { amount });
        }
        if amount > self.state.remaining() {
            return Err(PolicyError::SupplyExceeded {
                requested: amount,
                current: self.state.current_supply,
                max: self.state.max_supply,
            });
        }
        Ok(())
    }

    /// Mint `amount` new tokens.
    ///
    /// Fails closed: a mint that would exceed the cap changes nothing, not
    /// even a partial mint of the remaining headroom. Every minting path
    /// (knowledge rewards, staking payouts, UBI) goes through here.
    pub fn mint_tokens(&mut self, amount: u64, reason: &str) -> Result<MintReceipt, PolicyError> {
        if let Err(err) = self.check_mint(amount) {
            warn!(amount, reason, current = self.state.current_supply, "mint rejected: {}", err);
            return Err(err);
        }

        self.state.current_supply += amount;
        info!(
            amount,
            reason,
            new_supply = self.state.current_supply,
            max_supply = self.state.max_supply,
            "tokens minted"
        );

        Ok(MintReceipt {
            minted: amount,
            new_supply: self.state.current_supply,
        })
    }

    /// Project the UBI pool for `user_count` recipients. Does not mint.
    pub fn calculate_ubi(
        &self,
        user_count: u64,
        period: UbiPeriod,
    ) -> Result<UbiProjection, PolicyError> {
        if user_count == 0 {
            return Err(PolicyError::NoRecipients);
        }
        let total_ubi = self.state.ubi_rate.apply(self.state.current_supply);
        Ok(UbiProjection {
            total_ubi,
            per_user: total_ubi / user_count,
            period,
        })
    }

    /// Simple daily-rate yield: `floor(staked × apy / 365 × days)`.
    pub fn calculate_staking_reward(&self, staked_amount: u64, days: u64) -> u64 {
        let numerator = staked_amount as u128 * self.state.staking_apy.ppm() as u128 * days as u128;
        let denominator = Rate::ONE.ppm() as u128 * DAYS_PER_YEAR as u128;
        u64::try_from(numerator / denominator).unwrap_or(u64::MAX)
    }

    /// One multiplicative inflation step, clamped to [0.01, 0.05].
    pub fn adjust_inflation(&mut self, market: MarketConditions) -> Rate {
        let previous = self.state.inflation_rate;
        let step = if market.demand > market.supply {
            INFLATION_STEP_UP
        } else {
            INFLATION_STEP_DOWN
        };
        self.state.inflation_rate = previous
            .mul_rate(step)
            .clamp_to(MIN_INFLATION_RATE, MAX_INFLATION_RATE);

        debug!(
            demand = market.demand,
            supply = market.supply,
            previous = %previous,
            current = %self.state.inflation_rate,
            "inflation adjusted"
        );
        self.state.inflation_rate
    }

    /// Amount must be positive and covered by `balance`.
    pub fn validate_transaction(&self, amount: u64, balance: u64) -> Result<(), PolicyError> {
        if amount == 0 {
            return Err(PolicyError::InvalidAmount { amount });
        }
        if amount > balance {
            return Err(PolicyError::InsufficientBalance { amount, balance });
        }
        Ok(())
    }
}

impl Default for MonetaryPolicy {
    fn default() -> Self {
        Self::new(&EconomyConfig::default())
    }
}
