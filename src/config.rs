//! Engine Configuration
//!
//! All recognized economy options with their defaults. Loaded from the
//! environment by the binary; tests build configs directly.

use serde::{Deserialize, Serialize};

use crate::core::rate::{ParseRateError, Rate};

// =============================================================================
// DEFAULTS (integer literals only, rates in ppm)
// =============================================================================

/// Hard ceiling on issuable tokens.
pub const DEFAULT_MAX_SUPPLY: u64 = 21_000_000;

/// Block reward before any halving.
pub const DEFAULT_BLOCK_REWARD: u64 = 50;

/// Heights between halvings.
pub const DEFAULT_HALVING_INTERVAL: u64 = 210_000;

/// Starting inflation rate: 0.02
pub const DEFAULT_INFLATION_RATE: Rate = Rate::from_ppm(20_000);

/// Inflation floor: 0.01
pub const MIN_INFLATION_RATE: Rate = Rate::from_ppm(10_000);

/// Inflation cap: 0.05
pub const MAX_INFLATION_RATE: Rate = Rate::from_ppm(50_000);

/// UBI pool share of current supply: 0.01
pub const DEFAULT_UBI_RATE: Rate = Rate::from_ppm(10_000);

/// Staking APY: 0.08
pub const DEFAULT_STAKING_APY: Rate = Rate::from_ppm(80_000);

/// Minimum score for a valid proof: 0.70 (inclusive)
pub const DEFAULT_PROOF_THRESHOLD: Rate = Rate::from_ppm(700_000);

/// Flat knowledge-mining reward.
pub const DEFAULT_BASE_REWARD: u64 = 10;

/// Reward bonus per student level: 0.1
pub const DEFAULT_LEVEL_BONUS: Rate = Rate::from_ppm(100_000);

/// Difficulty stamped on every challenge.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Which curve knowledge-mining rewards follow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardSchedule {
    /// `base_reward` for every proof. Authoritative default.
    #[default]
    Flat,
    /// Block-reward curve, with the number of rewarded proofs as height.
    Halving,
}

/// Configuration for the whole economy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Hard supply cap
    pub max_supply: u64,
    /// Base block reward
    pub block_reward: u64,
    /// Heights between halvings
    pub halving_interval: u64,
    /// Initial inflation rate, within [0.01, 0.05]
    pub inflation_rate: Rate,
    /// UBI share of current supply per period
    pub ubi_rate: Rate,
    /// Annual staking yield
    pub staking_apy: Rate,
    /// Minimum proof score (inclusive)
    pub proof_threshold: Rate,
    /// Flat knowledge reward
    pub base_reward: u64,
    /// Bonus per student level
    pub level_bonus: Rate,
    /// Challenge difficulty
    pub difficulty: u32,
    /// Knowledge reward curve
    pub reward_schedule: RewardSchedule,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            max_supply: DEFAULT_MAX_SUPPLY,
            block_reward: DEFAULT_BLOCK_REWARD,
            halving_interval: DEFAULT_HALVING_INTERVAL,
            inflation_rate: DEFAULT_INFLATION_RATE,
            ubi_rate: DEFAULT_UBI_RATE,
            staking_apy: DEFAULT_STAKING_APY,
            proof_threshold: DEFAULT_PROOF_THRESHOLD,
            base_reward: DEFAULT_BASE_REWARD,
            level_bonus: DEFAULT_LEVEL_BONUS,
            difficulty: DEFAULT_DIFFICULTY,
            reward_schedule: RewardSchedule::Flat,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Rate variable could not be parsed.
    #[error("invalid rate for {var}: {source}")]
    InvalidRate {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        source: ParseRateError,
    },

    /// Max supply must be positive.
    #[error("max_supply must be greater than zero")]
    ZeroMaxSupply,

    /// Halving interval must be positive.
    #[error("halving_interval must be greater than zero")]
    ZeroHalvingInterval,

    /// Inflation rate outside [0.01, 0.05].
    #[error("inflation_rate {0} outside [0.01, 0.05]")]
    InflationOutOfBounds(Rate),

    /// Proof threshold above 1.0.
    #[error("proof_threshold {0} exceeds 1.0")]
    ThresholdAboveOne(Rate),
}

impl EconomyConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables keep their defaults; rates are decimals (`POK_STAKING_APY=0.08`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_int(&lookup, "POK_MAX_SUPPLY")? {
            config.max_supply = v;
        }
        if let Some(v) = parse_int(&lookup, "POK_BLOCK_REWARD")? {
            config.block_reward = v;
        }
        if let Some(v) = parse_int(&lookup, "POK_HALVING_INTERVAL")? {
            config.halving_interval = v;
        }
        if let Some(v) = parse_rate(&lookup, "POK_INFLATION_RATE")? {
            config.inflation_rate = v;
        }
        if let Some(v) = parse_rate(&lookup, "POK_UBI_RATE")? {
            config.ubi_rate = v;
        }
        if let Some(v) = parse_rate(&lookup, "POK_STAKING_APY")? {
            config.staking_apy = v;
        }
        if let Some(v) = parse_rate(&lookup, "POK_PROOF_THRESHOLD")? {
            config.proof_threshold = v;
        }
        if let Some(v) = parse_int(&lookup, "POK_BASE_REWARD")? {
            config.base_reward = v;
        }
        if let Some(v) = parse_rate(&lookup, "POK_LEVEL_BONUS")? {
            config.level_bonus = v;
        }
        if let Some(v) = parse_int(&lookup, "POK_DIFFICULTY")? {
            config.difficulty = u32::try_from(v).map_err(|_| ConfigError::InvalidValue {
                var: "POK_DIFFICULTY",
                value: v.to_string(),
            })?;
        }
        if let Some(raw) = lookup("POK_REWARD_SCHEDULE") {
            let normalized = raw.trim().to_ascii_lowercase();
            config.reward_schedule = match normalized.as_str() {
                "flat" => RewardSchedule::Flat,
                "halving" => RewardSchedule::Halving,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "POK_REWARD_SCHEDULE",
                        value: raw,
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_supply == 0 {
            return Err(ConfigError::ZeroMaxSupply);
        }
        if self.halving_interval == 0 {
            return Err(ConfigError::ZeroHalvingInterval);
        }
        if self.inflation_rate < MIN_INFLATION_RATE || self.inflation_rate > MAX_INFLATION_RATE {
            return Err(ConfigError::InflationOutOfBounds(self.inflation_rate));
        }
        if self.proof_threshold > Rate::ONE {
            return Err(ConfigError::ThresholdAboveOne(self.proof_threshold));
        }
        Ok(())
    }
}

fn parse_int<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .replace('_', "")
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}

fn parse_rate<F>(lookup: &F, var: &'static str) -> Result<Option<Rate>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|source| ConfigError::InvalidRate { var, source }),
    }
}
