//! Wallet Ledger
//!
//! Owns the monetary policy, the wallet table and the append-only
//! transaction log. Every mutation validates first and then applies all of
//! its effects inside one `&mut self` call, so a failed call leaves the
//! ledger untouched.
//!
//! Invariant: `policy.current_supply == Σ(wallet.balance + wallet.staked)`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EconomyConfig;
use crate::core::hash::Fingerprint;
use crate::core::merkle::{MerkleProof, MerkleTree};
use crate::core::rate::Rate;
use crate::ledger::transaction::{Transaction, TransactionKind};
use crate::ledger::wallet::{Address, BalanceView, Wallet};
use crate::policy::{MarketConditions, MonetaryPolicy, PolicyError, UbiPeriod};

/// Mint reason for staking payouts.
pub const STAKING_REASON: &str = "staking";

/// Mint reason for UBI disbursements.
pub const UBI_REASON: &str = "ubi";

// =============================================================================
// ERRORS
// =============================================================================

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No wallet at this address.
    #[error("wallet not found: {0}")]
    WalletNotFound(Address),

    /// Unstake exceeds the staked amount.
    #[error("insufficient stake: requested {amount}, staked {staked}")]
    InsufficientStake {
        /// Requested unstake.
        amount: u64,
        /// Currently staked.
        staked: u64,
    },

    /// Rejected by the monetary policy.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Ledger audit failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// Issued supply differs from what wallets hold.
    #[error("supply mismatch: issued {supply}, held by wallets {held}")]
    SupplyMismatch {
        /// Supply according to the policy.
        supply: u64,
        /// Σ(balance + staked).
        held: u128,
    },

    /// A wallet's lifetime earnings differ from its logged mints.
    #[error("earned mismatch for {address}: wallet says {earned}, log says {minted}")]
    EarnedMismatch {
        /// Wallet address.
        address: Address,
        /// `wallet.earned`.
        earned: u64,
        /// Σ mint transactions to the wallet.
        minted: u128,
    },

    /// A logged transaction names a wallet the ledger does not hold.
    #[error("transaction {index} references unknown wallet {address}")]
    UnknownWallet {
        /// Log position.
        index: usize,
        /// Missing address.
        address: Address,
    },
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of crediting a reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOutcome {
    /// Wallet balance after the credit
    pub balance: u64,
    /// Tokens minted
    pub minted: u64,
}

/// Balances after a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Sender balance
    pub from: u64,
    /// Recipient balance
    pub to: u64,
}

/// Wallet state after stake or unstake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeOutcome {
    /// Staked amount
    pub staked: u64,
    /// Spendable balance
    pub balance: u64,
}

/// UBI actually paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UbiDistribution {
    /// Tokens per recipient
    pub per_user: u64,
    /// Distinct recipients paid
    pub recipients: u64,
    /// `per_user × recipients`
    pub total_minted: u64,
    /// Requested period
    pub period: UbiPeriod,
}

/// Supply snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyStats {
    /// Issued so far
    pub current: u64,
    /// Hard cap
    pub max: u64,
    /// `max - current`
    pub remaining: u64,
    /// `current / max`
    pub issued_share: Rate,
    /// Wallets in the ledger
    pub wallet_count: u64,
    /// Σ wallet.staked
    pub total_staked: u64,
}

// =============================================================================
// LEDGER
// =============================================================================

/// Wallet ledger.
#[derive(Clone, Debug)]
pub struct Ledger {
    policy: MonetaryPolicy,
    wallets: BTreeMap<Address, Wallet>,
    log: Vec<Transaction>,
}

impl Ledger {
    /// Create an empty ledger from configuration.
    pub fn new(config: &EconomyConfig) -> Self {
        Self::with_policy(MonetaryPolicy::new(config))
    }

    /// Create an empty ledger around an existing policy.
    pub fn with_policy(policy: MonetaryPolicy) -> Self {
        Self {
            policy,
            wallets: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    /// Monetary policy (read-only; mints go through the ledger).
    pub fn policy(&self) -> &MonetaryPolicy {
        &self.policy
    }

    /// Apply one inflation adjustment step.
    pub fn adjust_inflation(&mut self, market: MarketConditions) -> Rate {
        self.policy.adjust_inflation(market)
    }

    // -------------------------------------------------------------------------
    // Wallets
    // -------------------------------------------------------------------------

    /// Create a zero-balance wallet. A user may own several.
    pub fn create_wallet(&mut self, user_id: &str) -> Wallet {
        let mut address = Address::random();
        while self.wallets.contains_key(&address) {
            address = Address::random();
        }

        let wallet = Wallet::new(user_id, address);
        self.wallets.insert(address, wallet.clone());
        info!(user_id, address = %address, "wallet created");
        wallet
    }

    /// Look up a wallet.
    pub fn wallet(&self, address: &Address) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    /// All wallets in address order.
    pub fn wallets(&self) -> impl Iterator<Item = &Wallet> {
        self.wallets.values()
    }

    /// Wallets owned by `user_id`.
    pub fn wallets_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Wallet> + 'a {
        self.wallets.values().filter(move |w| w.user_id == user_id)
    }

    /// Balance projection, or `None` for an unknown address.
    pub fn get_balance(&self, address: &Address) -> Option<BalanceView> {
        self.wallets.get(address).map(Wallet::view)
    }

    fn wallet_mut(&mut self, address: &Address) -> Result<&mut Wallet, LedgerError> {
        self.wallets
            .get_mut(address)
            .ok_or(LedgerError::WalletNotFound(*address))
    }

    fn require_wallet(&self, address: &Address) -> Result<&Wallet, LedgerError> {
        self.wallets
            .get(address)
            .ok_or(LedgerError::WalletNotFound(*address))
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Mint `amount` into the wallet at `address`.
    ///
    /// The wallet is looked up before the policy mint, so an unknown address
    /// never moves supply.
    pub fn mint_reward(
        &mut self,
        address: &Address,
        amount: u64,
        reason: &str,
    ) -> Result<MintOutcome, LedgerError> {
        if !self.wallets.contains_key(address) {
            warn!(address = %address, amount, reason, "mint to unknown wallet rejected");
            return Err(LedgerError::WalletNotFound(*address));
        }

        let receipt = self.policy.mint_tokens(amount, reason)?;
        let wallet = self.wallet_mut(address)?;
        wallet.balance += receipt.minted;
        wallet.earned += receipt.minted;
        let balance = wallet.balance;

        self.log.push(Transaction::mint(*address, receipt.minted, reason));
        Ok(MintOutcome {
            balance,
            minted: receipt.minted,
        })
    }

    /// Move `amount` of spendable balance from `from` to `to`.
    ///
    /// A transfer to oneself is validated and logged but leaves balances as
    /// they were.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<TransferOutcome, LedgerError> {
        let sender_balance = self.require_wallet(from)?.balance;
        self.require_wallet(to)?;

        if let Err(err) = self.policy.validate_transaction(amount, sender_balance) {
            warn!(from = %from, to = %to, amount, "transfer rejected: {}", err);
            return Err(err.into());
        }

        if from != to {
            self.wallet_mut(from)?.balance -= amount;
            self.wallet_mut(to)?.balance += amount;
        }

        self.log.push(Transaction::transfer(*from, *to, amount));
        let outcome = TransferOutcome {
            from: self.require_wallet(from)?.balance,
            to: self.require_wallet(to)?.balance,
        };
        info!(from = %from, to = %to, amount, "transfer applied");
        Ok(outcome)
    }

    /// Lock `amount` of spendable balance.
    pub fn stake(&mut self, address: &Address, amount: u64) -> Result<StakeOutcome, LedgerError> {
        let balance = self.require_wallet(address)?.balance;
        self.policy.validate_transaction(amount, balance)?;

        let wallet = self.wallet_mut(address)?;
        wallet.balance -= amount;
        wallet.staked += amount;
        let outcome = StakeOutcome {
            staked: wallet.staked,
            balance: wallet.balance,
        };

        self.log.push(Transaction::stake(*address, amount));
        info!(address = %address, amount, staked = outcome.staked, "tokens staked");
        Ok(outcome)
    }

    /// Unlock `amount` of staked tokens back into balance.
    pub fn unstake(&mut self, address: &Address, amount: u64) -> Result<StakeOutcome, LedgerError> {
        let staked = self.require_wallet(address)?.staked;
        if amount == 0 {
            return Err(PolicyError::InvalidAmount { amount }.into());
        }
        if amount > staked {
            warn!(address = %address, amount, staked, "unstake rejected");
            return Err(LedgerError::InsufficientStake { amount, staked });
        }

        let wallet = self.wallet_mut(address)?;
        wallet.staked -= amount;
        wallet.balance += amount;
        let outcome = StakeOutcome {
            staked: wallet.staked,
            balance: wallet.balance,
        };

        self.log.push(Transaction::unstake(*address, amount));
        info!(address = %address, amount, staked = outcome.staked, "tokens unstaked");
        Ok(outcome)
    }

    /// Pay `days` of staking yield on the wallet's current stake.
    ///
    /// The yield is minted into spendable balance. Returns the amount paid;
    /// zero yield mints nothing and logs nothing.
    pub fn pay_staking_reward(&mut self, address: &Address, days: u64) -> Result<u64, LedgerError> {
        let staked = self.require_wallet(address)?.staked;
        let reward = self.policy.calculate_staking_reward(staked, days);
        if reward == 0 {
            debug!(address = %address, staked, days, "no staking yield due");
            return Ok(0);
        }
        self.mint_reward(address, reward, STAKING_REASON)?;
        Ok(reward)
    }

    /// Pay one UBI period to every distinct address in `addresses`.
    ///
    /// All-or-nothing: every address must exist and the whole payout must fit
    /// under the cap before anything is minted.
    pub fn distribute_ubi(
        &mut self,
        addresses: &[Address],
        period: UbiPeriod,
    ) -> Result<UbiDistribution, LedgerError> {
        let recipients: BTreeSet<Address> = addresses.iter().copied().collect();
        for address in &recipients {
            self.require_wallet(address)?;
        }

        let projection = self.policy.calculate_ubi(recipients.len() as u64, period)?;
        let recipient_count = recipients.len() as u64;
        let total = projection.per_user.saturating_mul(recipient_count);

        if projection.per_user > 0 {
            self.policy.check_mint(total)?;
            for address in &recipients {
                self.mint_reward(address, projection.per_user, UBI_REASON)?;
            }
        }

        info!(
            recipients = recipient_count,
            per_user = projection.per_user,
            total,
            ?period,
            "UBI distributed"
        );
        Ok(UbiDistribution {
            per_user: projection.per_user,
            recipients: recipient_count,
            total_minted: if projection.per_user > 0 { total } else { 0 },
            period,
        })
    }

    // -------------------------------------------------------------------------
    // Log and reporting
    // -------------------------------------------------------------------------

    /// Full transaction log, oldest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Transactions touching `address`, oldest first.
    pub fn transactions_for(&self, address: Address) -> impl Iterator<Item = &Transaction> {
        self.log.iter().filter(move |tx| tx.involves(&address))
    }

    fn transaction_tree(&self) -> MerkleTree {
        MerkleTree::from_leaf_hashes(self.log.iter().map(Transaction::leaf_hash).collect())
    }

    /// Merkle root over the transaction log.
    pub fn transaction_root(&self) -> Fingerprint {
        self.transaction_tree().root()
    }

    /// Inclusion proof for the transaction at `index`.
    pub fn transaction_proof(&self, index: usize) -> Option<MerkleProof> {
        self.transaction_tree().proof(index)
    }

    /// Supply snapshot.
    pub fn supply_stats(&self) -> SupplyStats {
        let state = self.policy.state();
        SupplyStats {
            current: state.current_supply,
            max: state.max_supply,
            remaining: state.remaining(),
            issued_share: Rate::from_ratio(state.current_supply, state.max_supply),
            wallet_count: self.wallets.len() as u64,
            total_staked: self.wallets.values().map(|w| w.staked).sum(),
        }
    }

    /// Check conservation and log consistency.
    pub fn audit(&self) -> Result<(), AuditError> {
        let supply = self.policy.current_supply();
        let held: u128 = self.wallets.values().map(|w| w.holdings() as u128).sum();
        if held != supply as u128 {
            return Err(AuditError::SupplyMismatch { supply, held });
        }

        let mut minted: BTreeMap<Address, u128> = BTreeMap::new();
        for (index, tx) in self.log.iter().enumerate() {
            for address in [tx.from, tx.to].into_iter().flatten() {
                if !self.wallets.contains_key(&address) {
                    return Err(AuditError::UnknownWallet { index, address });
                }
            }
            if let (TransactionKind::Mint, Some(to)) = (tx.kind, tx.to) {
                *minted.entry(to).or_default() += tx.amount as u128;
            }
        }

        for wallet in self.wallets.values() {
            let logged = minted.get(&wallet.address).copied().unwrap_or(0);
            if logged != wallet.earned as u128 {
                return Err(AuditError::EarnedMismatch {
                    address: wallet.address,
                    earned: wallet.earned,
                    minted: logged,
                });
            }
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(&EconomyConfig::default())
    }
}
