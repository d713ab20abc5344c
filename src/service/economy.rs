//! Economy Service
//!
//! Shares one [`Ledger`] across tasks behind a single `RwLock`: writes for
//! mutations, reads for projections. Challenges issued here are recorded,
//! and each one can be credited at most once.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{EconomyConfig, RewardSchedule};
use crate::core::hash::Fingerprint;
use crate::core::rate::Rate;
use crate::knowledge::{Challenge, KnowledgeVerifier, MinedRecord, MiningError, Proof};
use crate::ledger::{
    Address, AuditError, BalanceView, Ledger, LedgerError, MintOutcome, StakeOutcome, SupplyStats,
    Transaction, TransferOutcome, UbiDistribution, Wallet,
};
use crate::policy::{MarketConditions, PolicyError, UbiPeriod, UbiProjection};

/// Mint reason for knowledge rewards.
pub const KNOWLEDGE_REASON: &str = "knowledge";

/// A mined record together with the credit it produced.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RewardedProof {
    /// Sealed record
    pub record: MinedRecord,
    /// Wallet credit
    pub outcome: MintOutcome,
}

/// State guarded by the service lock.
#[derive(Debug)]
struct EconomyState {
    ledger: Ledger,
    /// Accepted proofs so far; the halving schedule's height.
    proofs_rewarded: u64,
    /// Challenges issued by this service, by id.
    issued: BTreeMap<Uuid, Challenge>,
    /// Challenge ids that already produced a reward.
    rewarded: BTreeSet<Uuid>,
}

/// Shared token economy.
pub struct EconomyService {
    config: EconomyConfig,
    verifier: KnowledgeVerifier,
    state: RwLock<EconomyState>,
}

impl EconomyService {
    /// Create a service with the standard question bank.
    pub fn new(config: EconomyConfig) -> Self {
        let verifier = KnowledgeVerifier::new(&config);
        Self::with_verifier(config, verifier)
    }

    /// Create a service with a custom verifier.
    pub fn with_verifier(config: EconomyConfig, verifier: KnowledgeVerifier) -> Self {
        let ledger = Ledger::new(&config);
        Self {
            config,
            verifier,
            state: RwLock::new(EconomyState {
                ledger,
                proofs_rewarded: 0,
                issued: BTreeMap::new(),
                rewarded: BTreeSet::new(),
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Knowledge verifier.
    pub fn verifier(&self) -> &KnowledgeVerifier {
        &self.verifier
    }

    // =========================================================================
    // KNOWLEDGE
    // =========================================================================

    /// Issue a challenge and remember it for [`Self::mine_and_reward`].
    pub async fn generate_challenge(&self, student_id: &str, subject: &str) -> Challenge {
        let challenge = self.verifier.generate_challenge(student_id, subject);
        self.state
            .write()
            .await
            .issued
            .insert(challenge.id, challenge.clone());
        challenge
    }

    /// Score answers without rewarding.
    pub fn verify_proof<S: AsRef<str>>(&self, challenge: &Challenge, answers: &[S]) -> Proof {
        self.verifier.verify_proof(challenge, answers)
    }

    /// Verify and seal a record at the flat base reward. Credits nothing.
    pub fn mine<S: AsRef<str>>(
        &self,
        challenge: &Challenge,
        answers: &[S],
        student_level: u32,
    ) -> Result<MinedRecord, MiningError> {
        self.verifier.mine(challenge, answers, student_level)
    }

    /// Verify, seal and credit the reward to `address` in one write-locked step.
    ///
    /// The challenge must be one this service issued, unchanged and not yet
    /// rewarded, and `address` must belong to the challenged student.
    /// The base reward follows the configured schedule. Under
    /// [`RewardSchedule::Halving`] the height is the number of proofs
    /// rewarded so far. A zero reward credits nothing but still counts.
    pub async fn mine_and_reward<S: AsRef<str>>(
        &self,
        challenge: &Challenge,
        answers: &[S],
        student_level: u32,
        address: &Address,
    ) -> Result<RewardedProof, MiningError> {
        let mut state = self.state.write().await;

        self.verifier.check_challenge(challenge)?;
        match state.issued.get(&challenge.id) {
            None => return Err(MiningError::UnknownChallenge(challenge.id)),
            Some(issued) if issued != challenge => {
                warn!(challenge_id = %challenge.id, "challenge differs from the issued one");
                return Err(MiningError::ForgedChallenge(challenge.id));
            }
            Some(_) => {}
        }
        if state.rewarded.contains(&challenge.id) {
            warn!(challenge_id = %challenge.id, "challenge replay rejected");
            return Err(MiningError::AlreadyRewarded(challenge.id));
        }

        let owner = state
            .ledger
            .wallet(address)
            .map(|wallet| wallet.user_id.clone())
            .ok_or(LedgerError::WalletNotFound(*address))?;
        if owner != challenge.student_id {
            return Err(MiningError::StudentMismatch {
                student_id: challenge.student_id.clone(),
                owner,
            });
        }

        let base_reward = match self.config.reward_schedule {
            RewardSchedule::Flat => self.verifier.base_reward(),
            RewardSchedule::Halving => {
                let height = state.proofs_rewarded;
                state.ledger.policy().calculate_block_reward(height)
            }
        };
        let record = self
            .verifier
            .mine_with_base(challenge, answers, student_level, base_reward)?;

        let outcome = if record.reward > 0 {
            state.ledger.mint_reward(address, record.reward, KNOWLEDGE_REASON)?
        } else {
            let view = state
                .ledger
                .get_balance(address)
                .ok_or(LedgerError::WalletNotFound(*address))?;
            warn!(address = %address, base_reward, "proof accepted with zero reward");
            MintOutcome {
                balance: view.balance,
                minted: 0,
            }
        };
        state.proofs_rewarded += 1;
        state.rewarded.insert(challenge.id);

        info!(
            record_id = %record.id,
            address = %address,
            reward = outcome.minted,
            height = state.proofs_rewarded,
            "knowledge reward credited"
        );
        Ok(RewardedProof { record, outcome })
    }

    /// Accepted proofs so far.
    pub async fn proofs_rewarded(&self) -> u64 {
        self.state.read().await.proofs_rewarded
    }

    // =========================================================================
    // POLICY
    // =========================================================================

    /// Block reward at `height`.
    pub async fn calculate_block_reward(&self, height: u64) -> u64 {
        self.state.read().await.ledger.policy().calculate_block_reward(height)
    }

    /// UBI projection at current supply.
    pub async fn calculate_ubi(
        &self,
        user_count: u64,
        period: UbiPeriod,
    ) -> Result<UbiProjection, PolicyError> {
        self.state
            .read()
            .await
            .ledger
            .policy()
            .calculate_ubi(user_count, period)
    }

    /// Staking yield projection.
    pub async fn calculate_staking_reward(&self, staked: u64, days: u64) -> u64 {
        self.state
            .read()
            .await
            .ledger
            .policy()
            .calculate_staking_reward(staked, days)
    }

    /// One inflation adjustment step.
    pub async fn adjust_inflation(&self, market: MarketConditions) -> Rate {
        self.state.write().await.ledger.adjust_inflation(market)
    }

    // =========================================================================
    // LEDGER
    // =========================================================================

    /// Create a wallet.
    pub async fn create_wallet(&self, user_id: &str) -> Wallet {
        self.state.write().await.ledger.create_wallet(user_id)
    }

    /// Credit a reward.
    pub async fn mint_reward(
        &self,
        address: &Address,
        amount: u64,
        reason: &str,
    ) -> Result<MintOutcome, LedgerError> {
        self.state
            .write()
            .await
            .ledger
            .mint_reward(address, amount, reason)
    }

    /// Transfer between wallets.
    pub async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<TransferOutcome, LedgerError> {
        self.state.write().await.ledger.transfer(from, to, amount)
    }

    /// Lock balance.
    pub async fn stake(&self, address: &Address, amount: u64) -> Result<StakeOutcome, LedgerError> {
        self.state.write().await.ledger.stake(address, amount)
    }

    /// Unlock stake.
    pub async fn unstake(
        &self,
        address: &Address,
        amount: u64,
    ) -> Result<StakeOutcome, LedgerError> {
        self.state.write().await.ledger.unstake(address, amount)
    }

    /// Balance projection.
    pub async fn get_balance(&self, address: &Address) -> Option<BalanceView> {
        self.state.read().await.ledger.get_balance(address)
    }

    /// Pay staking yield.
    pub async fn pay_staking_reward(
        &self,
        address: &Address,
        days: u64,
    ) -> Result<u64, LedgerError> {
        self.state
            .write()
            .await
            .ledger
            .pay_staking_reward(address, days)
    }

    /// Pay one UBI period.
    pub async fn distribute_ubi(
        &self,
        addresses: &[Address],
        period: UbiPeriod,
    ) -> Result<UbiDistribution, LedgerError> {
        self.state
            .write()
            .await
            .ledger
            .distribute_ubi(addresses, period)
    }

    /// Supply snapshot.
    pub async fn supply_stats(&self) -> SupplyStats {
        self.state.read().await.ledger.supply_stats()
    }

    /// Transactions touching `address`, oldest first.
    pub async fn transactions_for(&self, address: Address) -> Vec<Transaction> {
        self.state
            .read()
            .await
            .ledger
            .transactions_for(address)
            .cloned()
            .collect()
    }

    /// Merkle root over the transaction log.
    pub async fn transaction_root(&self) -> Fingerprint {
        self.state.read().await.ledger.transaction_root()
    }

    /// Run the ledger audit.
    pub async fn audit(&self) -> Result<(), AuditError> {
        self.state.read().await.ledger.audit()
    }

    /// Clone of the current ledger.
    pub async fn snapshot(&self) -> Ledger {
        self.state.read().await.ledger.clone()
    }
}

impl Default for EconomyService {
    fn default() -> Self {
        Self::new(EconomyConfig::default())
    }
}
