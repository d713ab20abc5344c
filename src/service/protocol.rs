//! Request / Response Protocol
//!
//! Message layer an external HTTP or RPC surface wraps. JSON (internally
//! tagged) is the primary encoding; bincode helpers are provided for flat
//! payloads.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::rate::Rate;
use crate::knowledge::{Challenge, MinedRecord, MiningError, Proof};
use crate::ledger::{
    Address, AuditError, BalanceView, LedgerError, MintOutcome, StakeOutcome, SupplyStats,
    Transaction, TransferOutcome, UbiDistribution, Wallet,
};
use crate::policy::{MarketConditions, PolicyError, UbiPeriod, UbiProjection};
use crate::service::economy::{EconomyService, RewardedProof};

// =============================================================================
// REQUESTS
// =============================================================================

/// Request to the economy service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Issue a challenge.
    GenerateChallenge {
        /// Student identifier
        student_id: String,
        /// Requested subject
        subject: String,
    },
    /// Score answers.
    VerifyProof {
        /// Issued challenge
        challenge: Challenge,
        /// Answers in question order
        answers: Vec<String>,
    },
    /// Verify and seal without crediting.
    Mine {
        /// Issued challenge
        challenge: Challenge,
        /// Answers in question order
        answers: Vec<String>,
        /// Student level
        student_level: u32,
    },
    /// Verify, seal and credit.
    MineAndReward {
        /// Issued challenge
        challenge: Challenge,
        /// Answers in question order
        answers: Vec<String>,
        /// Student level
        student_level: u32,
        /// Wallet to credit
        address: Address,
    },
    /// Block reward at a height.
    CalculateBlockReward {
        /// Height
        height: u64,
    },
    /// UBI projection.
    CalculateUbi {
        /// Recipients
        user_count: u64,
        /// Period
        #[serde(default)]
        period: UbiPeriod,
    },
    /// Staking yield projection.
    CalculateStakingReward {
        /// Staked amount
        staked: u64,
        /// Days staked
        days: u64,
    },
    /// One inflation step.
    AdjustInflation {
        /// Demand signal
        demand: u64,
        /// Supply signal
        supply: u64,
    },
    /// Create a wallet.
    CreateWallet {
        /// Owner
        user_id: String,
    },
    /// Credit a reward.
    MintReward {
        /// Wallet to credit
        address: Address,
        /// Amount
        amount: u64,
        /// Mint reason
        reason: String,
    },
    /// Transfer balance.
    Transfer {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Amount
        amount: u64,
    },
    /// Lock balance.
    Stake {
        /// Wallet
        address: Address,
        /// Amount
        amount: u64,
    },
    /// Unlock stake.
    Unstake {
        /// Wallet
        address: Address,
        /// Amount
        amount: u64,
    },
    /// Balance lookup.
    GetBalance {
        /// Wallet
        address: Address,
    },
    /// Pay staking yield.
    PayStakingReward {
        /// Wallet
        address: Address,
        /// Days of yield
        days: u64,
    },
    /// Pay one UBI period.
    DistributeUbi {
        /// Recipients
        addresses: Vec<Address>,
        /// Period
        #[serde(default)]
        period: UbiPeriod,
    },
    /// Transactions touching a wallet.
    Transactions {
        /// Wallet
        address: Address,
    },
    /// Supply snapshot.
    SupplyStats,
    /// Transaction log commitment.
    TransactionRoot,
    /// Run the ledger audit.
    Audit,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Response from the economy service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Issued challenge.
    Challenge(Challenge),
    /// Scored proof.
    Proof(Proof),
    /// Sealed record.
    Mined(MinedRecord),
    /// Sealed and credited record.
    Rewarded(RewardedProof),
    /// Block reward or staking yield.
    Amount {
        /// Token amount
        amount: u64,
    },
    /// UBI projection.
    Ubi(UbiProjection),
    /// New inflation rate.
    Inflation {
        /// Rate after the step
        rate: Rate,
    },
    /// Created wallet.
    Wallet(Wallet),
    /// Credit applied.
    Minted(MintOutcome),
    /// Transfer applied.
    Transferred(TransferOutcome),
    /// Stake or unstake applied.
    Staked(StakeOutcome),
    /// Balance lookup (absent for unknown wallets).
    Balance {
        /// Balance view
        balance: Option<BalanceView>,
    },
    /// UBI paid.
    UbiDistributed(UbiDistribution),
    /// Transaction list.
    Transactions {
        /// Oldest first
        transactions: Vec<Transaction>,
    },
    /// Supply snapshot.
    SupplyStats(SupplyStats),
    /// Transaction log root, hex.
    TransactionRoot {
        /// Hex-encoded root
        root: String,
    },
    /// Audit passed.
    AuditPassed,
    /// Request failed.
    Error(ServiceError),
}

/// Service error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request.
    InvalidInput,
    /// Proof score below threshold.
    InsufficientProof,
    /// Challenge differs from the one issued.
    ForgedChallenge,
    /// Challenge was never issued.
    UnknownChallenge,
    /// Challenge already rewarded.
    ChallengeAlreadyRewarded,
    /// Target wallet not owned by the challenged student.
    StudentMismatch,
    /// Unknown wallet address.
    WalletNotFound,
    /// Unstake beyond staked amount.
    InsufficientStake,
    /// Debit beyond balance.
    InsufficientBalance,
    /// Mint would breach the supply cap.
    SupplyExceeded,
    /// Zero amount.
    InvalidAmount,
    /// UBI for zero recipients.
    NoRecipients,
    /// Ledger audit failed.
    AuditFailed,
}

impl ServiceError {
    fn new(code: ErrorCode, error: &impl std::fmt::Display) -> Self {
        Self {
            code,
            message: error.to_string(),
        }
    }
}

impl From<&PolicyError> for ServiceError {
    fn from(err: &PolicyError) -> Self {
        let code = match err {
            PolicyError::SupplyExceeded { .. } => ErrorCode::SupplyExceeded,
            PolicyError::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            PolicyError::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            PolicyError::NoRecipients => ErrorCode::NoRecipients,
        };
        Self::new(code, err)
    }
}

impl From<&LedgerError> for ServiceError {
    fn from(err: &LedgerError) -> Self {
        match err {
            LedgerError::WalletNotFound(_) => Self::new(ErrorCode::WalletNotFound, err),
            LedgerError::InsufficientStake { .. } => Self::new(ErrorCode::InsufficientStake, err),
            LedgerError::Policy(policy) => policy.into(),
        }
    }
}

impl From<&MiningError> for ServiceError {
    fn from(err: &MiningError) -> Self {
        match err {
            MiningError::InsufficientProof { .. } => Self::new(ErrorCode::InsufficientProof, err),
            MiningError::ForgedChallenge(_) => Self::new(ErrorCode::ForgedChallenge, err),
            MiningError::UnknownChallenge(_) => Self::new(ErrorCode::UnknownChallenge, err),
            MiningError::AlreadyRewarded(_) => {
                Self::new(ErrorCode::ChallengeAlreadyRewarded, err)
            }
            MiningError::StudentMismatch { .. } => Self::new(ErrorCode::StudentMismatch, err),
            MiningError::Ledger(ledger) => ledger.into(),
        }
    }
}

impl From<&AuditError> for ServiceError {
    fn from(err: &AuditError) -> Self {
        Self::new(ErrorCode::AuditFailed, err)
    }
}

impl Response {
    fn from_result<T, E>(result: Result<T, E>, ok: impl FnOnce(T) -> Response) -> Response
    where
        for<'a> ServiceError: From<&'a E>,
    {
        match result {
            Ok(value) => ok(value),
            Err(err) => Response::Error(ServiceError::from(&err)),
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl EconomyService {
    /// Dispatch one request.
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::GenerateChallenge { student_id, subject } => {
                Response::Challenge(self.generate_challenge(&student_id, &subject).await)
            }
            Request::VerifyProof { challenge, answers } => {
                Response::Proof(self.verify_proof(&challenge, &answers))
            }
            Request::Mine {
                challenge,
                answers,
                student_level,
            } => Response::from_result(
                self.mine(&challenge, &answers, student_level),
                Response::Mined,
            ),
            Request::MineAndReward {
                challenge,
                answers,
                student_level,
                address,
            } => Response::from_result(
                self.mine_and_reward(&challenge, &answers, student_level, &address).await,
                Response::Rewarded,
            ),
            Request::CalculateBlockReward { height } => Response::Amount {
                amount: self.calculate_block_reward(height).await,
            },
            Request::CalculateUbi { user_count, period } => {
                Response::from_result(self.calculate_ubi(user_count, period).await, Response::Ubi)
            }
            Request::CalculateStakingReward { staked, days } => Response::Amount {
                amount: self.calculate_staking_reward(staked, days).await,
            },
            Request::AdjustInflation { demand, supply } => Response::Inflation {
                rate: self.adjust_inflation(MarketConditions { demand, supply }).await,
            },
            Request::CreateWallet { user_id } => {
                Response::Wallet(self.create_wallet(&user_id).await)
            }
            Request::MintReward {
                address,
                amount,
                reason,
            } => Response::from_result(
                self.mint_reward(&address, amount, &reason).await,
                Response::Minted,
            ),
            Request::Transfer { from, to, amount } => Response::from_result(
                self.transfer(&from, &to, amount).await,
                Response::Transferred,
            ),
            Request::Stake { address, amount } => {
                Response::from_result(self.stake(&address, amount).await, Response::Staked)
            }
            Request::Unstake { address, amount } => {
                Response::from_result(self.unstake(&address, amount).await, Response::Staked)
            }
            Request::GetBalance { address } => Response::Balance {
                balance: self.get_balance(&address).await,
            },
            Request::PayStakingReward { address, days } => Response::from_result(
                self.pay_staking_reward(&address, days).await,
                |amount| Response::Amount { amount },
            ),
            Request::DistributeUbi { addresses, period } => Response::from_result(
                self.distribute_ubi(&addresses, period).await,
                Response::UbiDistributed,
            ),
            Request::Transactions { address } => Response::Transactions {
                transactions: self.transactions_for(address).await,
            },
            Request::SupplyStats => Response::SupplyStats(self.supply_stats().await),
            Request::TransactionRoot => Response::TransactionRoot {
                root: hex::encode(self.transaction_root().await),
            },
            Request::Audit => Response::from_result(self.audit().await, |()| Response::AuditPassed),
        }
    }

    /// Parse a JSON request, dispatch it and encode the response.
    pub async fn handle_json(&self, raw: &str) -> Result<String, serde_json::Error> {
        let response = match Request::from_json(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                debug!("malformed request: {}", err);
                Response::Error(ServiceError::new(ErrorCode::InvalidInput, &err))
            }
        };
        response.to_json()
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl Request {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl Response {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServiceError {
    /// Serialize to bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bincode.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Question;

    #[test]
    fn test_request_json_roundtrip() {
        let address = Address::new([4; 16]);
        let request = Request::Transfer {
            from: address,
            to: address,
            amount: 5,
        };

        let json = request.to_json().unwrap();
        assert!(json.contains("\"type\":\"transfer\""));
        assert!(json.contains(&address.to_string()));

        match Request::from_json(&json).unwrap() {
            Request::Transfer { from, amount, .. } => {
                assert_eq!(from, address);
                assert_eq!(amount, 5);
            }
            other => panic!("Wrong request type: {:?}", other),
        }
    }

    #[test]
    fn test_ubi_period_defaults_to_monthly() {
        let request = Request::from_json(r#"{"type":"calculate_ubi","user_count":3}"#).unwrap();
        match request {
            Request::CalculateUbi { period, .. } => assert_eq!(period, UbiPeriod::Monthly),
            other => panic!("Wrong request type: {:?}", other),
        }
    }

    #[test]
    fn test_error_codes_map_nested_errors() {
        let err = MiningError::Ledger(LedgerError::Policy(PolicyError::SupplyExceeded {
            requested: 1,
            current: 21_000_000,
            max: 21_000_000,
        }));
        let error = ServiceError::from(&err);
        assert_eq!(error.code, ErrorCode::SupplyExceeded);

        let json = Response::Error(error).to_json().unwrap();
        assert!(json.contains("supply_exceeded"));
    }

    #[test]
    fn test_service_error_binary() {
        let error = ServiceError {
            code: ErrorCode::WalletNotFound,
            message: "wallet not found".to_string(),
        };
        let bytes = error.to_bytes().unwrap();
        assert_eq!(ServiceError::from_bytes(&bytes).unwrap(), error);
    }

    #[tokio::test]
    async fn test_handle_scenario() {
        let service = EconomyService::default();

        let a = match service.handle(Request::CreateWallet { user_id: "alice".into() }).await {
            Response::Wallet(wallet) => wallet.address,
            other => panic!("Wrong response: {:?}", other),
        };
        let b = match service.handle(Request::CreateWallet { user_id: "bob".into() }).await {
            Response::Wallet(wallet) => wallet.address,
            other => panic!("Wrong response: {:?}", other),
        };

        let minted = service
            .handle(Request::MintReward { address: a, amount: 100, reason: "grant".into() })
            .await;
        assert!(matches!(minted, Response::Minted(MintOutcome { balance: 100, minted: 100 })));

        let moved = service.handle(Request::Transfer { from: a, to: b, amount: 50 }).await;
        assert!(matches!(moved, Response::Transferred(TransferOutcome { from: 50, to: 50 })));

        match service.handle(Request::Transfer { from: a, to: b, amount: 9999 }).await {
            Response::Error(error) => assert_eq!(error.code, ErrorCode::InsufficientBalance),
            other => panic!("Wrong response: {:?}", other),
        }

        match service.handle(Request::Unstake { address: b, amount: 1 }).await {
            Response::Error(error) => assert_eq!(error.code, ErrorCode::InsufficientStake),
            other => panic!("Wrong response: {:?}", other),
        }

        assert!(matches!(service.handle(Request::Audit).await, Response::AuditPassed));
        assert!(matches!(
            service.handle(Request::GetBalance { address: Address::new([0; 16]) }).await,
            Response::Balance { balance: None }
        ));
    }

    #[tokio::test]
    async fn test_handle_mining_requests() {
        let service = EconomyService::default();
        let challenge = match service
            .handle(Request::GenerateChallenge {
                student_id: "s1".into(),
                subject: "javascript".into(),
            })
            .await
        {
            Response::Challenge(challenge) => challenge,
            other => panic!("Wrong response: {:?}", other),
        };

        let answers: Vec<String> = challenge
            .questions
            .iter()
            .map(|q| q.expected_answer.clone())
            .collect();
        match service
            .handle(Request::VerifyProof {
                challenge: challenge.clone(),
                answers: answers.clone(),
            })
            .await
        {
            Response::Proof(proof) => assert!(proof.valid),
            other => panic!("Wrong response: {:?}", other),
        }

        match service
            .handle(Request::Mine { challenge, answers: vec!["nope".into()], student_level: 0 })
            .await
        {
            Response::Error(error) => assert_eq!(error.code, ErrorCode::InsufficientProof),
            other => panic!("Wrong response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_rejects_forged_and_replayed_challenges() {
        let service = EconomyService::default();
        let address = match service.handle(Request::CreateWallet { user_id: "s1".into() }).await {
            Response::Wallet(wallet) => wallet.address,
            other => panic!("Wrong response: {:?}", other),
        };
        let challenge = match service
            .handle(Request::GenerateChallenge {
                student_id: "s1".into(),
                subject: "rust".into(),
            })
            .await
        {
            Response::Challenge(challenge) => challenge,
            other => panic!("Wrong response: {:?}", other),
        };

        let mut forged = challenge.clone();
        forged.questions = vec![Question::new("anything", "")];
        let reply = service
            .handle(Request::MineAndReward {
                challenge: forged,
                answers: vec![String::new()],
                student_level: 1_000_000,
                address,
            })
            .await;
        match reply {
            Response::Error(error) => assert_eq!(error.code, ErrorCode::ForgedChallenge),
            other => panic!("Wrong response: {:?}", other),
        }

        let answers: Vec<String> = challenge
            .questions
            .iter()
            .map(|q| q.expected_answer.clone())
            .collect();
        let redeem = || Request::MineAndReward {
            challenge: challenge.clone(),
            answers: answers.clone(),
            student_level: 0,
            address,
        };
        assert!(matches!(
            service.handle(redeem()).await,
            Response::Rewarded(RewardedProof { outcome: MintOutcome { minted: 10, .. }, .. })
        ));
        match service.handle(redeem()).await {
            Response::Error(error) => assert_eq!(error.code, ErrorCode::ChallengeAlreadyRewarded),
            other => panic!("Wrong response: {:?}", other),
        }

        match service.handle(Request::SupplyStats).await {
            Response::SupplyStats(stats) => assert_eq!(stats.current, 10),
            other => panic!("Wrong response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_json() {
        let service = EconomyService::default();

        let reply = service
            .handle_json(r#"{"type":"calculate_staking_reward","staked":1000,"days":30}"#)
            .await
            .unwrap();
        assert!(matches!(Response::from_json(&reply).unwrap(), Response::Amount { amount: 6 }));

        let reply = service.handle_json("{not json").await.unwrap();
        assert!(reply.contains("invalid_input"));

        let reply = service.handle_json(r#"{"type":"supply_stats"}"#).await.unwrap();
        assert!(reply.contains("\"type\":\"supply_stats\""));
    }
}
