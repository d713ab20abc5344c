//! Knowledge Verifier
//!
//! Scores answers against a challenge and turns a passing proof into a
//! rewarded [`MinedRecord`]. Purely functional per call: no memory between
//! calls beyond the configuration and question bank.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EconomyConfig;
use crate::core::rate::Rate;
use crate::knowledge::challenge::{Challenge, QuestionBank};
use crate::knowledge::record::MinedRecord;

/// Result of scoring a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// `score >= threshold`, decided exactly
    pub valid: bool,
    /// `correct_count / total_count`, floored to ppm
    pub score: Rate,
    /// Matching answers
    pub correct_count: u32,
    /// Questions in the challenge
    pub total_count: u32,
}

/// Mining errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MiningError {
    /// Score below threshold. No reward, no state change.
    #[error("insufficient proof: score {score} below threshold {threshold}")]
    InsufficientProof {
        /// Achieved score.
        score: Rate,
        /// Required score.
        threshold: Rate,
    },

    /// Questions or difficulty differ from what the bank issues.
    #[error("challenge {0} does not match the question bank")]
    ForgedChallenge(Uuid),

    /// Challenge was never issued by this engine.
    #[error("unknown challenge {0}")]
    UnknownChallenge(Uuid),

    /// Challenge already produced a reward.
    #[error("challenge {0} was already rewarded")]
    AlreadyRewarded(Uuid),

    /// Credited wallet does not belong to the challenged student.
    #[error("challenge issued to {student_id} cannot credit a wallet owned by {owner}")]
    StudentMismatch {
        /// Student the challenge was issued to.
        student_id: String,
        /// Owner of the target wallet.
        owner: String,
    },

    /// Crediting the reward failed.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),
}

/// Knowledge verifier.
#[derive(Clone, Debug)]
pub struct KnowledgeVerifier {
    bank: QuestionBank,
    threshold: Rate,
    base_reward: u64,
    level_bonus: Rate,
    difficulty: u32,
}

impl KnowledgeVerifier {
    /// Create verifier with the standard question bank.
    pub fn new(config: &EconomyConfig) -> Self {
        Self::with_bank(config, QuestionBank::standard())
    }

    /// Create verifier with a custom question bank.
    pub fn with_bank(config: &EconomyConfig, bank: QuestionBank) -> Self {
        Self {
            bank,
            threshold: config.proof_threshold,
            base_reward: config.base_reward,
            level_bonus: config.level_bonus,
            difficulty: config.difficulty,
        }
    }

    /// Question bank in use.
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Minimum passing score.
    pub fn threshold(&self) -> Rate {
        self.threshold
    }

    /// Flat reward for a perfect, level-0 proof.
    pub fn base_reward(&self) -> u64 {
        self.base_reward
    }

    /// Issue a challenge for `subject`, falling back to the default subject.
    pub fn generate_challenge(&self, student_id: &str, subject: &str) -> Challenge {
        let challenge = self.bank.issue(student_id, subject, self.difficulty);
        debug!(
            challenge_id = %challenge.id,
            student_id,
            subject,
            questions = challenge.questions.len(),
            "challenge issued"
        );
        challenge
    }

    /// Check that `challenge` carries exactly the bank's questions for its
    /// subject at the configured difficulty.
    pub fn check_challenge(&self, challenge: &Challenge) -> Result<(), MiningError> {
        let expected = self.bank.questions_for(&challenge.subject);
        if challenge.questions.as_slice() != expected || challenge.difficulty != self.difficulty {
            warn!(
                challenge_id = %challenge.id,
                subject = %challenge.subject,
                "challenge does not match the question bank"
            );
            return Err(MiningError::ForgedChallenge(challenge.id));
        }
        Ok(())
    }

    /// Score `answers` against `challenge`.
    ///
    /// `answers[i]` is correct when it contains `questions[i].expected_answer`,
    /// ignoring case. Missing answers are wrong; extra answers are ignored.
    pub fn verify_proof<S: AsRef<str>>(&self, challenge: &Challenge, answers: &[S]) -> Proof {
        let total_count = challenge.questions.len() as u32;
        let correct_count = challenge
            .questions
            .iter()
            .enumerate()
            .filter(|(i, question)| {
                let correct = answers
                    .get(*i)
                    .map(|answer| answer_matches(answer.as_ref(), &question.expected_answer))
                    .unwrap_or(false);
                #[cfg(feature = "debug-tracing")]
                tracing::trace!(index = i, correct, "answer checked");
                correct
            })
            .count() as u32;

        let valid =
            total_count > 0 && self.threshold.is_met_by(correct_count as u64, total_count as u64);

        Proof {
            valid,
            score: Rate::from_ratio(correct_count as u64, total_count as u64),
            correct_count,
            total_count,
        }
    }

    /// `floor(base_reward × score × (1 + level × level_bonus))`.
    ///
    /// Does not check `proof.valid`; gating is the caller's job.
    pub fn calculate_reward(&self, proof: &Proof, student_level: u32) -> u64 {
        self.reward_with_base(proof, student_level, self.base_reward)
    }

    /// Same formula with an explicit base (used by the halving schedule).
    pub fn reward_with_base(&self, proof: &Proof, student_level: u32, base_reward: u64) -> u64 {
        if proof.total_count == 0 {
            return 0;
        }
        let multiplier =
            Rate::ONE.ppm() as u128 + student_level as u128 * self.level_bonus.ppm() as u128;
        let numerator = base_reward as u128 * proof.correct_count as u128 * multiplier;
        let denominator = proof.total_count as u128 * Rate::ONE.ppm() as u128;
        u64::try_from(numerator / denominator).unwrap_or(u64::MAX)
    }

    /// Verify, reward and seal using the flat base reward.
    pub fn mine<S: AsRef<str>>(
        &self,
        challenge: &Challenge,
        answers: &[S],
        student_level: u32,
    ) -> Result<MinedRecord, MiningError> {
        self.mine_with_base(challenge, answers, student_level, self.base_reward)
    }

    /// Verify, reward and seal using an explicit base reward.
    ///
    /// Challenges whose questions differ from the bank are rejected before
    /// scoring.
    pub fn mine_with_base<S: AsRef<str>>(
        &self,
        challenge: &Challenge,
        answers: &[S],
        student_level: u32,
        base_reward: u64,
    ) -> Result<MinedRecord, MiningError> {
        self.check_challenge(challenge)?;
        let proof = self.verify_proof(challenge, answers);
        if !proof.valid {
            info!(
                challenge_id = %challenge.id,
                student_id = %challenge.student_id,
                score = %proof.score,
                threshold = %self.threshold,
                "proof rejected"
            );
            return Err(MiningError::InsufficientProof {
                score: proof.score,
                threshold: self.threshold,
            });
        }

        let reward = self.reward_with_base(&proof, student_level, base_reward);
        let record = MinedRecord::seal(challenge, proof, reward, Utc::now());

        info!(
            record_id = %record.id,
            student_id = %record.student_id,
            score = %proof.score,
            reward,
            "knowledge mined"
        );
        Ok(record)
    }
}

impl Default for KnowledgeVerifier {
    fn default() -> Self {
        Self::new(&EconomyConfig::default())
    }
}

/// Lenient free-text check: the answer must contain the expected text.
fn answer_matches(answer: &str, expected: &str) -> bool {
    answer.to_lowercase().contains(&expected.to_lowercase())
}
