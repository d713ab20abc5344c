//! Mined Records
//!
//! One completed, rewarded knowledge-verification episode. The fingerprint
//! covers the challenge, the proof and the record's own timestamp, so it can
//! be recomputed from what is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::hash::{hex_fingerprint, Fingerprint, Fingerprinter};
use crate::knowledge::challenge::Challenge;
use crate::knowledge::verifier::Proof;

/// Completed, rewarded verification episode. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedRecord {
    /// Record ID
    pub id: Uuid,
    /// Challenge that was answered
    pub challenge_id: Uuid,
    /// Student who answered
    pub student_id: String,
    /// Scored proof
    pub proof: Proof,
    /// Reward magnitude
    pub reward: u64,
    /// Mint time (the same instant that is fingerprinted)
    pub timestamp: DateTime<Utc>,
    /// SHA-256 over {challenge, proof, timestamp}
    #[serde(with = "hex_fingerprint")]
    pub fingerprint: Fingerprint,
}

impl MinedRecord {
    /// Seal a record, fingerprinting exactly the stored timestamp.
    pub fn seal(
        challenge: &Challenge,
        proof: Proof,
        reward: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let fingerprint = compute_fingerprint(challenge, &proof, &timestamp);
        Self {
            id: Uuid::new_v4(),
            challenge_id: challenge.id,
            student_id: challenge.student_id.clone(),
            proof,
            reward,
            timestamp,
            fingerprint,
        }
    }

    /// Recompute the fingerprint against `challenge` and compare.
    pub fn verify_fingerprint(&self, challenge: &Challenge) -> bool {
        challenge.id == self.challenge_id
            && compute_fingerprint(challenge, &self.proof, &self.timestamp) == self.fingerprint
    }

    /// Hex form of the fingerprint.
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }
}

/// Fingerprint of {challenge, proof, timestamp}.
pub fn compute_fingerprint(
    challenge: &Challenge,
    proof: &Proof,
    timestamp: &DateTime<Utc>,
) -> Fingerprint {
    let mut hasher = Fingerprinter::for_mined_record();

    hasher.update_uuid(&challenge.id);
    hasher.update_str(&challenge.student_id);
    hasher.update_str(&challenge.subject);
    hasher.update_u64(challenge.questions.len() as u64);
    for question in &challenge.questions {
        hasher.update_str(&question.prompt);
        hasher.update_str(&question.expected_answer);
    }
    hasher.update_timestamp(&challenge.created_at);
    hasher.update_u32(challenge.difficulty);

    hasher.update_bool(proof.valid);
    hasher.update_u64(proof.score.ppm());
    hasher.update_u32(proof.correct_count);
    hasher.update_u32(proof.total_count);

    hasher.update_timestamp(timestamp);

    hasher.finalize()
}
