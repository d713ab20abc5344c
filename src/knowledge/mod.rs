//! Proof-of-Knowledge
//!
//! Challenge/answer protocol gating the minting of new tokens:
//!
//! ```text
//! generate_challenge ──► verify_proof ──► calculate_reward ──► MinedRecord
//!                                  │
//!                                  └── score < threshold ──► InsufficientProof
//! ```

pub mod challenge;
pub mod record;
pub mod verifier;

pub use challenge::{Challenge, Question, QuestionBank, DEFAULT_SUBJECT};
pub use record::MinedRecord;
pub use verifier::{KnowledgeVerifier, MiningError, Proof};
