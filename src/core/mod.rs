//! Core deterministic primitives.
//!
//! Integer-only rates and domain-separated fingerprints shared by the
//! verifier, the policy engine and the ledger.

pub mod rate;
pub mod hash;
pub mod merkle;

// Re-export core types
pub use rate::{Rate, RATE_SCALE};
pub use hash::{Fingerprint, Fingerprinter};
pub use merkle::{MerkleProof, MerkleTree};
