//! Shared Economy Service
//!
//! Async wrapper owning one ledger behind a lock, plus the request/response
//! protocol an outer transport layer speaks.

pub mod economy;
pub mod protocol;

pub use economy::{EconomyService, RewardedProof, KNOWLEDGE_REASON};
pub use protocol::{ErrorCode, Request, Response, ServiceError};
