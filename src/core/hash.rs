//! Integrity Fingerprints
//!
//! Deterministic SHA-256 hashing of engine records for:
//! - Mined record fingerprints (reproducible from the stored record)
//! - Transaction leaves for the ledger's Merkle commitment
//!
//! These are integrity fingerprints, not a proof-of-work puzzle.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type Fingerprint = [u8; 32];

/// Domain separator for mined record fingerprints.
pub const MINED_RECORD_DOMAIN: &[u8] = b"POK_MINED_RECORD_V1";

/// Domain separator for transaction leaves.
pub const TRANSACTION_DOMAIN: &[u8] = b"POK_TRANSACTION_V1";

/// Deterministic hasher for engine records.
///
/// Wraps SHA-256 with helpers for the engine's field types.
/// Order of updates is part of the format.
pub struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for mined records.
    pub fn for_mined_record() -> Self {
        Self::new(MINED_RECORD_DOMAIN)
    }

    /// Create hasher for transaction log leaves.
    pub fn for_transaction() -> Self {
        Self::new(TRANSACTION_DOMAIN)
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed UTF-8 string.
    ///
    /// The prefix keeps `("ab", "c")` and `("a", "bc")` distinct.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional string (presence byte, then the string).
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.update_bool(true);
                self.update_str(s);
            }
            None => self.update_bool(false),
        }
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &uuid::Uuid) {
        self.hasher.update(uuid.as_bytes());
    }

    /// Update with a UTC timestamp at nanosecond resolution.
    #[inline]
    pub fn update_timestamp(&mut self, at: &DateTime<Utc>) {
        self.hasher.update(at.timestamp().to_le_bytes());
        self.update_u32(at.timestamp_subsec_nanos());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Fingerprint {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
#[cfg(test)]
pub(crate) fn hash_with_domain(domain: &[u8], data: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Serde adapter rendering a [`Fingerprint`] as a lowercase hex string.
pub mod hex_fingerprint {
    use super::Fingerprint;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    /// Serialize as hex.
    pub fn serialize<S: Serializer>(
        value: &Fingerprint,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(value))
    }

    /// Deserialize from hex.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Fingerprint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let bytes = hex::decode(&raw).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("fingerprint must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fingerprinter_determinism() {
        let at = Utc.timestamp_opt(1_700_000_000, 123).unwrap();
        let make_hash = || {
            let mut hasher = Fingerprinter::for_mined_record();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_str("javascript");
            hasher.update_timestamp(&at);
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = Fingerprinter::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = Fingerprinter::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_string_boundaries_are_distinct() {
        let hash1 = {
            let mut h = Fingerprinter::new(b"test");
            h.update_str("ab");
            h.update_str("c");
            h.finalize()
        };

        let hash2 = {
            let mut h = Fingerprinter::new(b"test");
            h.update_str("a");
            h.update_str("bc");
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_subsecond_precision() {
        let a = Utc.timestamp_opt(1_700_000_000, 1).unwrap();
        let b = Utc.timestamp_opt(1_700_000_000, 2).unwrap();

        let hash = |at: &DateTime<Utc>| {
            let mut h = Fingerprinter::for_mined_record();
            h.update_timestamp(at);
            h.finalize()
        };

        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = hash_with_domain(MINED_RECORD_DOMAIN, &data);
        let hash2 = hash_with_domain(TRANSACTION_DOMAIN, &data);

        assert_ne!(hash1, hash2);
    }
}
