use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::errors::AppError;

/// Validates cached account blobs using SHA-256 checksums
///
/// A blob on disk can be truncated by a crashed writer or edited by hand.
/// Each entry stores a checksum over its payload and fetch timestamp; an
/// entry whose checksum does not match is discarded and the accounts are
/// fetched again.

/// Hex-encoded SHA-256 of a string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Wrapper for a cached fetch result with integrity validation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedCacheEntry {
    /// Raw fetch output (JSON array of accounts)
    pub data: String,
    /// When the data was fetched
    pub fetched_at: DateTime<Utc>,
    /// SHA-256 checksum of the timestamp and data (hex encoded)
    pub checksum: String,
}

impl ValidatedCacheEntry {
    /// Creates a new validated cache entry with computed checksum
    pub fn new(data: String, fetched_at: DateTime<Utc>) -> Self {
        let checksum = Self::compute_checksum(&data, &fetched_at);
        Self {
            data,
            fetched_at,
            checksum,
        }
    }

    fn compute_checksum(data: &str, fetched_at: &DateTime<Utc>) -> String {
        sha256_hex(&format!("{}\n{}", fetched_at.to_rfc3339(), data))
    }

    /// Returns true if the checksum matches, false if tampered
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.data, &self.fetched_at) == self.checksum
    }

    /// Serializes the entry for storage
    pub fn serialize(&self) -> Result<String, AppError> {
        serde_json::to_string(self)
            .map_err(|e| AppError::CacheWrite(format!("Failed to encode cache entry: {}", e)))
    }

    /// Deserializes and validates a cache entry
    ///
    /// Returns None if the entry is corrupted or not valid JSON
    pub fn deserialize_and_validate(serialized: &str) -> Option<Self> {
        let entry: ValidatedCacheEntry = match serde_json::from_str(serialized) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cache entry is not decodable: {}", e);
                return None;
            }
        };

        if entry.is_valid() {
            Some(entry)
        } else {
            // Checksum mismatch - partial write or tampering
            tracing::warn!(
                "Cache validation failed: checksum mismatch. Expected: {}, Data length: {}",
                entry.checksum,
                entry.data.len()
            );
            None
        }
    }
}
