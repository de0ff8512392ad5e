/// Time-bounded caching of fetched account data
///
/// The fetch process is slow (it logs into the aggregator), so its output is
/// kept per owner for one hour:
/// 1. Hash the owner identity into a cache key
/// 2. Return the stored blob if it is younger than the TTL
/// 3. Otherwise fetch, validate, persist, and return the fresh set
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cache_validator::{sha256_hex, ValidatedCacheEntry};
use crate::config::Credentials;
use crate::errors::{AppError, ResultExt};
use crate::models::AccountSet;

/// Maximum age of cached account data.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Produces the raw account listing (a JSON array) for an owner.
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    async fn fetch(&self, owner: &Credentials) -> Result<String, AppError>;
}

/// A cached fetch result and the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: String,
    pub fetched_at: DateTime<Utc>,
}

/// Key → blob persistence. Expiry is decided by [`AccountCache`], not the store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, AppError>;
    async fn put(&self, key: &str, blob: StoredBlob) -> Result<(), AppError>;
}

/// Cache key for an owner: hex SHA-256 of their identity.
pub fn cache_key(owner_identity: &str) -> String {
    sha256_hex(owner_identity)
}

// ============ File store ============

/// One checksummed JSON file per owner key under a root directory.
///
/// Writes go to a unique temp file in the same directory and are renamed
/// into place, so readers see either the old blob or the new one.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("accounts-{}.json", key))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, AppError> {
        let path = self.path_for(key);
        let serialized = match tokio::fs::read_to_string(&path).await {
            Ok(serialized) => serialized,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::InternalError(format!(
                    "Failed to read cache file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(
            ValidatedCacheEntry::deserialize_and_validate(&serialized).map(|entry| StoredBlob {
                data: entry.data,
                fetched_at: entry.fetched_at,
            }),
        )
    }

    async fn put(&self, key: &str, blob: StoredBlob) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("preparing cache directory {}", self.root.display()))?;

        let payload = ValidatedCacheEntry::new(blob.data, blob.fetched_at).serialize()?;
        let path = self.path_for(key);
        let temp_path = self
            .root
            .join(format!(".accounts-{}.{}.tmp", key, Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&temp_path, payload).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err::<(), _>(e).context("writing cache blob");
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err::<(), _>(e).context("finalizing cache blob");
        }

        tracing::debug!("Cache blob written: {}", path.display());
        Ok(())
    }
}

// ============ In-memory store ============

/// Process-local store for tests and ephemeral deployments.
#[derive(Clone)]
pub struct MemoryBlobStore {
    blobs: Cache<String, StoredBlob>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Cache::builder().max_capacity(1_000).build(),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, AppError> {
        Ok(self.blobs.get(key).await)
    }

    async fn put(&self, key: &str, blob: StoredBlob) -> Result<(), AppError> {
        self.blobs.insert(key.to_string(), blob).await;
        Ok(())
    }
}

// ============ Account cache ============

/// Fetch-through cache of account sets, keyed by owner.
pub struct AccountCache {
    fetcher: Arc<dyn AccountFetcher>,
    store: Arc<dyn BlobStore>,
    ttl: Duration,
}

impl AccountCache {
    pub fn new(fetcher: Arc<dyn AccountFetcher>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            fetcher,
            store,
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached accounts if still fresh, otherwise a new fetch.
    pub async fn get_accounts(&self, owner: &Credentials) -> Result<AccountSet, AppError> {
        let key = cache_key(&owner.email);

        if let Some(accounts) = self.cached(&key).await {
            tracing::debug!(
                "Account cache HIT for {} ({} accounts)",
                key,
                accounts.len()
            );
            return Ok(accounts);
        }

        self.fetch_and_store(owner, &key).await
    }

    /// Fetch regardless of cache age and replace the stored blob.
    pub async fn refresh(&self, owner: &Credentials) -> Result<AccountSet, AppError> {
        let key = cache_key(&owner.email);
        tracing::info!("Forced account refresh for {}", key);
        self.fetch_and_store(owner, &key).await
    }

    async fn cached(&self, key: &str) -> Option<AccountSet> {
        let blob = match self.store.get(key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                tracing::debug!("Account cache MISS for {}", key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Account cache unreadable for {}: {}", key, e);
                return None;
            }
        };

        // A timestamp in the future (clock skew) counts as stale
        let age = match Utc::now().signed_duration_since(blob.fetched_at).to_std() {
            Ok(age) => age,
            Err(_) => {
                tracing::warn!("Account cache for {} is dated in the future", key);
                return None;
            }
        };
        if age >= self.ttl {
            tracing::debug!(
                "Account cache STALE for {} (age {}s, ttl {}s)",
                key,
                age.as_secs(),
                self.ttl.as_secs()
            );
            return None;
        }

        match AccountSet::from_raw(key, blob.fetched_at, &blob.data) {
            Ok(accounts) => Some(accounts),
            Err(e) => {
                tracing::warn!("Discarding undecodable cache blob for {}: {}", key, e);
                None
            }
        }
    }

    async fn fetch_and_store(&self, owner: &Credentials, key: &str) -> Result<AccountSet, AppError> {
        tracing::info!("Fetching accounts for {}", key);
        let raw = self.fetcher.fetch(owner).await?;
        let fetched_at = Utc::now();

        // Validate before persisting so malformed output is never cached
        let accounts = AccountSet::from_raw(key, fetched_at, &raw)?;
        tracing::info!("Fetched {} accounts for {}", accounts.len(), key);

        let blob = StoredBlob {
            data: raw,
            fetched_at,
        };
        if let Err(e) = self.store.put(key, blob).await {
            // Not fatal: the caller still gets the fresh accounts
            tracing::warn!("Failed to cache accounts for {}: {}", key, e);
        }

        Ok(accounts)
    }
}
