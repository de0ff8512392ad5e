use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// How spoken keywords are resolved to accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Fuzzy,
    Alias,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Fuzzy => "fuzzy",
            MatchStrategy::Alias => "alias",
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fuzzy" => Ok(MatchStrategy::Fuzzy),
            "alias" => Ok(MatchStrategy::Alias),
            other => anyhow::bail!("MATCH_STRATEGY must be 'fuzzy' or 'alias', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub mintapi_binary: PathBuf,
    pub credentials_path: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub fetch_timeout_secs: u64,
    pub match_strategy: MatchStrategy,
    pub alias_map_path: Option<PathBuf>, // Required only for alias matching
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required_path = |key: &str| -> anyhow::Result<PathBuf> {
            let value = lookup(key)
                .ok_or_else(|| anyhow::anyhow!("{} environment variable required", key))?;
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", key);
            }
            Ok(PathBuf::from(value.trim()))
        };
        let number = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(raw) => {
                    let value: u64 = raw
                        .trim()
                        .parse()
                        .map_err(|_| anyhow::anyhow!("{} must be a positive number", key))?;
                    if value == 0 {
                        anyhow::bail!("{} must be greater than zero", key);
                    }
                    Ok(value)
                }
                None => Ok(default),
            }
        };

        let config = Self {
            port: lookup("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            mintapi_binary: required_path("MINTAPI_BINARY")?,
            credentials_path: required_path("MINT_CREDENTIALS_PATH")?,
            cache_dir: lookup("CACHE_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./cache")),
            cache_ttl_secs: number("CACHE_TTL_SECS", 3600)?,
            fetch_timeout_secs: number("FETCH_TIMEOUT_SECS", 60)?,
            match_strategy: lookup("MATCH_STRATEGY")
                .map(|s| s.parse::<MatchStrategy>())
                .transpose()?
                .unwrap_or(MatchStrategy::Fuzzy),
            alias_map_path: lookup("ALIAS_MAP_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        if config.match_strategy == MatchStrategy::Alias && config.alias_map_path.is_none() {
            anyhow::bail!("ALIAS_MAP_PATH is required when MATCH_STRATEGY=alias");
        }

        tracing::debug!("Fetch binary: {}", config.mintapi_binary.display());
        tracing::debug!("Cache directory: {}", config.cache_dir.display());
        tracing::debug!("Match strategy: {:?}", config.match_strategy);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Login for the aggregator, read from the credentials file.
///
/// The email doubles as the owner identity the account cache is keyed by.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub session: Option<String>,
}

impl Credentials {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read credentials {}: {}", path.display(), e)
        })?;
        let credentials: Credentials = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid credentials file {}: {}", path.display(), e))?;
        if credentials.email.trim().is_empty() {
            anyhow::bail!("Credentials email cannot be empty");
        }
        Ok(credentials)
    }
}

// Redact secrets so credentials can be logged safely
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("session", &self.session.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("MINTAPI_BINARY", "/usr/local/bin/mintapi"),
        ("MINT_CREDENTIALS_PATH", "/etc/bookkeeper/mint.json"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(60));
        assert_eq!(config.match_strategy, MatchStrategy::Fuzzy);
        assert!(config.alias_map_path.is_none());
    }

    #[test]
    fn test_missing_binary_is_rejected() {
        let err = Config::from_lookup(lookup(&[("MINT_CREDENTIALS_PATH", "/tmp/c.json")]))
            .unwrap_err();
        assert!(err.to_string().contains("MINTAPI_BINARY"));
    }

    #[test]
    fn test_alias_strategy_requires_map() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MATCH_STRATEGY", "alias"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        pairs.push(("ALIAS_MAP_PATH", "/etc/bookkeeper/aliases.json"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.match_strategy, MatchStrategy::Alias);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FETCH_TIMEOUT_SECS", "soon"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CACHE_TTL_SECS", "0"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MATCH_STRATEGY", "phonetic"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials {
            email: "owner@example.com".to_string(),
            password: "hunter2".to_string(),
            session: Some("sess-token".to_string()),
        };

        let printed = format!("{:?}", credentials);
        assert!(printed.contains("owner@example.com"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("sess-token"));
    }

    #[test]
    fn test_credentials_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mint.json");
        std::fs::write(&path, r#"{"email": "owner@example.com", "password": "pw"}"#).unwrap();

        let credentials = Credentials::load(&path).unwrap();
        assert_eq!(credentials.email, "owner@example.com");
        assert!(credentials.session.is_none());

        assert!(Credentials::load(&dir.path().join("missing.json")).is_err());
    }
}
