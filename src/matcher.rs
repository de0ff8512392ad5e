//! Keyword → account resolution.
//!
//! Two strategies share the [`AccountMatcher`] interface:
//! - [`FuzzyMatcher`] scores the keyword against every account's search corpus
//!   and always picks the best one.
//! - [`AliasMatcher`] looks the keyword up in a configured alias map and never
//!   guesses.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, MatchStrategy};
use crate::errors::AppError;
use crate::indexer::{build_index, SearchIndex};
use crate::models::{AccountId, AccountSet};

/// Resolves a spoken keyword to one account of a fetched set.
pub trait AccountMatcher: Send + Sync {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    fn resolve(&self, keyword: &str, accounts: &AccountSet) -> Result<AccountId, AppError>;
}

// ============ Similarity ============

/// Number of matching bytes between two strings.
///
/// Finds the longest common substring (earliest in `first`, then earliest in
/// `second`), then recurses on the text left of it and the text right of it
/// and sums the matched lengths.
pub fn similar_text(first: &str, second: &str) -> usize {
    similar_bytes(first.as_bytes(), second.as_bytes())
}

fn similar_bytes(first: &[u8], second: &[u8]) -> usize {
    let (pos1, pos2, max) = longest_common_substring(first, second);
    if max == 0 {
        return 0;
    }

    let mut sum = max;
    if pos1 > 0 && pos2 > 0 {
        sum += similar_bytes(&first[..pos1], &second[..pos2]);
    }
    if pos1 + max < first.len() && pos2 + max < second.len() {
        sum += similar_bytes(&first[pos1 + max..], &second[pos2 + max..]);
    }
    sum
}

fn longest_common_substring(first: &[u8], second: &[u8]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    for i in 0..first.len() {
        for j in 0..second.len() {
            let len = first[i..]
                .iter()
                .zip(&second[j..])
                .take_while(|(a, b)| a == b)
                .count();
            if len > best.2 {
                best = (i, j, len);
            }
        }
    }
    best
}

// ============ Fuzzy strategy ============

/// Similarity-ranked matching against the per-request search index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyMatcher;

impl FuzzyMatcher {
    /// All indexed accounts with their scores, best first.
    ///
    /// The sort is stable, so equal scores keep index order.
    pub fn rank(keyword: &str, index: &SearchIndex) -> Vec<(AccountId, usize)> {
        let keyword = keyword.to_lowercase();
        let mut scored: Vec<(AccountId, usize)> = index
            .iter()
            .map(|entry| (entry.id.clone(), similar_text(&keyword, &entry.corpus)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored
    }

    /// Top-ranked account id. When every score ties (including all zero), the
    /// first indexed account wins.
    pub fn best_match(keyword: &str, index: &SearchIndex) -> Result<AccountId, AppError> {
        let ranked = Self::rank(keyword, index);
        if let Some((id, score)) = ranked.first() {
            tracing::debug!(
                "Fuzzy match for '{}': account {} (score {}, {} candidates)",
                keyword,
                id,
                score,
                ranked.len()
            );
        }
        ranked
            .into_iter()
            .next()
            .map(|(id, _)| id)
            .ok_or_else(|| AppError::NoMatch("no searchable accounts".to_string()))
    }
}

impl AccountMatcher for FuzzyMatcher {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn resolve(&self, keyword: &str, accounts: &AccountSet) -> Result<AccountId, AppError> {
        let index = build_index(accounts);
        Self::best_match(keyword, &index)
    }
}

// ============ Alias strategy ============

/// Literal aliases per account, in configuration order.
///
/// Deserializes from a JSON object `{ "<account id>": ["alias", ...] }`;
/// aliases are trimmed and lowercased on load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<(AccountId, Vec<String>)>,
}

impl AliasMap {
    pub fn new(entries: Vec<(AccountId, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(id, aliases)| {
                let aliases = aliases
                    .iter()
                    .map(|alias| alias.trim().to_lowercase())
                    .collect();
                (id, aliases)
            })
            .collect();
        Self { entries }
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("Invalid alias map: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read alias map {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&raw)
    }

    /// Owner of the first alias equal to the trimmed, lowercased keyword.
    pub fn lookup(&self, keyword: &str) -> Option<&AccountId> {
        let keyword = keyword.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| *alias == keyword))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for AliasMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AliasMapVisitor;

        impl<'de> Visitor<'de> for AliasMapVisitor {
            type Value = AliasMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping account ids to alias lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<AliasMap, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((id, aliases)) = map.next_entry::<String, Vec<String>>()? {
                    entries.push((AccountId::parse(&id), aliases));
                }
                Ok(AliasMap::new(entries))
            }
        }

        deserializer.deserialize_map(AliasMapVisitor)
    }
}

/// Exact alias matching.
#[derive(Debug, Clone)]
pub struct AliasMatcher {
    aliases: AliasMap,
}

impl AliasMatcher {
    pub fn new(aliases: AliasMap) -> Self {
        Self { aliases }
    }
}

impl AccountMatcher for AliasMatcher {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn resolve(&self, keyword: &str, _accounts: &AccountSet) -> Result<AccountId, AppError> {
        self.aliases
            .lookup(keyword)
            .cloned()
            .ok_or_else(|| AppError::NoMatch(format!("no alias matches '{}'", keyword.trim())))
    }
}

/// Matcher selected by the configured strategy.
pub fn matcher_from_config(config: &Config) -> Result<Arc<dyn AccountMatcher>, AppError> {
    match config.match_strategy {
        MatchStrategy::Fuzzy => Ok(Arc::new(FuzzyMatcher)),
        MatchStrategy::Alias => {
            let path = config.alias_map_path.as_ref().ok_or_else(|| {
                AppError::Config("ALIAS_MAP_PATH is required for alias matching".to_string())
            })?;
            let aliases = AliasMap::load(path)?;
            tracing::info!("Loaded {} alias entries from {}", aliases.len(), path.display());
            Ok(Arc::new(AliasMatcher::new(aliases)))
        }
    }
}
