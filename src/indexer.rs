use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::models::{Account, AccountId, AccountSet};

/// Owner-assigned name that excludes an account from search.
pub const IGNORE_SENTINEL: &str = "ignore";

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9A-Za-z]+").expect("static regex is valid"))
}

/// One searchable account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: AccountId,
    pub corpus: String,
}

/// Per-request search corpus, in account fetch order.
///
/// Order matters: the matcher breaks score ties in favour of the entry
/// indexed first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: &AccountId) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| &entry.id == id)
            .map(|entry| entry.corpus.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the search index for a fetched account set.
pub fn build_index(accounts: &AccountSet) -> SearchIndex {
    let entries = accounts
        .accounts
        .iter()
        .filter(|account| account.user_name.as_deref() != Some(IGNORE_SENTINEL))
        .map(|account| IndexEntry {
            id: account.id.clone(),
            corpus: corpus_for(account),
        })
        .collect();

    SearchIndex { entries }
}

/// Normalized corpus for one account.
///
/// Field values are joined in a fixed order, duplicate words are dropped
/// (first occurrence wins, compared before lowercasing), punctuation runs
/// collapse to one space, and the result is trimmed and lowercased.
pub fn corpus_for(account: &Account) -> String {
    let fields = [
        &account.fi_login_display_name,
        &account.user_name,
        &account.account_name,
        &account.yodlee_name,
        &account.fi_name,
    ];

    let mut seen = HashSet::new();
    let words: Vec<&str> = fields
        .iter()
        .filter_map(|field| field.as_deref())
        .filter(|value| !value.is_empty())
        .flat_map(str::split_whitespace)
        .filter(|word| seen.insert(*word))
        .collect();

    let joined = words.join(" ");
    non_alphanumeric()
        .replace_all(&joined, " ")
        .trim()
        .to_lowercase()
}
