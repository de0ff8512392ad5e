use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::errors::AppError;

// ============ Account Models ============

/// Identifier of an account as assigned by the aggregator.
///
/// The fetch tool emits numeric ids, but string ids are accepted as well so
/// alias files and other aggregators can be used unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountId {
    Number(i64),
    Text(String),
}

impl AccountId {
    /// Parses an id from its textual form, preferring the numeric variant.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => AccountId::Number(n),
            Err(_) => AccountId::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountId::Number(n) => write!(f, "{}", n),
            AccountId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AccountId {
    fn from(n: i64) -> Self {
        AccountId::Number(n)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId::parse(s)
    }
}

/// Broad account category, derived from the aggregator's `accountType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCategory {
    Bank,
    Credit,
    Loan,
    Other,
}

impl From<&str> for AccountCategory {
    fn from(raw: &str) -> Self {
        match raw {
            "bank" => AccountCategory::Bank,
            "credit" => AccountCategory::Credit,
            "loan" => AccountCategory::Loan,
            _ => AccountCategory::Other,
        }
    }
}

/// A single account record as produced by the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    /// Name the owner assigned to the account. `"ignore"` excludes it from search.
    #[serde(default)]
    pub user_name: Option<String>,
    /// Display name of the institution login.
    #[serde(default)]
    pub fi_login_display_name: Option<String>,
    /// Name assigned by the aggregator.
    #[serde(default)]
    pub yodlee_name: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    /// Institution name.
    #[serde(default)]
    pub fi_name: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    /// Missing or `null` reads as zero.
    #[serde(default, deserialize_with = "balance_or_zero")]
    pub current_balance: f64,

    /// Remaining fields, kept so the accounts endpoint echoes the fetched data
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    pub fn category(&self) -> AccountCategory {
        self.account_type
            .as_deref()
            .map(AccountCategory::from)
            .unwrap_or(AccountCategory::Other)
    }
}

fn balance_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

/// Accounts fetched for one owner, in fetch order.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSet {
    /// Hashed owner identity the set is cached under.
    pub owner_key: String,
    pub fetched_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
}

impl AccountSet {
    /// Decodes the raw fetch output and checks the set invariants: a JSON
    /// array, at least one account, and no repeated ids.
    pub fn from_raw(
        owner_key: &str,
        fetched_at: DateTime<Utc>,
        raw: &str,
    ) -> Result<Self, AppError> {
        let accounts: Vec<Account> = serde_json::from_str(raw.trim())?;

        if accounts.is_empty() {
            return Err(AppError::Fetch("Fetch returned no accounts".to_string()));
        }

        let mut seen = HashSet::with_capacity(accounts.len());
        for account in &accounts {
            if !seen.insert(&account.id) {
                return Err(AppError::Fetch(format!(
                    "Duplicate account id {} in fetch result",
                    account.id
                )));
            }
        }

        Ok(Self {
            owner_key: owner_key.to_string(),
            fetched_at,
            accounts,
        })
    }

    /// Linear scan for the account with the given id.
    pub fn find(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|account| &account.id == id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
