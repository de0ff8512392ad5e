/// Account resolution pipeline
///
/// Linear flow, no retries; the first failing stage aborts the request:
/// FetchAccounts → ExtractKeyword → MatchAccount → LookupAccount →
/// FormatSentence → BuildResponse
///
/// Each run owns its account set and search index; nothing is shared
/// between requests except the account cache.
use std::fmt;
use std::sync::Arc;

use crate::account_cache::AccountCache;
use crate::alexa_models::{SkillRequest, SpeechResponse};
use crate::config::Credentials;
use crate::errors::{AppError, ResultExt};
use crate::matcher::AccountMatcher;
use crate::models::AccountSet;
use crate::speech;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    FetchAccounts,
    ExtractKeyword,
    MatchAccount,
    LookupAccount,
    FormatSentence,
    BuildResponse,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::FetchAccounts => "fetch accounts",
            PipelineStage::ExtractKeyword => "extract keyword",
            PipelineStage::MatchAccount => "match account",
            PipelineStage::LookupAccount => "look up account",
            PipelineStage::FormatSentence => "format sentence",
            PipelineStage::BuildResponse => "build response",
        };
        f.write_str(name)
    }
}

pub struct ResolutionPipeline {
    cache: Arc<AccountCache>,
    matcher: Arc<dyn AccountMatcher>,
}

impl ResolutionPipeline {
    pub fn new(cache: Arc<AccountCache>, matcher: Arc<dyn AccountMatcher>) -> Self {
        Self { cache, matcher }
    }

    pub fn cache(&self) -> &AccountCache {
        &self.cache
    }

    pub fn matcher(&self) -> &dyn AccountMatcher {
        self.matcher.as_ref()
    }

    /// Answer one request for the given owner.
    pub async fn respond(
        &self,
        owner: &Credentials,
        request: &SkillRequest,
    ) -> Result<SpeechResponse, AppError> {
        let result = match self.cache.get_accounts(owner).await {
            Ok(accounts) => answer(self.matcher.as_ref(), &accounts, request),
            Err(e) => Err(e).context(format!("{} failed", PipelineStage::FetchAccounts)),
        };

        match &result {
            Ok(response) => tracing::info!("Responded: \"{}\"", response.text()),
            Err(e) => tracing::warn!("Request failed: {}", e),
        }
        result
    }
}

/// The stages after the fetch, over an already-fetched account set.
pub fn answer(
    matcher: &dyn AccountMatcher,
    accounts: &AccountSet,
    request: &SkillRequest,
) -> Result<SpeechResponse, AppError> {
    let keyword = request.keyword().ok_or_else(|| {
        AppError::MalformedRequest(
            "request.intent.slots.Account.value is missing".to_string(),
        )
    });
    let keyword = keyword.context(format!("{} failed", PipelineStage::ExtractKeyword))?;
    tracing::debug!("[{}] '{}'", PipelineStage::ExtractKeyword, keyword);

    let account_id = matcher
        .resolve(keyword, accounts)
        .with_context(|| format!("{} failed ({})", PipelineStage::MatchAccount, matcher.name()))?;
    tracing::debug!(
        "[{}] '{}' -> account {}",
        PipelineStage::MatchAccount,
        keyword,
        account_id
    );

    let account = accounts.find(&account_id).ok_or_else(|| {
        AppError::AccountNotFound(format!(
            "account {} matched '{}' but is not in the fetched set",
            account_id, keyword
        ))
    });
    let account = account.context(format!("{} failed", PipelineStage::LookupAccount))?;

    let sentence = speech::describe(account);
    tracing::debug!("[{}] {}", PipelineStage::FormatSentence, sentence);

    Ok(SpeechResponse::plain_text(sentence))
}
