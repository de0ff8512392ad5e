//! Utility to print the search corpus built for each of the owner's accounts.
//!
//! Useful when writing an alias map: shows the id and spoken name of every
//! account alongside the words the fuzzy matcher scores against.

use std::sync::Arc;

use rust_bookkeeper_api::account_cache::{AccountCache, FileBlobStore};
use rust_bookkeeper_api::config::{Config, Credentials};
use rust_bookkeeper_api::indexer::build_index;
use rust_bookkeeper_api::mintapi_client::MintApiFetcher;
use rust_bookkeeper_api::speech::speakable_name;

/// Main entry point for the index inspection utility.
///
/// Reads the account list through the on-disk cache (fetching when stale).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let credentials = Credentials::load(&config.credentials_path)?;

    let fetcher = Arc::new(MintApiFetcher::new(
        config.mintapi_binary.clone(),
        config.fetch_timeout(),
    ));
    let store = Arc::new(FileBlobStore::new(config.cache_dir.clone()));
    let cache = AccountCache::new(fetcher, store).with_ttl(config.cache_ttl());

    let accounts = cache.get_accounts(&credentials).await?;
    let index = build_index(&accounts);

    println!(
        "{} accounts fetched at {} ({} indexed):",
        accounts.len(),
        accounts.fetched_at.to_rfc3339(),
        index.len()
    );
    for account in &accounts.accounts {
        match index.get(&account.id) {
            Some(corpus) => println!("- {} \"{}\": {}", account.id, speakable_name(account), corpus),
            None => println!("- {} \"{}\": (ignored)", account.id, speakable_name(account)),
        }
    }

    Ok(())
}
