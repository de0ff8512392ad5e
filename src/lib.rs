//! Bookkeeper Voice Skill API Library
//!
//! Answers spoken "what's my balance on X" questions: fetches the owner's
//! financial accounts through the mintapi tool (cached on disk), resolves the
//! spoken account name to one account, and phrases its balance as a sentence.
//!
//! # Modules
//!
//! - `api`: API-layer namespace (handlers, routes).
//! - `core`: Domain-layer namespace (indexing, matching, formatting).
//! - `integrations`: External service integrations.
//! - `account_cache`: TTL cache of fetched account lists.
//! - `alexa_models`: Voice-assistant request and response payloads.
//! - `cache_validator`: Checksummed cache entries.
//! - `circuit_breaker`: Circuit breaker for the account fetcher.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `indexer`: Per-account search corpus.
//! - `matcher`: Keyword to account resolution strategies.
//! - `mintapi_client`: mintapi command-line client.
//! - `models`: Core data models.
//! - `pipeline`: Request resolution pipeline.
//! - `routes`: Router construction.
//! - `speech`: Spoken balance sentences.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod account_cache;
pub mod alexa_models;
pub mod cache_validator;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod indexer;
pub mod matcher;
pub mod mintapi_client;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod speech;
