use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::account_cache::AccountFetcher;
use crate::circuit_breaker::{create_fetch_circuit_breaker, FetchCircuitBreaker};
use crate::config::Credentials;
use crate::errors::AppError;

/// Runs the mintapi command-line tool to list an owner's accounts.
///
/// The tool logs into the aggregator on every call and can take several
/// seconds; each call is bounded by `timeout` and the child is killed when
/// the bound is exceeded.
pub struct MintApiFetcher {
    binary: PathBuf,
    timeout: Duration,
    breaker: FetchCircuitBreaker,
}

impl MintApiFetcher {
    /// Creates a new `MintApiFetcher`.
    ///
    /// # Arguments
    ///
    /// * `binary` - Path of the mintapi executable.
    /// * `timeout` - Upper bound for one fetch.
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            breaker: create_fetch_circuit_breaker(),
        }
    }

    /// Spawns `<binary> --accounts <email> <password> [--session=<token>]`
    /// and returns its standard output.
    async fn run(&self, owner: &Credentials) -> Result<String, AppError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--accounts")
            .arg(&owner.email)
            .arg(&owner.password);
        if let Some(session) = owner.session.as_deref().filter(|s| !s.is_empty()) {
            command.arg(format!("--session={}", session));
        }
        command.stdin(Stdio::null()).kill_on_drop(true);

        // Redact credentials from logs
        tracing::info!(
            "Running {} --accounts [REDACTED]",
            self.binary.display()
        );

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                AppError::Fetch(format!(
                    "Account fetch timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| {
                AppError::Fetch(format!(
                    "Failed to run {}: {}",
                    self.binary.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("Account fetch exited with {}: {}", output.status, stderr.trim());
            return Err(AppError::Fetch(format!(
                "Account fetch exited with {}",
                output.status
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| AppError::Fetch(format!("Account fetch output is not UTF-8: {}", e)))
    }
}

#[async_trait]
impl AccountFetcher for MintApiFetcher {
    async fn fetch(&self, owner: &Credentials) -> Result<String, AppError> {
        match self.breaker.call(self.run(owner)).await {
            Ok(output) => {
                tracing::info!("✓ Account fetch finished ({} bytes)", output.len());
                Ok(output)
            }
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Account fetch skipped: circuit breaker open");
                Err(AppError::Fetch(
                    "Account fetch temporarily disabled after repeated failures".to_string(),
                ))
            }
        }
    }
}
