use failsafe::backoff::{self, Exponential};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::{Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding the external account fetch.
pub type FetchCircuitBreaker = StateMachine<ConsecutiveFailures<Exponential>, ()>;

/// Creates a circuit breaker for the account fetch process.
///
/// A broken fetch binary or expired credentials fail the same way every
/// time; once open, the breaker rejects calls without spawning the process.
/// It never retries a call.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// # States
///
/// - **CLOSED**: Normal operation, fetches run.
/// - **OPEN**: Too many failures, fetches fail fast.
/// - **HALF_OPEN**: Testing if the fetch recovered.
pub fn create_fetch_circuit_breaker() -> FetchCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
