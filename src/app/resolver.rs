//! Token balance resolution with strategy fallback and exponential backoff.
//!
//! The resolver never reports failure to its caller. A wallet with no
//! matching account and a ledger that stayed unreachable through every retry
//! both resolve to `0.0`; access gating treats the two the same way (fail
//! closed). The [`BalanceOutcome`] returned by
//! [`BalanceResolver::resolve_detailed`] keeps them apart for logging only.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::domain::{
    AppError, BalanceOutcome, BalanceQuery, DEVNET_SENTINEL_BALANCE, LedgerClient, Network,
    Sleeper, TokenRegistry, TokioSleeper, WalletAddress,
};
use crate::infra::blockchain::{BalanceStrategy, default_strategies};

/// Retry and shortcut settings for balance resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Retries after the first attempt sequence
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent one
    pub base_delay: Duration,
    /// Balance reported on the test network without touching the ledger.
    /// `None` resolves devnet balances like any other network.
    pub devnet_sentinel: Option<f64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            devnet_sentinel: Some(DEVNET_SENTINEL_BALANCE),
        }
    }
}

impl ResolverConfig {
    /// Delay after the zero-based attempt `attempt` failed: `base * 2^attempt`
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Result of running the strategy list once
enum SequenceResult {
    Found { amount: f64, strategy: &'static str },
    NotFound,
    Failed(AppError),
}

/// Resolves how many units of the gating token a wallet holds
pub struct BalanceResolver {
    ledger: Arc<dyn LedgerClient>,
    strategies: Vec<Box<dyn BalanceStrategy>>,
    sleeper: Arc<dyn Sleeper>,
    config: ResolverConfig,
}

impl BalanceResolver {
    /// Resolver with the default strategy order and a tokio-backed sleeper
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>, config: ResolverConfig) -> Self {
        Self {
            ledger,
            strategies: default_strategies(),
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the strategy list (builder pattern)
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn BalanceStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Replace the backoff sleeper (builder pattern)
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Balance of the registry's token for `network`, in human-readable units
    pub async fn resolve(
        &self,
        address: &WalletAddress,
        network: Network,
        registry: &TokenRegistry,
    ) -> f64 {
        self.resolve_detailed(address, network, registry)
            .await
            .balance()
    }

    /// Same as [`BalanceResolver::resolve`] but reports how the lookup ended
    #[instrument(skip_all, fields(address = %address, network = %network))]
    pub async fn resolve_detailed(
        &self,
        address: &WalletAddress,
        network: Network,
        registry: &TokenRegistry,
    ) -> BalanceOutcome {
        // Checked before any ledger call; bypasses strategies and retries
        if network.is_test_network()
            && let Some(sentinel) = self.config.devnet_sentinel
        {
            info!(balance = sentinel, "Using devnet mock balance");
            return BalanceOutcome::Sentinel(sentinel);
        }

        let token_mint = registry.mint_for(network);
        self.resolve_mint(BalanceQuery::new(*address, network, token_mint))
            .await
    }

    /// Run the retry loop for an explicit mint
    async fn resolve_mint(&self, mut query: BalanceQuery) -> BalanceOutcome {
        info!(token_mint = %query.token_mint, "Checking token balance");

        loop {
            let attempts = query.attempt + 1;
            match self.run_sequence(&query).await {
                SequenceResult::Found { amount, strategy } => {
                    info!(balance = amount, strategy, attempts, "Found token balance");
                    return BalanceOutcome::Found {
                        amount,
                        strategy,
                        attempts,
                    };
                }
                SequenceResult::NotFound => {
                    info!(attempts, "No matching token account, balance is zero");
                    return BalanceOutcome::NotFound { attempts };
                }
                SequenceResult::Failed(e) => {
                    error!(attempt = attempts, error = %e, "Error fetching token balance");
                    if query.attempt >= self.config.max_retries {
                        error!(attempts, "Failed to fetch token balance after all retries");
                        return BalanceOutcome::Exhausted { attempts };
                    }
                    let delay = self.config.backoff_delay(query.attempt);
                    info!(delay = ?delay, "Retrying balance lookup");
                    self.sleeper.sleep(delay).await;
                    query.attempt += 1;
                }
            }
        }
    }

    /// Try each strategy in order until one finds the holding.
    ///
    /// The sequence only fails when no strategy got an answer from the ledger
    /// and at least one of them hit a transient error.
    async fn run_sequence(&self, query: &BalanceQuery) -> SequenceResult {
        let mut answered = false;
        let mut transient = None;

        for strategy in &self.strategies {
            match strategy.lookup(self.ledger.as_ref(), query).await {
                Ok(Some(amount)) => {
                    return SequenceResult::Found {
                        amount,
                        strategy: strategy.name(),
                    };
                }
                Ok(None) => {
                    debug!(strategy = strategy.name(), "Strategy found no account");
                    answered = true;
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), attempt = query.attempt + 1, error = %e, "Balance lookup strategy failed");
                    if transient.is_none() && e.is_transient() {
                        transient = Some(e);
                    }
                }
            }
        }

        match transient {
            Some(e) if !answered => SequenceResult::Failed(e),
            _ => SequenceResult::NotFound,
        }
    }
}
