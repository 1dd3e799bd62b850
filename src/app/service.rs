//! Access-gating service.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::resolver::{BalanceResolver, ResolverConfig};
use crate::domain::{
    AccessDecision, BalanceResponse, DEFAULT_REQUIRED_TOKENS, DEFAULT_TOKEN_NAME, HealthResponse,
    HealthStatus, LedgerClient, Network, NetworkInfo, Sleeper, TokenRegistry, WalletAddress,
};

/// Access threshold settings
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Minimum balance, in token units, that unlocks the dashboard
    pub required_tokens: f64,
    pub token_name: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            required_tokens: DEFAULT_REQUIRED_TOKENS,
            token_name: DEFAULT_TOKEN_NAME.to_string(),
        }
    }
}

/// Everything the service needs to know about the active session
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// RPC endpoint chosen at startup
    pub endpoint: String,
    pub registry: TokenRegistry,
    pub resolver: ResolverConfig,
    pub access: AccessConfig,
}

impl GateConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            registry: TokenRegistry::default(),
            resolver: ResolverConfig::default(),
            access: AccessConfig::default(),
        }
    }

    #[must_use]
    pub fn network(&self) -> Network {
        Network::detect(&self.endpoint)
    }
}

/// Application service containing the gating logic
pub struct AppService {
    ledger: Arc<dyn LedgerClient>,
    resolver: BalanceResolver,
    config: GateConfig,
    network: Network,
}

impl AppService {
    #[must_use]
    pub fn new(ledger: Arc<dyn LedgerClient>, config: GateConfig) -> Self {
        let resolver = BalanceResolver::new(Arc::clone(&ledger), config.resolver.clone());
        let network = config.network();
        Self {
            ledger,
            resolver,
            config,
            network,
        }
    }

    /// Replace the backoff sleeper (builder pattern)
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.resolver = self.resolver.with_sleeper(sleeper);
        self
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    /// Decide whether `address` may open the dashboard.
    /// No connected wallet means a zero balance and no ledger traffic.
    #[instrument(skip_all, fields(connected = address.is_some()))]
    pub async fn check_access(&self, address: Option<WalletAddress>) -> AccessDecision {
        let balance = match &address {
            Some(address) => self.resolve_balance(address).await,
            None => {
                info!("No wallet connected");
                0.0
            }
        };

        let required = self.config.access.required_tokens;
        let authorized = balance >= required;
        if authorized {
            info!(balance, required, "Access granted");
        } else {
            warn!(balance, required, "Insufficient token balance for access");
        }

        AccessDecision {
            address: address.map(|a| a.to_string()),
            network: self.network,
            token_mint: self.token_mint(),
            token_name: self.config.access.token_name.clone(),
            balance,
            required,
            authorized,
        }
    }

    /// Resolved balance of the gating token, zero on any failure
    pub async fn resolve_balance(&self, address: &WalletAddress) -> f64 {
        self.resolver
            .resolve(address, self.network, &self.config.registry)
            .await
    }

    pub async fn balance(&self, address: WalletAddress) -> BalanceResponse {
        let balance = self.resolve_balance(&address).await;
        BalanceResponse {
            address: address.to_string(),
            network: self.network,
            token_mint: self.token_mint(),
            balance,
        }
    }

    #[must_use]
    pub fn network_info(&self) -> NetworkInfo {
        NetworkInfo {
            endpoint: self.config.endpoint.clone(),
            network: self.network,
            token_mint: self.token_mint(),
            token_name: self.config.access.token_name.clone(),
            required_tokens: self.config.access.required_tokens,
        }
    }

    pub async fn health_check(&self) -> HealthResponse {
        let ledger_health = match self.ledger.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Ledger health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(ledger_health, self.network)
    }

    fn token_mint(&self) -> String {
        self.config.registry.mint_for(self.network).to_string()
    }
}
