//! RPC endpoint selection.
//!
//! The operator may list several endpoints; the first one that answers both
//! `getHealth` and `getLatestBlockhash` becomes the session endpoint. The
//! public devnet endpoint is always the last candidate and the fallback when
//! nothing answers.

use tracing::{error, info, warn};

use super::solana::{RpcClientConfig, RpcLedgerClient};
use crate::domain::{AppError, LedgerClient};

/// Public devnet endpoint, always tried last
pub const DEVNET_FALLBACK_ENDPOINT: &str = "https://api.devnet.solana.com";

/// Split a comma-separated endpoint list and append the devnet fallback.
///
/// Blank entries are dropped and duplicates keep their first position.
#[must_use]
pub fn candidate_endpoints(configured: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let entries = configured
        .split(',')
        .map(str::trim)
        .chain(std::iter::once(DEVNET_FALLBACK_ENDPOINT));

    for entry in entries {
        if !entry.is_empty() && !candidates.iter().any(|c| c == entry) {
            candidates.push(entry.to_string());
        }
    }
    candidates
}

/// Picks the first reachable RPC endpoint
pub struct EndpointSelector {
    candidates: Vec<String>,
    config: RpcClientConfig,
}

impl EndpointSelector {
    #[must_use]
    pub fn new(candidates: Vec<String>, config: RpcClientConfig) -> Self {
        Self { candidates, config }
    }

    /// Build from the raw `SOLANA_RPC_URL` value
    #[must_use]
    pub fn from_list(configured: &str, config: RpcClientConfig) -> Self {
        Self::new(candidate_endpoints(configured), config)
    }

    /// Check that `endpoint` is healthy and serving blockhashes
    pub async fn check_endpoint(&self, endpoint: &str) -> Result<(), AppError> {
        let client = RpcLedgerClient::new(endpoint, self.config.clone())?;
        client.health_check().await?;
        client.get_latest_blockhash().await?;
        Ok(())
    }

    /// First candidate that passes [`EndpointSelector::check_endpoint`], else the devnet fallback
    pub async fn select(&self) -> String {
        for endpoint in &self.candidates {
            match self.check_endpoint(endpoint).await {
                Ok(()) => {
                    info!(endpoint = %endpoint, "Using RPC endpoint");
                    return endpoint.clone();
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "RPC endpoint failed");
                }
            }
        }

        error!(
            fallback = DEVNET_FALLBACK_ENDPOINT,
            "All RPC endpoints failed, defaulting to devnet"
        );
        DEVNET_FALLBACK_ENDPOINT.to_string()
    }
}
