//! Domain traits defining contracts for external systems.

use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use super::error::AppError;
use super::types::{ParsedTokenAccount, RawTokenAccount, TokenAmount};

/// Read-only view of the Solana ledger used for balance lookups.
///
/// Implementations never submit transactions.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Check RPC connectivity (`getHealth`)
    async fn health_check(&self) -> Result<(), AppError>;

    /// Token accounts owned by `owner` holding `mint`, in `jsonParsed` form
    async fn get_parsed_token_accounts_by_mint(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<ParsedTokenAccount>, AppError>;

    /// Token accounts owned by `owner` under a token program, as raw data
    async fn get_token_accounts_by_program(
        &self,
        owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<RawTokenAccount>, AppError>;

    /// Balance of a single token account (`getTokenAccountBalance`)
    async fn get_token_account_balance(&self, account: &str) -> Result<TokenAmount, AppError>;

    /// Latest blockhash, used as a liveness check
    async fn get_latest_blockhash(&self) -> Result<String, AppError> {
        Err(AppError::NotSupported(
            "get_latest_blockhash not implemented".to_string(),
        ))
    }
}

/// Time source for retry backoff, injectable so tests don't wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
