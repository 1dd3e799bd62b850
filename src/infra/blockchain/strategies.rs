//! Token balance lookup strategies.
//!
//! The resolver walks an ordered list of [`BalanceStrategy`] implementations
//! and stops at the first one that finds a holding. The parsed-accounts query
//! comes first because the node hands back a decimal-adjusted amount in one
//! round trip; the owner scan needs an extra balance call per candidate.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::domain::{AppError, BalanceQuery, LedgerClient};

// ============================================================================
// STRATEGY TRAIT
// ============================================================================

/// One way of finding a wallet's balance for a mint.
///
/// `Ok(None)` means the ledger answered and nothing matched. `Err` means the
/// lookup itself failed; the resolver logs it and moves on.
#[async_trait]
pub trait BalanceStrategy: Send + Sync {
    async fn lookup(
        &self,
        ledger: &dyn LedgerClient,
        query: &BalanceQuery,
    ) -> Result<Option<f64>, AppError>;

    /// Human-readable strategy name for logging
    fn name(&self) -> &'static str;
}

/// Default lookup order: parsed accounts, then owner scan over both token programs
#[must_use]
pub fn default_strategies() -> Vec<Box<dyn BalanceStrategy>> {
    vec![
        Box::new(ParsedAccountsStrategy),
        Box::new(OwnerScanStrategy::default()),
    ]
}

// ============================================================================
// PARSED ACCOUNTS (STRATEGY A)
// ============================================================================

/// `getTokenAccountsByOwner` filtered by mint with `jsonParsed` encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsedAccountsStrategy;

#[async_trait]
impl BalanceStrategy for ParsedAccountsStrategy {
    async fn lookup(
        &self,
        ledger: &dyn LedgerClient,
        query: &BalanceQuery,
    ) -> Result<Option<f64>, AppError> {
        let accounts = ledger
            .get_parsed_token_accounts_by_mint(query.address.pubkey(), &query.token_mint)
            .await?;

        match accounts.first() {
            Some(account) => {
                let balance = account.token_amount.ui_value();
                debug!(account = %account.pubkey, balance, "Parsed token account found");
                Ok(Some(balance))
            }
            None => {
                debug!("No token accounts found with parsed lookup");
                Ok(None)
            }
        }
    }

    fn name(&self) -> &'static str {
        "parsed_accounts"
    }
}

// ============================================================================
// OWNER SCAN (STRATEGY B)
// ============================================================================

/// Enumerates token accounts per token program, matches the mint from raw
/// account data, then fetches the balance of the first match explicitly.
#[derive(Debug, Clone)]
pub struct OwnerScanStrategy {
    program_ids: Vec<Pubkey>,
}

impl Default for OwnerScanStrategy {
    /// SPL Token first, then Token-2022
    fn default() -> Self {
        Self {
            program_ids: vec![spl_token::id(), spl_token_2022::id()],
        }
    }
}

#[async_trait]
impl BalanceStrategy for OwnerScanStrategy {
    async fn lookup(
        &self,
        ledger: &dyn LedgerClient,
        query: &BalanceQuery,
    ) -> Result<Option<f64>, AppError> {
        let mut last_error = None;

        for program_id in &self.program_ids {
            let accounts = match ledger
                .get_token_accounts_by_program(query.address.pubkey(), program_id)
                .await
            {
                Ok(accounts) => accounts,
                Err(e) => {
                    debug!(program = %program_id, error = %e, "Owner scan failed for program");
                    if last_error.as_ref().is_none_or(|prev: &AppError| !prev.is_transient()) {
                        last_error = Some(e);
                    }
                    continue;
                }
            };

            for account in &accounts {
                match account.mint() {
                    Ok(mint) if mint == query.token_mint => {
                        let amount = ledger.get_token_account_balance(&account.pubkey).await?;
                        let balance = amount.ui_value();
                        debug!(account = %account.pubkey, program = %program_id, balance, "Matching token account found by scan");
                        return Ok(Some(balance));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(account = %account.pubkey, program = %program_id, error = %e, "Skipping undecodable token account");
                        if last_error.is_none() {
                            last_error = Some(AppError::Blockchain(e));
                        }
                    }
                }
            }
        }

        // A program we could not scan may hold the account; that is not a confirmed miss
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "owner_scan"
    }
}

// ============================================================================
// TESTS
// ============================================================================
