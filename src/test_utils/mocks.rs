//! Mock implementations for testing.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use solana_program_pack::Pack;
use spl_token_2022::state::{Account as TokenAccount, AccountState};

use crate::domain::{
    AppError, BlockchainError, LedgerClient, ParsedTokenAccount, RawTokenAccount, Sleeper,
    TokenAmount,
};

/// Pack an initialized SPL token account holding `mint`
#[must_use]
pub fn raw_token_account(pubkey: &str, mint: &str) -> RawTokenAccount {
    let account = TokenAccount {
        mint: Pubkey::from_str(mint).unwrap_or_default(),
        owner: Pubkey::from_str(pubkey).unwrap_or_default(),
        amount: 1,
        state: AccountState::Initialized,
        ..Default::default()
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(account, &mut data).unwrap();
    RawTokenAccount {
        pubkey: pubkey.to_string(),
        data,
    }
}

/// Mock ledger client for testing
///
/// Serves a fixed set of token accounts and records every call. Failures can
/// be permanent ([`MockLedgerClient::failing_with`]), limited to the first
/// few lookup sequences ([`MockLedgerClient::with_outage`]) or scoped to one
/// token program ([`MockLedgerClient::failing_program`]).
pub struct MockLedgerClient {
    parsed_accounts: Vec<ParsedTokenAccount>,
    raw_accounts: Vec<RawTokenAccount>,
    balances: HashMap<String, TokenAmount>,
    failure: Option<BlockchainError>,
    outage_sequences: u32,
    program_failures: HashMap<Pubkey, BlockchainError>,
    parsed_calls: AtomicU32,
    total_calls: AtomicU32,
    balance_fetches: Arc<Mutex<Vec<String>>>,
    is_healthy: AtomicBool,
}

impl MockLedgerClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsed_accounts: Vec::new(),
            raw_accounts: Vec::new(),
            balances: HashMap::new(),
            failure: None,
            outage_sequences: 0,
            program_failures: HashMap::new(),
            parsed_calls: AtomicU32::new(0),
            total_calls: AtomicU32::new(0),
            balance_fetches: Arc::new(Mutex::new(Vec::new())),
            is_healthy: AtomicBool::new(true),
        }
    }

    /// Serve a `jsonParsed` account holding `ui_amount` of `mint`
    #[must_use]
    pub fn with_parsed_balance(mut self, pubkey: &str, mint: &str, ui_amount: f64) -> Self {
        self.parsed_accounts.push(ParsedTokenAccount {
            pubkey: pubkey.to_string(),
            mint: mint.to_string(),
            token_amount: TokenAmount {
                ui_amount: Some(ui_amount),
                ..Default::default()
            },
        });
        self
    }

    /// Serve a raw account from every token-program scan
    #[must_use]
    pub fn with_raw_account(mut self, account: RawTokenAccount) -> Self {
        self.raw_accounts.push(account);
        self
    }

    /// Answer `getTokenAccountBalance` for `pubkey`
    #[must_use]
    pub fn with_account_balance(mut self, pubkey: &str, amount: TokenAmount) -> Self {
        self.balances.insert(pubkey.to_string(), amount);
        self
    }

    /// Fail every call with `error`
    #[must_use]
    pub fn failing_with(mut self, error: BlockchainError) -> Self {
        self.failure = Some(error);
        self.outage_sequences = u32::MAX;
        self
    }

    /// Fail every call belonging to the first `sequences` lookup sequences.
    /// A sequence opens with a parsed-accounts query.
    #[must_use]
    pub fn with_outage(mut self, sequences: u32, error: BlockchainError) -> Self {
        self.failure = Some(error);
        self.outage_sequences = sequences;
        self
    }

    /// Fail every account scan of `program_id` with `error`
    #[must_use]
    pub fn failing_program(mut self, program_id: Pubkey, error: BlockchainError) -> Self {
        self.program_failures.insert(program_id, error);
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Total ledger calls made
    pub fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::SeqCst)
    }

    /// Parsed-accounts queries made, i.e. lookup sequences started
    pub fn parsed_call_count(&self) -> u32 {
        self.parsed_calls.load(Ordering::SeqCst)
    }

    /// Token accounts whose balance was fetched explicitly, in order
    pub fn balance_fetches(&self) -> Vec<String> {
        self.balance_fetches.lock().unwrap().clone()
    }

    fn check_outage(&self) -> Result<(), AppError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure
            && self.parsed_calls.load(Ordering::SeqCst) <= self.outage_sequences
        {
            return Err(AppError::Blockchain(error.clone()));
        }
        Ok(())
    }
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Blockchain(BlockchainError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        Ok(())
    }

    async fn get_parsed_token_accounts_by_mint(
        &self,
        _owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<ParsedTokenAccount>, AppError> {
        self.parsed_calls.fetch_add(1, Ordering::SeqCst);
        self.check_outage()?;
        let mint = mint.to_string();
        Ok(self
            .parsed_accounts
            .iter()
            .filter(|a| a.mint == mint)
            .cloned()
            .collect())
    }

    async fn get_token_accounts_by_program(
        &self,
        _owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<RawTokenAccount>, AppError> {
        self.check_outage()?;
        if let Some(error) = self.program_failures.get(program_id) {
            return Err(AppError::Blockchain(error.clone()));
        }
        Ok(self.raw_accounts.clone())
    }

    async fn get_token_account_balance(&self, account: &str) -> Result<TokenAmount, AppError> {
        self.check_outage()?;
        self.balance_fetches
            .lock()
            .unwrap()
            .push(account.to_string());
        self.balances.get(account).cloned().ok_or_else(|| {
            AppError::Blockchain(BlockchainError::RpcError(format!(
                "could not find account {}",
                account
            )))
        })
    }

    async fn get_latest_blockhash(&self) -> Result<String, AppError> {
        self.check_outage()?;
        Ok("mock_blockhash_abc123".to_string())
    }
}

/// Sleeper that records requested delays and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}
