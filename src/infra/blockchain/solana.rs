//! Read-only Solana JSON-RPC client for token balance lookups.
//!
//! Requests go through [`SolanaRpcProvider`] so tests can swap the HTTP
//! transport for a scripted one. Retries are deliberately absent here: the
//! balance resolver owns the retry policy for the whole lookup sequence.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::domain::{
    AppError, BlockchainError, LedgerClient, ParsedTokenAccount, RawTokenAccount, TokenAmount,
};

/// Configuration for the RPC client
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Commitment level sent with account queries
    pub commitment: String,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            commitment: "confirmed".to_string(),
        }
    }
}

/// Abstract provider for Solana RPC interactions to enable testing
#[async_trait]
pub trait SolanaRpcProvider: Send + Sync {
    /// Send a JSON-RPC request and return its `result`
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError>;

    /// Endpoint this provider talks to
    fn endpoint(&self) -> &str;
}

/// HTTP-based Solana RPC provider
pub struct HttpSolanaRpcProvider {
    http_client: Client,
    rpc_url: String,
}

impl HttpSolanaRpcProvider {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Blockchain(BlockchainError::Connection(e.to_string())))?;

        Ok(Self {
            http_client,
            rpc_url: rpc_url.to_string(),
        })
    }
}

#[async_trait]
impl SolanaRpcProvider for HttpSolanaRpcProvider {
    async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Blockchain(BlockchainError::RpcError(format!(
                "HTTP {} from {}",
                status, method
            ))));
        }

        let rpc_response: JsonRpcResponse<serde_json::Value> = response.json().await.map_err(|e| {
            AppError::Blockchain(BlockchainError::MalformedResponse(e.to_string()))
        })?;

        if let Some(error) = rpc_response.error {
            return Err(AppError::Blockchain(BlockchainError::RpcError(format!(
                "{}: {}",
                error.code, error.message
            ))));
        }

        rpc_response.result.ok_or_else(|| {
            AppError::Blockchain(BlockchainError::MalformedResponse(
                "Empty response".to_string(),
            ))
        })
    }

    fn endpoint(&self) -> &str {
        &self.rpc_url
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Blockchain(BlockchainError::Timeout(e.to_string()))
    } else if e.is_connect() {
        AppError::Blockchain(BlockchainError::Connection(e.to_string()))
    } else {
        AppError::Blockchain(BlockchainError::RpcError(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// `{ "context": {..}, "value": T }` wrapper used by most account queries
#[derive(Debug, Deserialize)]
struct RpcContextResult<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct KeyedAccount<D> {
    pubkey: String,
    account: AccountEnvelope<D>,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelope<D> {
    data: D,
}

#[derive(Debug, Deserialize)]
struct ParsedAccountData {
    parsed: ParsedTokenState,
}

#[derive(Debug, Deserialize)]
struct ParsedTokenState {
    info: ParsedTokenInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParsedTokenInfo {
    mint: String,
    token_amount: TokenAmount,
}

/// `["<payload>", "base64"]`
#[derive(Debug, Deserialize)]
struct EncodedAccountData(String, String);

#[derive(Debug, Deserialize)]
struct BlockhashResponse {
    blockhash: String,
}

/// Solana RPC ledger client
pub struct RpcLedgerClient {
    provider: Box<dyn SolanaRpcProvider>,
    config: RpcClientConfig,
}

impl RpcLedgerClient {
    /// Create a new RPC ledger client with custom configuration
    pub fn new(rpc_url: &str, config: RpcClientConfig) -> Result<Self, AppError> {
        let provider = HttpSolanaRpcProvider::new(rpc_url, config.timeout)?;
        info!(rpc_url = %rpc_url, "Created ledger client");
        Ok(Self {
            provider: Box::new(provider),
            config,
        })
    }

    /// Create a new RPC ledger client with default configuration
    pub fn with_defaults(rpc_url: &str) -> Result<Self, AppError> {
        Self::new(rpc_url, RpcClientConfig::default())
    }

    /// Create a new client with a specific provider (useful for testing)
    pub fn with_provider(provider: Box<dyn SolanaRpcProvider>, config: RpcClientConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.provider.endpoint()
    }

    /// Make a single RPC call and decode its result
    #[instrument(skip(self, params))]
    async fn rpc_call<R: DeserializeOwned + Send>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, AppError> {
        let result_value = self.provider.send_request(method, params).await?;
        serde_json::from_value(result_value).map_err(|e| {
            AppError::Blockchain(BlockchainError::MalformedResponse(format!(
                "Deserialization error in {}: {}",
                method, e
            )))
        })
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let status: String = self.rpc_call("getHealth", serde_json::json!([])).await?;
        if status == "ok" {
            Ok(())
        } else {
            Err(AppError::Blockchain(BlockchainError::RpcError(format!(
                "Node reported health '{}'",
                status
            ))))
        }
    }

    #[instrument(skip_all, fields(owner = %owner, mint = %mint))]
    async fn get_parsed_token_accounts_by_mint(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Vec<ParsedTokenAccount>, AppError> {
        let params = serde_json::json!([
            owner.to_string(),
            { "mint": mint.to_string() },
            { "encoding": "jsonParsed", "commitment": self.config.commitment }
        ]);
        let result: RpcContextResult<Vec<KeyedAccount<ParsedAccountData>>> =
            self.rpc_call("getTokenAccountsByOwner", params).await?;

        let accounts: Vec<ParsedTokenAccount> = result
            .value
            .into_iter()
            .map(|keyed| ParsedTokenAccount {
                pubkey: keyed.pubkey,
                mint: keyed.account.data.parsed.info.mint,
                token_amount: keyed.account.data.parsed.info.token_amount,
            })
            .collect();
        debug!(count = accounts.len(), "Parsed token accounts fetched");
        Ok(accounts)
    }

    #[instrument(skip_all, fields(owner = %owner, program = %program_id))]
    async fn get_token_accounts_by_program(
        &self,
        owner: &Pubkey,
        program_id: &Pubkey,
    ) -> Result<Vec<RawTokenAccount>, AppError> {
        let params = serde_json::json!([
            owner.to_string(),
            { "programId": program_id.to_string() },
            { "encoding": "base64", "commitment": self.config.commitment }
        ]);
        let result: RpcContextResult<Vec<KeyedAccount<EncodedAccountData>>> =
            self.rpc_call("getTokenAccountsByOwner", params).await?;

        let mut accounts = Vec::with_capacity(result.value.len());
        for keyed in result.value {
            let EncodedAccountData(payload, encoding) = keyed.account.data;
            if encoding != "base64" {
                return Err(AppError::Blockchain(BlockchainError::MalformedResponse(
                    format!("Unexpected account encoding '{}'", encoding),
                )));
            }
            let data = BASE64.decode(payload.as_bytes()).map_err(|e| {
                AppError::Blockchain(BlockchainError::MalformedResponse(format!(
                    "Invalid base64 account data for {}: {}",
                    keyed.pubkey, e
                )))
            })?;
            accounts.push(RawTokenAccount {
                pubkey: keyed.pubkey,
                data,
            });
        }
        debug!(count = accounts.len(), "Raw token accounts fetched");
        Ok(accounts)
    }

    #[instrument(skip(self))]
    async fn get_token_account_balance(&self, account: &str) -> Result<TokenAmount, AppError> {
        let params = serde_json::json!([account, { "commitment": self.config.commitment }]);
        let result: RpcContextResult<TokenAmount> =
            self.rpc_call("getTokenAccountBalance", params).await?;
        Ok(result.value)
    }

    #[instrument(skip(self))]
    async fn get_latest_blockhash(&self) -> Result<String, AppError> {
        let params = serde_json::json!([{ "commitment": self.config.commitment }]);
        let result: RpcContextResult<BlockhashResponse> =
            self.rpc_call("getLatestBlockhash", params).await?;
        Ok(result.value.blockhash)
    }
}
