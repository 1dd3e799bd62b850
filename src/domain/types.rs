//! Domain types for balance resolution and access gating.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::{extension::StateWithExtensions, state::Account as TokenAccount};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::error::{BlockchainError, ConfigError, ValidationError};

/// Default SPARK mint on mainnet-beta
pub const DEFAULT_MAINNET_MINT: &str = "5Tytu6cHm69UN9k1ZEqrvCmfJsdUAJnTJpaAV1fZ2e4h";

/// Default SPARK mint on devnet
pub const DEFAULT_DEVNET_MINT: &str = "Gh9ZwEmdLJ8DscKNTkTqPbNwLNNBjuSzaG9Vp2KGtKJr";

/// Balance reported on the test network without querying the ledger.
/// Sits above the default access threshold.
pub const DEVNET_SENTINEL_BALANCE: f64 = 150_000.0;

/// Minimum holding required to enter the dashboard
pub const DEFAULT_REQUIRED_TOKENS: f64 = 100_000.0;

/// Display name of the gating token
pub const DEFAULT_TOKEN_NAME: &str = "SPARK";

/// Solana cluster the active endpoint points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production cluster
    Mainnet,
    /// Designated test network
    Devnet,
}

impl Network {
    /// Detect the network from an RPC endpoint URL.
    ///
    /// Any endpoint mentioning `devnet` is the test network; everything else
    /// (including private mainnet providers and localhost) counts as mainnet.
    ///
    /// # Examples
    /// ```
    /// use hedgy_access_gate::domain::Network;
    ///
    /// assert_eq!(Network::detect("https://api.devnet.solana.com"), Network::Devnet);
    /// assert_eq!(Network::detect("https://api.mainnet-beta.solana.com"), Network::Mainnet);
    /// ```
    pub fn detect(endpoint: &str) -> Self {
        if endpoint.to_lowercase().contains("devnet") {
            Network::Devnet
        } else {
            Network::Mainnet
        }
    }

    pub fn is_test_network(&self) -> bool {
        matches!(self, Network::Devnet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Devnet => "devnet",
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            _ => Err(format!("Invalid network: {}", s)),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A wallet address on the ledger.
///
/// The resolver takes this already parsed; turning user input into one is
/// the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress(Pubkey);

impl WalletAddress {
    #[must_use]
    pub fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    #[must_use]
    pub fn pubkey(&self) -> &Pubkey {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| ValidationError::InvalidAddress(format!("{}: {}", trimmed, e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ValidationError::InvalidAddress(format!(
                "{}: expected 32 bytes, got {}",
                trimmed,
                b.len()
            ))
        })?;
        Ok(Self(Pubkey::new_from_array(bytes)))
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static mapping from network to the gating token's mint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRegistry {
    pub mainnet: Pubkey,
    pub devnet: Pubkey,
}

impl TokenRegistry {
    #[must_use]
    pub fn new(mainnet: Pubkey, devnet: Pubkey) -> Self {
        Self { mainnet, devnet }
    }

    /// Build a registry from Base58 mint strings
    pub fn from_base58(mainnet: &str, devnet: &str) -> Result<Self, ConfigError> {
        let parse = |key: &str, value: &str| {
            Pubkey::from_str(value.trim()).map_err(|e| ConfigError::Invalid {
                key: key.to_string(),
                message: format!("'{}' is not a valid mint address: {}", value, e),
            })
        };
        Ok(Self {
            mainnet: parse("TOKEN_MINT_MAINNET", mainnet)?,
            devnet: parse("TOKEN_MINT_DEVNET", devnet)?,
        })
    }

    /// Mint of the gating token on the given network
    #[must_use]
    pub fn mint_for(&self, network: Network) -> Pubkey {
        match network {
            Network::Mainnet => self.mainnet,
            Network::Devnet => self.devnet,
        }
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        // Both constants are valid Base58 pubkeys
        Self::from_base58(DEFAULT_MAINNET_MINT, DEFAULT_DEVNET_MINT)
            .unwrap_or_else(|_| Self::new(Pubkey::default(), Pubkey::default()))
    }
}

/// `uiTokenAmount` as returned by `getTokenAccountBalance` and inside
/// `jsonParsed` token accounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw amount in base units, as a decimal string
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl TokenAmount {
    /// Amount in human-readable units (adjusted for decimals)
    #[must_use]
    pub fn ui_value(&self) -> f64 {
        if let Some(ui) = self.ui_amount {
            return ui.max(0.0);
        }
        if let Some(parsed) = self
            .ui_amount_string
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
        {
            return parsed.max(0.0);
        }
        match self.amount.parse::<u64>() {
            Ok(raw) => raw as f64 / 10f64.powi(i32::from(self.decimals)),
            Err(_) => 0.0,
        }
    }
}

/// Token account returned with `jsonParsed` encoding
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTokenAccount {
    /// Token account address
    pub pubkey: String,
    pub mint: String,
    pub token_amount: TokenAmount,
}

/// Token account returned with `base64` encoding
#[derive(Debug, Clone, PartialEq)]
pub struct RawTokenAccount {
    /// Token account address
    pub pubkey: String,
    /// Decoded account data (SPL token account layout)
    pub data: Vec<u8>,
}

impl RawTokenAccount {
    /// Unpack the account data and return its mint.
    ///
    /// Token-2022 accounts carry the SPL Token layout as their base state, so
    /// both programs decode here. Truncated, uninitialized or multisig data is
    /// a malformed response.
    pub fn mint(&self) -> Result<Pubkey, BlockchainError> {
        let state = StateWithExtensions::<TokenAccount>::unpack(&self.data).map_err(|e| {
            BlockchainError::MalformedResponse(format!(
                "token account {} did not unpack: {e}",
                self.pubkey
            ))
        })?;
        Ok(state.base.mint)
    }
}

/// One logical balance lookup. Lives only for the duration of a resolve call.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceQuery {
    pub address: WalletAddress,
    pub network: Network,
    pub token_mint: Pubkey,
    /// Zero-based attempt sequence number
    pub attempt: u32,
}

impl BalanceQuery {
    #[must_use]
    pub fn new(address: WalletAddress, network: Network, token_mint: Pubkey) -> Self {
        Self {
            address,
            network,
            token_mint,
            attempt: 0,
        }
    }
}

/// How a resolution ended. Callers only ever see [`BalanceOutcome::balance`];
/// the variant exists for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum BalanceOutcome {
    /// Test network shortcut, no ledger calls made
    Sentinel(f64),
    /// A strategy found a matching token account
    Found {
        amount: f64,
        strategy: &'static str,
        attempts: u32,
    },
    /// The ledger answered and the wallet holds no matching account
    NotFound { attempts: u32 },
    /// Every attempt sequence failed with transient errors
    Exhausted { attempts: u32 },
}

impl BalanceOutcome {
    #[must_use]
    pub fn balance(&self) -> f64 {
        match self {
            Self::Sentinel(amount) => *amount,
            Self::Found { amount, .. } => *amount,
            Self::NotFound { .. } | Self::Exhausted { .. } => 0.0,
        }
    }

    /// Number of attempt sequences issued (zero for the sentinel path)
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Sentinel(_) => 0,
            Self::Found { attempts, .. }
            | Self::NotFound { attempts }
            | Self::Exhausted { attempts } => *attempts,
        }
    }
}

/// Query string for `GET /access`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AccessQuery {
    /// Connected wallet address (Base58). Absent when no wallet is connected.
    #[validate(length(max = 64, message = "Address is too long"))]
    #[param(example = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF")]
    pub address: Option<String>,
}

/// Result of the access-gating check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AccessDecision {
    /// Wallet that was checked, if one was connected
    #[schema(example = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF")]
    pub address: Option<String>,
    pub network: Network,
    /// Mint of the gating token on the active network
    #[schema(example = "5Tytu6cHm69UN9k1ZEqrvCmfJsdUAJnTJpaAV1fZ2e4h")]
    pub token_mint: String,
    #[schema(example = "SPARK")]
    pub token_name: String,
    /// Resolved balance in token units
    #[schema(example = 150000.0)]
    pub balance: f64,
    /// Minimum balance required for access
    #[schema(example = 100000.0)]
    pub required: f64,
    pub authorized: bool,
}

/// Raw balance for a wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF")]
    pub address: String,
    pub network: Network,
    pub token_mint: String,
    #[schema(example = 500.0)]
    pub balance: f64,
}

/// Active network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NetworkInfo {
    #[schema(example = "https://api.mainnet-beta.solana.com")]
    pub endpoint: String,
    pub network: Network,
    pub token_mint: String,
    pub token_name: String,
    pub required_tokens: f64,
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Critical systems unavailable
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Ledger RPC health status
    pub ledger: HealthStatus,
    pub network: Network,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(ledger: HealthStatus, network: Network) -> Self {
        Self {
            status: ledger,
            ledger,
            network,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Invalid address: not-a-key")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_detection() {
        assert_eq!(
            Network::detect("https://api.devnet.solana.com"),
            Network::Devnet
        );
        assert_eq!(
            Network::detect("https://devnet.helius-rpc.com/?api-key=x"),
            Network::Devnet
        );
        assert_eq!(
            Network::detect("https://API.DEVNET.solana.com"),
            Network::Devnet
        );
        assert_eq!(
            Network::detect("https://api.mainnet-beta.solana.com"),
            Network::Mainnet
        );
        assert_eq!(Network::detect("http://localhost:8899"), Network::Mainnet);
    }

    #[test]
    fn test_network_display_and_parsing() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!(Network::from_str("devnet").unwrap(), Network::Devnet);
        assert_eq!(Network::from_str("mainnet-beta").unwrap(), Network::Mainnet);
        assert!(Network::from_str("testnet").is_err());
    }

    #[test]
    fn test_wallet_address_parsing() {
        let addr: WalletAddress = " HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF "
            .parse()
            .unwrap();
        assert_eq!(
            addr.to_string(),
            "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF"
        );

        let err = "not-a-pubkey".parse::<WalletAddress>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress(_)));

        let err = "abc".parse::<WalletAddress>().unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn test_registry_selects_mint_by_network() {
        let registry = TokenRegistry::default();
        assert_eq!(
            registry.mint_for(Network::Mainnet).to_string(),
            DEFAULT_MAINNET_MINT
        );
        assert_eq!(
            registry.mint_for(Network::Devnet).to_string(),
            DEFAULT_DEVNET_MINT
        );
    }

    #[test]
    fn test_registry_rejects_invalid_mint() {
        let err = TokenRegistry::from_base58("bogus", DEFAULT_DEVNET_MINT).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "TOKEN_MINT_MAINNET"));
    }

    #[test]
    fn test_token_amount_prefers_ui_amount() {
        let amount: TokenAmount = serde_json::from_value(serde_json::json!({
            "amount": "500000000",
            "decimals": 6,
            "uiAmount": 500.0,
            "uiAmountString": "500"
        }))
        .unwrap();
        assert_eq!(amount.ui_value(), 500.0);
    }

    #[test]
    fn test_token_amount_null_ui_amount_falls_back() {
        let amount: TokenAmount = serde_json::from_value(serde_json::json!({
            "amount": "1234500",
            "decimals": 4,
            "uiAmount": null
        }))
        .unwrap();
        assert_eq!(amount.ui_value(), 123.45);

        let from_string = TokenAmount {
            ui_amount_string: Some("42.5".into()),
            ..Default::default()
        };
        assert_eq!(from_string.ui_value(), 42.5);
    }

    #[test]
    fn test_token_amount_empty_is_zero() {
        assert_eq!(TokenAmount::default().ui_value(), 0.0);
    }

    #[test]
    fn test_outcome_collapses_failures_to_zero() {
        assert_eq!(BalanceOutcome::NotFound { attempts: 1 }.balance(), 0.0);
        assert_eq!(BalanceOutcome::Exhausted { attempts: 4 }.balance(), 0.0);
        assert_eq!(BalanceOutcome::Sentinel(150_000.0).balance(), 150_000.0);
        assert_eq!(BalanceOutcome::Sentinel(150_000.0).attempts(), 0);
    }

    #[test]
    fn test_raw_account_unpacks_mint() {
        let account = crate::test_utils::raw_token_account("AcctA", DEFAULT_MAINNET_MINT);
        assert_eq!(account.mint().unwrap().to_string(), DEFAULT_MAINNET_MINT);
    }

    #[test]
    fn test_raw_account_rejects_short_data() {
        let account = RawTokenAccount {
            pubkey: "AcctShort".to_string(),
            data: vec![7u8; 40],
        };
        let err = account.mint().unwrap_err();
        assert!(matches!(err, BlockchainError::MalformedResponse(_)));
        assert!(err.to_string().contains("AcctShort"));
    }

    #[test]
    fn test_raw_account_rejects_uninitialized_data() {
        // right length, but the state byte says uninitialized
        let mut data = vec![0u8; 165];
        data[..32].copy_from_slice(&Pubkey::from_str(DEFAULT_MAINNET_MINT).unwrap().to_bytes());
        let account = RawTokenAccount {
            pubkey: "AcctZero".to_string(),
            data,
        };
        assert!(account.mint().is_err());
    }
}
