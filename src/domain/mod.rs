//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AppError, BlockchainError, ConfigError, ValidationError};
pub use traits::{LedgerClient, Sleeper, TokioSleeper};
pub use types::{
    AccessDecision, AccessQuery, BalanceOutcome, BalanceQuery, BalanceResponse,
    DEFAULT_DEVNET_MINT, DEFAULT_MAINNET_MINT, DEFAULT_REQUIRED_TOKENS, DEFAULT_TOKEN_NAME,
    DEVNET_SENTINEL_BALANCE, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus, Network,
    NetworkInfo, ParsedTokenAccount, RawTokenAccount, TokenAmount, TokenRegistry, WalletAddress,
};
