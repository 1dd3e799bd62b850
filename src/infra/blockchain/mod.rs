//! Blockchain client implementations.
//!
//! This module provides the read-only Solana RPC client, the balance lookup
//! strategies built on top of it, and startup endpoint selection.

pub mod endpoint;
pub mod solana;
pub mod strategies;

// Re-export main types
pub use solana::{HttpSolanaRpcProvider, RpcClientConfig, RpcLedgerClient, SolanaRpcProvider};

// Re-export strategy types
pub use strategies::{
    BalanceStrategy, OwnerScanStrategy, ParsedAccountsStrategy, default_strategies,
};

pub use endpoint::{DEVNET_FALLBACK_ENDPOINT, EndpointSelector, candidate_endpoints};
