//! Token-balance access gate for the Hedgy dashboard on Solana.
//!
//! A wallet may open the dashboard when it holds at least the configured
//! amount of the gating token on the active network. Balances are resolved
//! through an ordered list of lookup strategies with exponential backoff;
//! any failure that survives the retries resolves to zero.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
