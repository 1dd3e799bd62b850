//! Test utilities and mock implementations.

pub mod mocks;

pub use mocks::{MockLedgerClient, RecordingSleeper, raw_token_account};
