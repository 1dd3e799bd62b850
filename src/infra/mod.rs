//! Infrastructure layer implementations.

pub mod blockchain;

pub use blockchain::{EndpointSelector, RpcClientConfig, RpcLedgerClient};
