//! Application layer containing business logic and shared state.

pub mod resolver;
pub mod service;
pub mod state;

pub use resolver::{BalanceResolver, ResolverConfig};
pub use service::{AccessConfig, AppService, GateConfig};
pub use state::AppState;
