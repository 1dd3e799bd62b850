//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hedgy_access_gate::api::{RouterConfig, create_router_with_config};
use hedgy_access_gate::app::{AccessConfig, AppService, AppState, GateConfig, ResolverConfig};
use hedgy_access_gate::domain::{
    DEFAULT_DEVNET_MINT, DEFAULT_MAINNET_MINT, DEFAULT_REQUIRED_TOKENS, DEFAULT_TOKEN_NAME,
    DEVNET_SENTINEL_BALANCE, TokenRegistry,
};
use hedgy_access_gate::infra::{EndpointSelector, RpcClientConfig, RpcLedgerClient};

/// Application configuration
struct Config {
    host: String,
    port: u16,
    /// Comma-separated candidate RPC endpoints, in preference order
    rpc_urls: String,
    rpc_timeout: Duration,
    registry: TokenRegistry,
    access: AccessConfig,
    resolver: ResolverConfig,
    enable_cors: bool,
}

impl Config {
    fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("Invalid PORT")?;
        let rpc_urls = env::var("SOLANA_RPC_URL").unwrap_or_default();
        let rpc_timeout = env::var("RPC_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("Invalid RPC_TIMEOUT_SECS")?;

        let mainnet_mint =
            env::var("TOKEN_MINT_MAINNET").unwrap_or_else(|_| DEFAULT_MAINNET_MINT.to_string());
        let devnet_mint =
            env::var("TOKEN_MINT_DEVNET").unwrap_or_else(|_| DEFAULT_DEVNET_MINT.to_string());
        let registry = TokenRegistry::from_base58(&mainnet_mint, &devnet_mint)
            .context("Invalid token mint configuration")?;

        let required_tokens = env::var("REQUIRED_TOKENS")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("Invalid REQUIRED_TOKENS")?
            .unwrap_or(DEFAULT_REQUIRED_TOKENS);
        if !required_tokens.is_finite() || required_tokens < 0.0 {
            bail!("Invalid REQUIRED_TOKENS: {required_tokens}");
        }
        let token_name = env::var("TOKEN_NAME")
            .ok()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_NAME.to_string());

        let max_retries = env::var("BALANCE_MAX_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("Invalid BALANCE_MAX_RETRIES")?;
        let base_delay = env::var("BALANCE_RETRY_BASE_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map(Duration::from_millis)
            .context("Invalid BALANCE_RETRY_BASE_MS")?;
        let devnet_sentinel =
            parse_sentinel(env::var("DEVNET_MOCK_BALANCE").ok(), required_tokens)?;

        let enable_cors = env::var("ENABLE_CORS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Ok(Self {
            host,
            port,
            rpc_urls,
            rpc_timeout,
            registry,
            access: AccessConfig {
                required_tokens,
                token_name,
            },
            resolver: ResolverConfig {
                max_retries,
                base_delay,
                devnet_sentinel,
            },
            enable_cors,
        })
    }
}

/// `DEVNET_MOCK_BALANCE`: unset keeps the default, `off` disables the shortcut.
/// The shortcut must clear `required` or every devnet wallet would be denied.
fn parse_sentinel(value: Option<String>, required: f64) -> Result<Option<f64>> {
    let amount = match value.as_deref().map(str::trim) {
        None | Some("") => DEVNET_SENTINEL_BALANCE,
        Some(v) if v.eq_ignore_ascii_case("off") => return Ok(None),
        Some(v) => match v.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount >= 0.0 => amount,
            _ => bail!("Invalid DEVNET_MOCK_BALANCE: {v}"),
        },
    };
    if amount < required {
        bail!(
            "DEVNET_MOCK_BALANCE ({amount}) is below REQUIRED_TOKENS ({required}); raise it or set it to off"
        );
    }
    Ok(Some(amount))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🔐 Hedgy Access Gate v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let rpc_config = RpcClientConfig {
        timeout: config.rpc_timeout,
        ..Default::default()
    };

    info!("🔎 Selecting RPC endpoint...");
    let endpoint = EndpointSelector::from_list(&config.rpc_urls, rpc_config.clone())
        .select()
        .await;
    let ledger = Arc::new(
        RpcLedgerClient::new(&endpoint, rpc_config).context("Failed to build RPC client")?,
    );

    let gate = GateConfig {
        endpoint,
        registry: config.registry,
        resolver: config.resolver,
        access: config.access,
    };
    info!("   ✓ Network: {}", gate.network());
    info!("   ✓ Gating token: {}", gate.registry.mint_for(gate.network()));
    info!(
        "   ✓ Required balance: {} {}",
        gate.access.required_tokens, gate.access.token_name
    );
    match gate.resolver.devnet_sentinel {
        Some(amount) => info!("   ✓ Devnet mock balance: {}", amount),
        None => info!("   ○ Devnet mock balance disabled"),
    }

    let app_state = Arc::new(AppState::new(AppService::new(ledger, gate)));

    if config.enable_cors {
        info!("   ✓ CORS enabled");
    } else {
        info!("   ○ CORS disabled");
    }
    let router = create_router_with_config(
        app_state,
        RouterConfig {
            enable_cors: config.enable_cors,
        },
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
