//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

use crate::app::AppState;
use crate::domain::{
    AccessDecision, AccessQuery, AppError, BalanceResponse, BlockchainError, ErrorDetail,
    ErrorResponse, HealthResponse, HealthStatus, Network, NetworkInfo, ValidationError,
    WalletAddress,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hedgy Access Gate API",
        version = "0.1.0",
        description = "Token-balance gate for the Hedgy dashboard on Solana",
        license(
            name = "MIT"
        )
    ),
    paths(
        access_handler,
        balance_handler,
        network_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
    ),
    components(
        schemas(
            AccessQuery,
            AccessDecision,
            BalanceResponse,
            NetworkInfo,
            Network,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
        )
    ),
    tags(
        (name = "access", description = "Dashboard access gating"),
        (name = "network", description = "Active network configuration"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Check dashboard access for a wallet
///
/// Resolves the wallet's gating-token balance on the active network and
/// compares it with the configured threshold. Without an `address` the
/// wallet counts as not connected: balance zero, access denied.
///
/// Lookup failures never surface as errors; they resolve to a zero balance.
#[utoipa::path(
    get,
    path = "/access",
    tag = "access",
    params(AccessQuery),
    responses(
        (status = 200, description = "Access decision", body = AccessDecision),
        (status = 400, description = "Malformed wallet address", body = ErrorResponse)
    )
)]
pub async fn access_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessDecision>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(ValidationError::Multiple(e.to_string())))?;

    let address = match query.address.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<WalletAddress>()?),
        _ => None,
    };

    let decision = state.service.check_access(address).await;
    Ok(Json(decision))
}

/// Get the gating-token balance of a wallet
#[utoipa::path(
    get,
    path = "/balance/{address}",
    tag = "access",
    params(
        ("address" = String, Path, description = "Wallet address (Base58)")
    ),
    responses(
        (status = 200, description = "Resolved balance", body = BalanceResponse),
        (status = 400, description = "Malformed wallet address", body = ErrorResponse)
    )
)]
pub async fn balance_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let address: WalletAddress = address.parse()?;
    info!(address = %address, "Balance requested");
    Ok(Json(state.service.balance(address).await))
}

/// Active network, endpoint and gating token
#[utoipa::path(
    get,
    path = "/network",
    tag = "network",
    responses(
        (status = 200, description = "Network configuration", body = NetworkInfo)
    )
)]
pub async fn network_handler(State(state): State<Arc<AppState>>) -> Json<NetworkInfo> {
    Json(state.service.network_info())
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes liveness check
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness check
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ledger RPC reachable"),
        (status = 503, description = "Ledger RPC unreachable")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.service.health_check().await.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type) = match &self {
            AppError::Blockchain(bc_err) => match bc_err {
                BlockchainError::Connection(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "blockchain_error")
                }
                BlockchainError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                BlockchainError::RpcError(_) | BlockchainError::MalformedResponse(_) => {
                    (StatusCode::BAD_GATEWAY, "blockchain_error")
                }
            },
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotSupported(_) => (StatusCode::NOT_IMPLEMENTED, "not_supported"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
