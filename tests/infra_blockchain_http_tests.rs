//! HTTP-based integration tests for the Solana RPC ledger client.
//!
//! Uses `wiremock` to stand in for JSON-RPC nodes: response decoding, error
//! classification, endpoint selection and a full balance resolution over HTTP.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tokio_test::{assert_err, assert_ok};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use hedgy_access_gate::app::{BalanceResolver, ResolverConfig};
use hedgy_access_gate::domain::{
    AppError, BlockchainError, DEFAULT_MAINNET_MINT, LedgerClient, Network, TokenRegistry,
    WalletAddress,
};
use hedgy_access_gate::infra::blockchain::{
    DEVNET_FALLBACK_ENDPOINT, EndpointSelector, RpcClientConfig, RpcLedgerClient,
};
use hedgy_access_gate::test_utils::raw_token_account;

const OWNER: &str = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF";
const TOKEN_ACCOUNT: &str = "7UX2i7SucgLMQcfZ75s3VXmZZY4YRUyJN9X1RgfMoDUi";

/// Matches a JSON-RPC call by method and, optionally, by requested encoding
struct RpcMethod {
    method: &'static str,
    encoding: Option<&'static str>,
}

impl Match for RpcMethod {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
            return false;
        };
        body["method"] == self.method
            && self
                .encoding
                .is_none_or(|encoding| body["params"][2]["encoding"] == encoding)
    }
}

fn rpc(method: &'static str) -> RpcMethod {
    RpcMethod {
        method,
        encoding: None,
    }
}

fn rpc_with_encoding(method: &'static str, encoding: &'static str) -> RpcMethod {
    RpcMethod {
        method,
        encoding: Some(encoding),
    }
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result
    }))
}

fn parsed_account(mint: &str, ui_amount: f64) -> Value {
    json!({
        "pubkey": TOKEN_ACCOUNT,
        "account": {
            "data": {
                "parsed": {
                    "info": {
                        "isNative": false,
                        "mint": mint,
                        "owner": OWNER,
                        "state": "initialized",
                        "tokenAmount": {
                            "amount": "0",
                            "decimals": 6,
                            "uiAmount": ui_amount,
                            "uiAmountString": ui_amount.to_string()
                        }
                    },
                    "type": "account"
                },
                "program": "spl-token",
                "space": 165
            },
            "executable": false,
            "lamports": 2_039_280,
            "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "rentEpoch": 0
        }
    })
}

fn base64_account(mint: &str) -> Value {
    let data = raw_token_account(TOKEN_ACCOUNT, mint).data;
    json!({
        "pubkey": TOKEN_ACCOUNT,
        "account": {
            "data": [BASE64.encode(&data), "base64"],
            "executable": false,
            "lamports": 2_039_280,
            "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
            "rentEpoch": 0
        }
    })
}

fn with_context(value: Value) -> Value {
    json!({ "context": { "slot": 341_197_053 }, "value": value })
}

fn client(server: &MockServer) -> RpcLedgerClient {
    RpcLedgerClient::new(&server.uri(), RpcClientConfig::default()).unwrap()
}

fn owner() -> WalletAddress {
    OWNER.parse().unwrap()
}

// ============================================================================
// LEDGER CLIENT DECODING
// ============================================================================

mod ledger_client_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_ok() {
        let server = MockServer::start().await;
        Mock::given(rpc("getHealth"))
            .respond_with(rpc_result(json!("ok")))
            .mount(&server)
            .await;

        assert_ok!(client(&server).health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_rpc_error() {
        let server = MockServer::start().await;
        Mock::given(rpc("getHealth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32005, "message": "Node is behind by 42 slots" }
            })))
            .mount(&server)
            .await;

        let err = client(&server).health_check().await.unwrap_err();
        match err {
            AppError::Blockchain(BlockchainError::RpcError(msg)) => {
                assert!(msg.contains("-32005"));
                assert!(msg.contains("behind"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_parsed_accounts_decoded() {
        let server = MockServer::start().await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "jsonParsed"))
            .respond_with(rpc_result(with_context(json!([parsed_account(
                DEFAULT_MAINNET_MINT,
                1250.5
            )]))))
            .mount(&server)
            .await;

        let mint = DEFAULT_MAINNET_MINT.parse().unwrap();
        let accounts = client(&server)
            .get_parsed_token_accounts_by_mint(owner().pubkey(), &mint)
            .await
            .unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].pubkey, TOKEN_ACCOUNT);
        assert_eq!(accounts[0].mint, DEFAULT_MAINNET_MINT);
        assert_eq!(accounts[0].token_amount.ui_value(), 1250.5);
    }

    #[tokio::test]
    async fn test_base64_accounts_expose_mint() {
        let server = MockServer::start().await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "base64"))
            .respond_with(rpc_result(with_context(json!([base64_account(
                DEFAULT_MAINNET_MINT
            )]))))
            .mount(&server)
            .await;

        let accounts = client(&server)
            .get_token_accounts_by_program(owner().pubkey(), &spl_token::id())
            .await
            .unwrap();

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].data.len(), 165);
        assert_eq!(
            accounts[0].mint().unwrap().to_string(),
            DEFAULT_MAINNET_MINT
        );
    }

    #[tokio::test]
    async fn test_latest_blockhash() {
        let server = MockServer::start().await;
        Mock::given(rpc("getLatestBlockhash"))
            .respond_with(rpc_result(with_context(json!({
                "blockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N",
                "lastValidBlockHeight": 3090
            }))))
            .mount(&server)
            .await;

        let hash = client(&server).get_latest_blockhash().await.unwrap();
        assert_eq!(hash, "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N");
    }

    #[tokio::test]
    async fn test_http_500_is_transient() {
        let server = MockServer::start().await;
        Mock::given(rpc("getTokenAccountBalance"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_token_account_balance(TOKEN_ACCOUNT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Blockchain(BlockchainError::RpcError(_))
        ));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(rpc("getTokenAccountBalance"))
            .respond_with(rpc_result(json!({ "unexpected": true })))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_token_account_balance(TOKEN_ACCOUNT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Blockchain(BlockchainError::MalformedResponse(_))
        ));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_slow_node_times_out() {
        let server = MockServer::start().await;
        Mock::given(rpc("getHealth"))
            .respond_with(rpc_result(json!("ok")).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let config = RpcClientConfig {
            timeout: Duration::from_millis(100),
            ..Default::default()
        };
        let client = RpcLedgerClient::new(&server.uri(), config).unwrap();

        let err = client.health_check().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Blockchain(BlockchainError::Timeout(_))
        ));
    }
}

// ============================================================================
// ENDPOINT SELECTION
// ============================================================================

mod endpoint_selection_tests {
    use super::*;

    async fn healthy_node() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(rpc("getHealth"))
            .respond_with(rpc_result(json!("ok")))
            .mount(&server)
            .await;
        Mock::given(rpc("getLatestBlockhash"))
            .respond_with(rpc_result(with_context(json!({
                "blockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N",
                "lastValidBlockHeight": 3090
            }))))
            .mount(&server)
            .await;
        server
    }

    async fn broken_node() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(rpc("getHealth"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_first_healthy_candidate_wins() {
        let broken = broken_node().await;
        let healthy = healthy_node().await;
        let also_healthy = healthy_node().await;

        let selector = EndpointSelector::new(
            vec![broken.uri(), healthy.uri(), also_healthy.uri()],
            RpcClientConfig::default(),
        );

        assert_eq!(selector.select().await, healthy.uri());
    }

    #[tokio::test]
    async fn test_blockhash_failure_rejects_candidate() {
        let half_up = MockServer::start().await;
        Mock::given(rpc("getHealth"))
            .respond_with(rpc_result(json!("ok")))
            .mount(&half_up)
            .await;
        let healthy = healthy_node().await;

        let selector = EndpointSelector::new(
            vec![half_up.uri(), healthy.uri()],
            RpcClientConfig::default(),
        );

        assert_err!(selector.check_endpoint(&half_up.uri()).await);
        assert_eq!(selector.select().await, healthy.uri());
    }

    #[tokio::test]
    async fn test_falls_back_to_devnet() {
        let broken = broken_node().await;
        let selector = EndpointSelector::new(vec![broken.uri()], RpcClientConfig::default());

        let endpoint = selector.select().await;
        assert_eq!(endpoint, DEVNET_FALLBACK_ENDPOINT);
        assert_eq!(Network::detect(&endpoint), Network::Devnet);
    }
}

// ============================================================================
// BALANCE RESOLUTION OVER HTTP
// ============================================================================

mod resolution_tests {
    use super::*;

    fn resolver(server: &MockServer) -> BalanceResolver {
        BalanceResolver::new(Arc::new(client(server)), ResolverConfig::default())
    }

    #[tokio::test]
    async fn test_parsed_lookup_resolves_balance() {
        let server = MockServer::start().await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "jsonParsed"))
            .respond_with(rpc_result(with_context(json!([parsed_account(
                DEFAULT_MAINNET_MINT,
                500.0
            )]))))
            .expect(1)
            .mount(&server)
            .await;

        let network = Network::detect(&server.uri());
        assert_eq!(network, Network::Mainnet);

        let balance = resolver(&server)
            .resolve(&owner(), network, &TokenRegistry::default())
            .await;
        assert_eq!(balance, 500.0);
    }

    #[tokio::test]
    async fn test_owner_scan_fallback_over_http() {
        let server = MockServer::start().await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "jsonParsed"))
            .respond_with(rpc_result(with_context(json!([]))))
            .mount(&server)
            .await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "base64"))
            .respond_with(rpc_result(with_context(json!([base64_account(
                DEFAULT_MAINNET_MINT
            )]))))
            .mount(&server)
            .await;
        Mock::given(rpc("getTokenAccountBalance"))
            .respond_with(rpc_result(with_context(json!({
                "amount": "777000000",
                "decimals": 6,
                "uiAmount": 777.0,
                "uiAmountString": "777"
            }))))
            .expect(1)
            .mount(&server)
            .await;

        let balance = resolver(&server)
            .resolve(&owner(), Network::Mainnet, &TokenRegistry::default())
            .await;
        assert_eq!(balance, 777.0);
    }

    #[tokio::test]
    async fn test_empty_wallet_resolves_zero_without_retry() {
        let server = MockServer::start().await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "jsonParsed"))
            .respond_with(rpc_result(with_context(json!([]))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "base64"))
            .respond_with(rpc_result(with_context(json!([]))))
            .expect(2)
            .mount(&server)
            .await;

        let balance = resolver(&server)
            .resolve(&owner(), Network::Mainnet, &TokenRegistry::default())
            .await;
        assert_eq!(balance, 0.0);
    }

    #[tokio::test]
    async fn test_uninitialized_account_bytes_are_not_a_match() {
        // mint-shaped prefix, but the account state byte is zero
        let mut data = vec![0u8; 165];
        data[..32].copy_from_slice(&bs58::decode(DEFAULT_MAINNET_MINT).into_vec().unwrap());
        let forged = json!({
            "pubkey": TOKEN_ACCOUNT,
            "account": { "data": [BASE64.encode(&data), "base64"], "lamports": 0 }
        });

        let server = MockServer::start().await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "jsonParsed"))
            .respond_with(rpc_result(with_context(json!([]))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(rpc_with_encoding("getTokenAccountsByOwner", "base64"))
            .respond_with(rpc_result(with_context(json!([forged]))))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(rpc("getTokenAccountBalance"))
            .respond_with(rpc_result(with_context(json!({ "amount": "1", "decimals": 0 }))))
            .expect(0)
            .mount(&server)
            .await;

        let balance = resolver(&server)
            .resolve(&owner(), Network::Mainnet, &TokenRegistry::default())
            .await;
        assert_eq!(balance, 0.0);
    }
}
