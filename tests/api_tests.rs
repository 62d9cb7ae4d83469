//! Unit tests for the REST API surface
//!
//! These tests drive the warp routes directly, verifying status codes,
//! response bodies, and the error envelope, with providers doubled by mock
//! HTTP servers.

use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::test::request;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gateway::api::{ApiResponse, ApiServer};
use gateway::store::IntentStore;

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::{
    build_service, build_test_config, seeded_store, DUMMY_DEPOSIT_ADDRESS,
    DUMMY_EVM_MERCHANT_ID, DUMMY_MERCHANT_ID, DUMMY_NATIVE_TOKEN_ADDR, DUMMY_USER_ADDR,
};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Create a test API server backed by a seeded store and mock providers
async fn create_test_api_server(provider_uri: &str) -> (ApiServer, IntentStore) {
    let config = build_test_config(provider_uri, provider_uri);
    let store = seeded_store().await;
    let service = build_service(&store, &config);
    (ApiServer::new(config, service), store)
}

/// Valid creation request body for the symbol-keyed merchant
fn valid_create_request() -> Value {
    json!({
        "merchantId": DUMMY_MERCHANT_ID,
        "amount": "100.00",
        "currency": "USD",
        "payoutAsset": "USDC",
        "payoutChain": "ETHEREUM",
        "mode": "CHEAPEST"
    })
}

// ============================================================================
// HEALTH ENDPOINT TESTS
// ============================================================================

/// Test that health endpoint returns success
#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let response = request().method("GET").path("/health").reply(&routes).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse<String> = serde_json::from_slice(response.body()).unwrap();
    assert!(body.success);
}

// ============================================================================
// CREATION ENDPOINT TESTS
// ============================================================================

/// Test that intent creation returns 201 with the stored projection
#[tokio::test]
async fn test_create_payment_intent() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let response = request()
        .method("POST")
        .path("/payment-intents")
        .json(&valid_create_request())
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], "CREATED");
    assert_eq!(body["merchantId"], DUMMY_MERCHANT_ID);
    assert_eq!(body["amount"], "100.00");
    assert_eq!(body["mode"], "CHEAPEST");
    assert!(body["provider"].is_null());
    assert!(body["id"].is_string());
}

/// Test that an unknown routing mode is rejected with 400
#[tokio::test]
async fn test_create_invalid_mode() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let mut body = valid_create_request();
    body["mode"] = json!("FASTEST");

    let response = request()
        .method("POST")
        .path("/payment-intents")
        .json(&body)
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let envelope: ApiResponse<Value> = serde_json::from_slice(response.body()).unwrap();
    assert!(!envelope.success);
    assert!(envelope.error.is_some());
}

/// Test that malformed JSON is rejected with 400
#[tokio::test]
async fn test_create_invalid_json() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let response = request()
        .method("POST")
        .path("/payment-intents")
        .body("invalid{")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Test that an unknown merchant id surfaces as 404
#[tokio::test]
async fn test_create_unknown_merchant() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let mut body = valid_create_request();
    body["merchantId"] = json!("no-such-merchant");

    let response = request()
        .method("POST")
        .path("/payment-intents")
        .json(&body)
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// LOOKUP ENDPOINT TESTS
// ============================================================================

/// Test that an intent is returned joined with its merchant
#[tokio::test]
async fn test_get_payment_intent_with_merchant() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let created = request()
        .method("POST")
        .path("/payment-intents")
        .json(&valid_create_request())
        .reply(&routes)
        .await;
    let created_body: Value = serde_json::from_slice(created.body()).unwrap();
    let id = created_body["id"].as_str().unwrap();

    let response = request()
        .method("GET")
        .path(&format!("/payment-intents/{}", id))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["id"], *id);
    assert_eq!(body["merchant"]["id"], DUMMY_MERCHANT_ID);
    assert_eq!(body["merchant"]["payoutAsset"], "USDC");
}

/// Test that unknown intent ids return 404 with the error envelope
#[tokio::test]
async fn test_get_payment_intent_not_found() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    for endpoint in [
        "/payment-intents/no-such-id",
        "/payment-intents/no-such-id/status",
    ] {
        let response = request().method("GET").path(endpoint).reply(&routes).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", endpoint);
        let envelope: ApiResponse<Value> = serde_json::from_slice(response.body()).unwrap();
        assert!(!envelope.success);
    }
}

// ============================================================================
// INTENTS-PATH QUOTE ENDPOINT TESTS
// ============================================================================

/// Test that quoting twice returns 400 on the second call
/// Why: The intents path forbids re-quoting; the first quote wins
#[tokio::test]
async fn test_quote_zec_wrong_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "depositAddress": DUMMY_DEPOSIT_ADDRESS,
            "depositAmount": "0.5"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let created = request()
        .method("POST")
        .path("/payment-intents")
        .json(&valid_create_request())
        .reply(&routes)
        .await;
    let created_body: Value = serde_json::from_slice(created.body()).unwrap();
    let id = created_body["id"].as_str().unwrap();

    let first = request()
        .method("POST")
        .path(&format!("/payment-intents/{}/quote-zec", id))
        .reply(&routes)
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_body: Value = serde_json::from_slice(first.body()).unwrap();
    assert_eq!(first_body["depositAddress"], DUMMY_DEPOSIT_ADDRESS);
    assert_eq!(first_body["expectedAmountInZec"], "0.5");
    assert_eq!(first_body["status"], "AWAITING_DEPOSIT");

    let second = request()
        .method("POST")
        .path(&format!("/payment-intents/{}/quote-zec", id))
        .reply(&routes)
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let envelope: ApiResponse<Value> = serde_json::from_slice(second.body()).unwrap();
    assert!(envelope.error.unwrap().contains("AWAITING_DEPOSIT"));
}

// ============================================================================
// AGGREGATOR-PATH ENDPOINT TESTS
// ============================================================================

/// Test the full EVM flow over HTTP: quote, swap build, confirm, status
/// What is tested: The atomic input amount is bound at quote time and the
/// provider's tx descriptor passes through unchanged
#[tokio::test]
async fn test_evm_flow_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1/quote"))
        .and(query_param("amount", "10000000000000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dstAmount": "100000000"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/swap"))
        .and(query_param("amount", "10000000000000000"))
        .and(query_param("slippage", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx": {
                "to": "0x1111111254eeb25477b68fb85ed929f73a960582",
                "data": "0xcalldata",
                "value": "10000000000000000",
                "gas": 200000
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    // Create an intent for the token-address merchant
    let created = request()
        .method("POST")
        .path("/payment-intents")
        .json(&json!({
            "merchantId": DUMMY_EVM_MERCHANT_ID,
            "amount": "100.00",
            "currency": "USD",
            "payoutAsset": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "payoutChain": "ethereum",
            "mode": "CHEAPEST"
        }))
        .reply(&routes)
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body: Value = serde_json::from_slice(created.body()).unwrap();
    let id = created_body["id"].as_str().unwrap();

    // Quote: the computed atomic amount is injected into the stored quote
    let quoted = request()
        .method("POST")
        .path(&format!("/payment-intents/{}/quote-evm", id))
        .json(&json!({
            "chainId": 1,
            "fromTokenAddress": DUMMY_NATIVE_TOKEN_ADDR,
            "fromTokenDecimals": 18,
            "amountDecimal": "0.01"
        }))
        .reply(&routes)
        .await;
    assert_eq!(quoted.status(), StatusCode::CREATED);
    let quoted_body: Value = serde_json::from_slice(quoted.body()).unwrap();
    assert_eq!(quoted_body["expectedAmountOut"], "100000000");
    assert_eq!(quoted_body["quote"]["inputAmount"], "10000000000000000");

    // Swap build: the descriptor comes back verbatim
    let built = request()
        .method("POST")
        .path(&format!("/payment-intents/{}/evm-swap-tx", id))
        .json(&json!({
            "chainId": 1,
            "fromTokenAddress": DUMMY_NATIVE_TOKEN_ADDR,
            "userAddress": DUMMY_USER_ADDR,
            "slippageBps": 100
        }))
        .reply(&routes)
        .await;
    assert_eq!(built.status(), StatusCode::CREATED);
    let built_body: Value = serde_json::from_slice(built.body()).unwrap();
    assert_eq!(built_body["to"], "0x1111111254eeb25477b68fb85ed929f73a960582");
    assert_eq!(built_body["data"], "0xcalldata");
    assert_eq!(built_body["value"], "10000000000000000");
    assert_eq!(built_body["gas"], 200000);

    // Confirm: the caller-supplied hash completes the intent
    let confirmed = request()
        .method("POST")
        .path(&format!("/payment-intents/{}/evm-tx-confirm", id))
        .json(&json!({ "txHash": "0xtxhash" }))
        .reply(&routes)
        .await;
    assert_eq!(confirmed.status(), StatusCode::CREATED);
    let confirmed_body: Value = serde_json::from_slice(confirmed.body()).unwrap();
    assert_eq!(confirmed_body, json!({ "success": true }));

    // Status: COMPLETED with the hash stored verbatim
    let status = request()
        .method("GET")
        .path(&format!("/payment-intents/{}/status", id))
        .reply(&routes)
        .await;
    assert_eq!(status.status(), StatusCode::OK);
    let status_body: Value = serde_json::from_slice(status.body()).unwrap();
    assert_eq!(status_body["status"], "COMPLETED");
    assert_eq!(status_body["provider"], "1inch");
    assert_eq!(status_body["oneInchTxHash"], "0xtxhash");
    assert_eq!(status_body["oneInchStatus"], "SUCCESS");
}

/// Test that a swap build without a stored quote returns 400
#[tokio::test]
async fn test_evm_swap_tx_missing_quote() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let created = request()
        .method("POST")
        .path("/payment-intents")
        .json(&valid_create_request())
        .reply(&routes)
        .await;
    let created_body: Value = serde_json::from_slice(created.body()).unwrap();
    let id = created_body["id"].as_str().unwrap();

    let response = request()
        .method("POST")
        .path(&format!("/payment-intents/{}/evm-swap-tx", id))
        .json(&json!({
            "chainId": 1,
            "fromTokenAddress": DUMMY_NATIVE_TOKEN_ADDR,
            "userAddress": DUMMY_USER_ADDR,
            "slippageBps": 100
        }))
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let envelope: ApiResponse<Value> = serde_json::from_slice(response.body()).unwrap();
    assert!(envelope.error.unwrap().contains("quote"));
}

// ============================================================================
// ROUTING TESTS
// ============================================================================

/// Test that unknown endpoints return 404
#[tokio::test]
async fn test_unknown_endpoint() {
    let server = MockServer::start().await;
    let (api_server, _store) = create_test_api_server(&server.uri()).await;
    let routes = api_server.test_routes();

    let response = request()
        .method("GET")
        .path("/no-such-endpoint")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
