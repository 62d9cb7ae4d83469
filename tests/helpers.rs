//! Shared test helpers for unit tests
//!
//! This module provides helper functions used by unit tests.
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy ids, addresses and hashes used across tests
//! - **Configuration Builders**: Functions to create test configurations
//!   pointed at mock provider servers
//! - **Store Builders**: Functions to create seeded stores and intents in
//!   specific lifecycle states

use chrono::Utc;

use gateway::clients::{IntentsClient, OneInchClient};
use gateway::config::{
    ApiConfig, Config, IntentsProviderConfig, OneInchProviderConfig, PollerConfig,
    ProvidersConfig,
};
use gateway::payments::PaymentService;
use gateway::store::{
    IntentStore, Merchant, NewPaymentIntent, PaymentIntent, PaymentIntentStatus,
    SettlementMode, SettlementProvider,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy merchant paid out in USDC on Ethereum (symbol-keyed payout asset,
/// used by the intents path)
#[allow(dead_code)]
pub const DUMMY_MERCHANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Dummy merchant paid out in USDC on Ethereum (token-address payout asset,
/// used by the aggregator path)
#[allow(dead_code)]
pub const DUMMY_EVM_MERCHANT_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Dummy merchant payout address (EVM format, 20 bytes)
#[allow(dead_code)]
pub const DUMMY_MERCHANT_PAYOUT_ADDR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

/// Dummy deposit address issued by the intents provider
#[allow(dead_code)]
pub const DUMMY_DEPOSIT_ADDRESS: &str = "intents-deposit-address-1";

/// USDC token address on Ethereum mainnet
#[allow(dead_code)]
pub const DUMMY_USDC_TOKEN_ADDR: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

/// Native-token sentinel address used by the aggregator
#[allow(dead_code)]
pub const DUMMY_NATIVE_TOKEN_ADDR: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// Dummy payer address (EVM format, 20 bytes)
#[allow(dead_code)]
pub const DUMMY_USER_ADDR: &str = "0x0000000000000000000000000000000000000009";

/// Dummy transaction hash (64 hex characters)
#[allow(dead_code)]
pub const DUMMY_TX_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000012";

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Builds a test configuration pointed at the given mock provider URLs.
#[allow(dead_code)]
pub fn build_test_config(intents_url: &str, oneinch_url: &str) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3999,
            cors_origins: vec![],
        },
        providers: ProvidersConfig {
            intents: IntentsProviderConfig {
                base_url: intents_url.to_string(),
                api_token: Some("test-token".to_string()),
            },
            oneinch: OneInchProviderConfig {
                base_url: oneinch_url.to_string(),
                api_key: Some("test-key".to_string()),
                allow_requote: true,
            },
        },
        poller: PollerConfig {
            poll_interval_ms: 1000,
            request_timeout_ms: 1000,
        },
        merchants: Vec::new(),
    }
}

/// Builds a payment service wired to the given store and mock providers.
#[allow(dead_code)]
pub fn build_service(store: &IntentStore, config: &Config) -> PaymentService {
    let intents = IntentsClient::new(&config.providers.intents, &config.poller)
        .expect("Failed to create intents client");
    let oneinch = OneInchClient::new(&config.providers.oneinch, &config.poller)
        .expect("Failed to create aggregator client");
    PaymentService::new(
        store.clone(),
        intents,
        oneinch,
        config.providers.oneinch.allow_requote,
    )
}

// ============================================================================
// STORE BUILDERS
// ============================================================================

/// Merchant paid out in the "USDC" symbol on ETHEREUM (intents path).
#[allow(dead_code)]
pub fn test_merchant() -> Merchant {
    let now = Utc::now();
    Merchant {
        id: DUMMY_MERCHANT_ID.to_string(),
        name: "Test Merchant".to_string(),
        payout_asset: "USDC".to_string(),
        payout_chain: "ETHEREUM".to_string(),
        payout_address: DUMMY_MERCHANT_PAYOUT_ADDR.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Merchant paid out to a token address on Ethereum (aggregator path).
#[allow(dead_code)]
pub fn test_merchant_evm() -> Merchant {
    let now = Utc::now();
    Merchant {
        id: DUMMY_EVM_MERCHANT_ID.to_string(),
        name: "Test Merchant (EVM)".to_string(),
        payout_asset: DUMMY_USDC_TOKEN_ADDR.to_string(),
        payout_chain: "ethereum".to_string(),
        payout_address: DUMMY_MERCHANT_PAYOUT_ADDR.to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// Creates a store seeded with both test merchants.
#[allow(dead_code)]
pub async fn seeded_store() -> IntentStore {
    let store = IntentStore::new();
    store.insert_merchant(test_merchant()).await;
    store.insert_merchant(test_merchant_evm()).await;
    store
}

/// Creates a payment intent for the symbol-keyed merchant.
#[allow(dead_code)]
pub async fn create_test_intent(store: &IntentStore, amount: &str) -> PaymentIntent {
    store
        .create_intent(NewPaymentIntent {
            merchant_id: DUMMY_MERCHANT_ID.to_string(),
            amount: amount.to_string(),
            currency: "USD".to_string(),
            payout_asset: "USDC".to_string(),
            payout_chain: "ETHEREUM".to_string(),
            mode: SettlementMode::Cheapest,
        })
        .await
        .expect("Failed to create test intent")
}

/// Creates a payment intent for the token-address merchant (aggregator path).
#[allow(dead_code)]
pub async fn create_test_intent_evm(store: &IntentStore, amount: &str) -> PaymentIntent {
    store
        .create_intent(NewPaymentIntent {
            merchant_id: DUMMY_EVM_MERCHANT_ID.to_string(),
            amount: amount.to_string(),
            currency: "USD".to_string(),
            payout_asset: DUMMY_USDC_TOKEN_ADDR.to_string(),
            payout_chain: "ethereum".to_string(),
            mode: SettlementMode::Cheapest,
        })
        .await
        .expect("Failed to create test intent")
}

/// Moves an intent into AWAITING_DEPOSIT on the intents path with the given
/// deposit address, the way a successful quote would.
#[allow(dead_code)]
pub async fn bind_intents_quote(
    store: &IntentStore,
    intent_id: &str,
    deposit_address: &str,
) -> PaymentIntent {
    store
        .update_intent(intent_id, |record| {
            record.provider = Some(SettlementProvider::Intents);
            record.intents_deposit_address = Some(deposit_address.to_string());
            record.intents_origin_asset_id = Some("zec-mainnet".to_string());
            record.intents_destination_asset_id = Some("usdc-ethereum-mainnet".to_string());
            record.intents_swap_type = Some("EXACT_OUTPUT".to_string());
            record.intents_status = Some("PENDING_DEPOSIT".to_string());
            record.status = PaymentIntentStatus::AwaitingDeposit;
        })
        .await
        .expect("Failed to bind intents quote")
}

/// Moves an intent into AWAITING_DEPOSIT on the aggregator path with a
/// stored augmented quote, the way a successful quote would.
#[allow(dead_code)]
pub async fn bind_aggregator_quote(
    store: &IntentStore,
    intent_id: &str,
    input_amount: &str,
    dst_amount: &str,
) -> PaymentIntent {
    let quote = serde_json::json!({
        "dstAmount": dst_amount,
        "inputAmount": input_amount,
    });
    store
        .update_intent(intent_id, |record| {
            record.provider = Some(SettlementProvider::OneInch);
            record.one_inch_chain_id = Some(1);
            record.one_inch_from_token = Some(DUMMY_NATIVE_TOKEN_ADDR.to_string());
            record.one_inch_to_token = Some(record.payout_asset.clone());
            record.one_inch_quote = Some(quote);
            record.status = PaymentIntentStatus::AwaitingDeposit;
        })
        .await
        .expect("Failed to bind aggregator quote")
}
