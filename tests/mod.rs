//! Test module organization
//!
//! This module re-exports test helpers for use in test files.

mod helpers;

#[allow(unused_imports)]
pub use helpers::{
    bind_aggregator_quote, bind_intents_quote, build_service, build_test_config,
    create_test_intent, create_test_intent_evm, seeded_store, test_merchant,
    test_merchant_evm, DUMMY_DEPOSIT_ADDRESS, DUMMY_EVM_MERCHANT_ID, DUMMY_MERCHANT_ID,
    DUMMY_MERCHANT_PAYOUT_ADDR, DUMMY_NATIVE_TOKEN_ADDR, DUMMY_TX_HASH,
    DUMMY_USDC_TOKEN_ADDR, DUMMY_USER_ADDR,
};
