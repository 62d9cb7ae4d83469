//! Unit tests for the token/asset resolver
//!
//! These tests verify the normalization rules: case variations and an
//! optional "-mainnet" chain suffix must all resolve to the same provider
//! token id.

use gateway::error::GatewayError;
use gateway::tokens::{resolve_intents_token, ZEC};

/// Test that case and suffix variations resolve identically
/// What is tested: Normalization idempotence across input spellings
/// Why: Callers supply chain identifiers in whatever casing their config
/// uses; all spellings must hit the same table entry
#[test]
fn test_resolver_normalization_idempotence() {
    let variants = [
        ("USDC", "ETHEREUM"),
        ("usdc", "ethereum"),
        ("Usdc", "Ethereum-Mainnet"),
        ("USDC", "ETHEREUM-MAINNET"),
        ("usdc", "ethereum-mainnet"),
    ];

    for (asset, chain) in variants {
        let info = resolve_intents_token(asset, chain)
            .unwrap_or_else(|_| panic!("expected {}/{} to resolve", asset, chain));
        assert_eq!(info.id, "usdc-ethereum-mainnet");
        assert_eq!(info.decimals, 6);
    }
}

/// Test that every configured USDC chain resolves to its own id
#[test]
fn test_resolver_usdc_chains() {
    let table = [
        ("ETHEREUM", "usdc-ethereum-mainnet"),
        ("POLYGON", "usdc-polygon-mainnet"),
        ("ARBITRUM", "usdc-arbitrum-mainnet"),
        ("OPTIMISM", "usdc-optimism-mainnet"),
        ("BASE", "usdc-base-mainnet"),
    ];

    for (chain, expected_id) in table {
        let info = resolve_intents_token("USDC", chain).unwrap();
        assert_eq!(info.id, expected_id);
        assert_eq!(info.decimals, 6);
    }
}

/// Test that ZEC resolves regardless of the chain identifier
/// Why: ZEC is the fixed origin asset; the provider id is chain-independent
#[test]
fn test_resolver_zec_any_chain() {
    for chain in ["ZCASH", "zcash-mainnet", "anything"] {
        let info = resolve_intents_token("zec", chain).unwrap();
        assert_eq!(info.id, ZEC.id);
        assert_eq!(info.decimals, 8);
    }
}

/// Test that unknown pairs fail with UnsupportedAsset
/// Why: A resolver miss must be a typed error the API maps to 400, carrying
/// the offending inputs
#[test]
fn test_resolver_unsupported_pair() {
    let err = resolve_intents_token("DOGE", "ETHEREUM").unwrap_err();
    match err {
        GatewayError::UnsupportedAsset { asset, chain } => {
            assert_eq!(asset, "DOGE");
            assert_eq!(chain, "ETHEREUM");
        }
        other => panic!("expected UnsupportedAsset, got {:?}", other),
    }

    // Known asset on an unconfigured chain is still a miss
    assert!(resolve_intents_token("USDC", "SOLANA").is_err());
}
