//! Payment Gateway Service
//!
//! A payment gateway that orchestrates cross-chain and cross-asset value
//! transfer: a payer sends one asset (e.g. ZEC or an EVM token) and a
//! merchant receives a different asset on a different chain, via pluggable
//! settlement providers.
//!
//! ## Overview
//!
//! The gateway:
//! 1. Records payment intents for seeded merchants
//! 2. Binds settlement quotes (intents network or EVM swap aggregator)
//! 3. Builds unsigned swap transaction descriptors for the EVM path
//! 4. Reconciles in-flight intents against the intents network in the
//!    background
//!
//! ## Security Model
//!
//! The gateway holds NO private keys and never signs or broadcasts
//! transactions. Signing and sending is the payer's responsibility.

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use gateway::api;
use gateway::clients::{IntentsClient, OneInchClient};
use gateway::config::Config;
use gateway::payments::PaymentService;
use gateway::poller::StatusPoller;
use gateway::store::{IntentStore, Merchant};

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

/// Main application entry point that initializes and runs the gateway.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Seeds merchants and wires the orchestrator
/// 4. Spawns the status reconciliation loop
/// 5. Runs the API server until shutdown
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging for debugging and monitoring
    tracing_subscriber::fmt::init();

    info!("Starting Payment Gateway Service");

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Check for help flag
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Payment Gateway Service");
        println!();
        println!("Usage: gateway [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --config <path>   Use custom config file path");
        println!("  --help, -h        Show this help message");
        println!();
        println!("Environment variables:");
        println!("  GATEWAY_CONFIG_PATH   Path to config file (overrides --config)");
        println!("  INTENTS_API_TOKEN     Bearer token for the intents provider");
        println!("  ONEINCH_API_KEY       API key for the swap aggregator");
        return Ok(());
    }

    // Check for custom config path
    let mut config_path = None;
    for (i, arg) in args.iter().enumerate() {
        if arg == "--config" && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            break;
        }
    }
    if let Some(path) = config_path {
        std::env::set_var("GATEWAY_CONFIG_PATH", &path);
        info!("Using custom config: {}", path);
    }

    // Load configuration from config file (or GATEWAY_CONFIG_PATH env var)
    let config = Config::load()?;
    info!("Configuration loaded successfully");

    // Seed merchants into the store
    let store = IntentStore::new();
    for merchant in &config.merchants {
        let now = Utc::now();
        store
            .insert_merchant(Merchant {
                id: merchant.id.clone(),
                name: merchant.name.clone(),
                payout_asset: merchant.payout_asset.clone(),
                payout_chain: merchant.payout_chain.clone(),
                payout_address: merchant.payout_address.clone(),
                created_at: now,
                updated_at: now,
            })
            .await;
    }
    info!("Seeded {} merchants", config.merchants.len());

    // Wire the provider clients and the orchestrator
    let intents_client = IntentsClient::new(&config.providers.intents, &config.poller)?;
    let oneinch_client = OneInchClient::new(&config.providers.oneinch, &config.poller)?;
    let service = PaymentService::new(
        store.clone(),
        intents_client.clone(),
        oneinch_client,
        config.providers.oneinch.allow_requote,
    );

    // Spawn the background status reconciliation loop
    info!("Starting background status reconciliation");
    let poller = StatusPoller::new(store, intents_client, config.poller.poll_interval_ms);
    let poller_handle = poller.spawn();

    // Run the API server (this blocks until shutdown)
    let api_server = api::ApiServer::new(config, service);
    api_server.run().await?;

    // Stop scheduling reconciliation ticks on shutdown
    poller_handle.stop().await;

    Ok(())
}
