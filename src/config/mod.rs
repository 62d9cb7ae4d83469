//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the gateway
//! service. Configuration includes settlement provider endpoints and
//! credentials, reconciliation timing settings, API settings, and the
//! merchants seeded at startup.

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
///
/// This structure holds configuration for:
/// - Settlement provider connections (Intents Provider, 1inch-style aggregator)
/// - Status reconciliation timing settings
/// - API server configuration
/// - Merchants seeded into the store at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration (host, port, CORS settings)
    pub api: ApiConfig,
    /// Settlement provider configuration
    pub providers: ProvidersConfig,
    /// Status reconciliation loop configuration
    pub poller: PollerConfig,
    /// Merchants seeded into the store at startup
    #[serde(default)]
    pub merchants: Vec<MerchantConfig>,
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
    /// Allowed CORS origins for cross-origin requests
    pub cors_origins: Vec<String>,
}

/// Settlement provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Cross-chain intents network configuration
    pub intents: IntentsProviderConfig,
    /// EVM on-chain swap aggregator configuration
    pub oneinch: OneInchProviderConfig,
}

/// Configuration for the Intents Provider (cross-chain intents network).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentsProviderConfig {
    /// Base URL of the provider API
    pub base_url: String,
    /// Bearer token for authenticated requests.
    /// Overridable via the INTENTS_API_TOKEN environment variable.
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Configuration for the swap aggregator provider (1inch-style API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneInchProviderConfig {
    /// Base URL of the aggregator API (version-prefixed, e.g. ".../swap/v6.0")
    pub base_url: String,
    /// API key sent as a bearer token.
    /// Overridable via the ONEINCH_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Whether a non-terminal intent may be re-quoted on the aggregator path.
    /// When false the strict CREATED-only precondition of the intents path
    /// applies to aggregator quotes as well.
    #[serde(default = "default_allow_requote")]
    pub allow_requote: bool,
}

fn default_allow_requote() -> bool {
    true
}

/// Status reconciliation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Polling interval for status reconciliation in milliseconds
    pub poll_interval_ms: u64,
    /// Timeout for provider HTTP requests in milliseconds
    pub request_timeout_ms: u64,
}

/// A merchant record seeded into the store at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    /// Stable merchant identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Asset symbol the merchant is paid out in (e.g. "USDC")
    pub payout_asset: String,
    /// Chain identifier the merchant is paid out on (e.g. "ETHEREUM")
    pub payout_chain: String,
    /// Receiving address on the payout chain
    pub payout_address: String,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - Provider base URLs parse as absolute URLs
    /// - Timing values are non-zero
    /// - Seeded merchants have unique ids and non-empty payout addresses
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - A setting is inconsistent
    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.providers.intents.base_url).map_err(|e| {
            anyhow::anyhow!(
                "Configuration error: invalid intents provider base_url '{}': {}",
                self.providers.intents.base_url,
                e
            )
        })?;
        url::Url::parse(&self.providers.oneinch.base_url).map_err(|e| {
            anyhow::anyhow!(
                "Configuration error: invalid aggregator base_url '{}': {}",
                self.providers.oneinch.base_url,
                e
            )
        })?;

        if self.poller.poll_interval_ms == 0 {
            anyhow::bail!("Configuration error: poll_interval_ms must be greater than zero");
        }
        if self.poller.request_timeout_ms == 0 {
            anyhow::bail!("Configuration error: request_timeout_ms must be greater than zero");
        }

        let mut seen_ids = std::collections::HashSet::new();
        for merchant in &self.merchants {
            if !seen_ids.insert(merchant.id.as_str()) {
                anyhow::bail!(
                    "Configuration error: duplicate merchant id '{}'. Each merchant must have a unique id.",
                    merchant.id
                );
            }
            if merchant.payout_address.trim().is_empty() {
                anyhow::bail!(
                    "Configuration error: merchant '{}' has an empty payout_address",
                    merchant.id
                );
            }
        }

        Ok(())
    }

    /// Loads configuration from the TOML file.
    ///
    /// This function:
    /// 1. Checks if config/gateway.toml exists (or GATEWAY_CONFIG_PATH)
    /// 2. If it exists, loads and parses the configuration
    /// 3. Applies environment overrides for provider credentials
    /// 4. Validates the configuration
    /// 5. If it doesn't exist, returns an error asking user to copy template
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - Failed to load configuration, file doesn't exist, or validation failed
    pub fn load() -> anyhow::Result<Self> {
        // Check for custom config path via environment variable (for tests)
        let config_path = std::env::var("GATEWAY_CONFIG_PATH")
            .unwrap_or_else(|_| "config/gateway.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/gateway.template.toml config/gateway.toml\n\
                Then edit config/gateway.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Applies environment-variable overrides for provider credentials.
    ///
    /// Secrets are usually injected through the environment rather than
    /// committed in the TOML file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("INTENTS_API_TOKEN") {
            if !token.is_empty() {
                self.providers.intents.api_token = Some(token);
            }
        }
        if let Ok(key) = std::env::var("ONEINCH_API_KEY") {
            if !key.is_empty() {
                self.providers.oneinch.api_key = Some(key);
            }
        }
    }

    /// Creates a default configuration with placeholder values.
    ///
    /// This configuration is suitable for local development and testing.
    /// For production use, the provider URLs and credentials must be
    /// replaced with actual values.
    #[allow(dead_code)]
    pub fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            providers: ProvidersConfig {
                intents: IntentsProviderConfig {
                    base_url: "https://1click.chaindefuser.com".to_string(),
                    api_token: None,
                },
                oneinch: OneInchProviderConfig {
                    base_url: "https://api.1inch.dev/swap/v6.0".to_string(),
                    api_key: None,
                    allow_requote: true,
                },
            },
            poller: PollerConfig {
                poll_interval_ms: 15000,
                request_timeout_ms: 30000,
            },
            merchants: Vec::new(),
        }
    }
}
