//! Intents Provider API Client
//!
//! HTTP client for the cross-chain intents network. The provider issues a
//! deposit address together with each quote; settlement progress is later
//! looked up by that deposit address.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{IntentsProviderConfig, PollerConfig};
use crate::error::GatewayError;

use super::{ensure_success, transport_error};

// ============================================================================
// REQUEST/RESPONSE STRUCTURES
// ============================================================================

/// Quote request sent to the intents network.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentsQuoteRequest {
    /// Whether this is a dry-run quote (no deposit address issued)
    pub dry: bool,
    /// Swap parameterization, e.g. "EXACT_OUTPUT"
    pub swap_type: String,
    /// Slippage tolerance in basis points
    pub slippage_tolerance: u32,
    /// Asset the payer remits
    pub origin_asset: String,
    /// Asset the merchant receives
    pub destination_asset: String,
    /// Amount in atomic units of the fixed side of the swap
    pub amount: String,
    /// Address the destination asset is delivered to
    pub destination_address: String,
}

/// Quote response from the intents network.
///
/// Known fields are typed; everything else the provider sends rides in the
/// opaque extension bag and round-trips into the stored raw quote untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentsQuote {
    /// One-time deposit address the payer must send funds to
    pub deposit_address: Option<String>,
    /// Quoted amount on the payer side
    pub amount: Option<String>,
    /// Exact payer-side deposit amount, when the provider distinguishes it
    pub deposit_amount: Option<String>,
    /// Origin token id echoed by the provider
    pub token: Option<String>,
    /// Estimated settlement time in seconds
    pub estimated_time: Option<u64>,
    /// Provider-defined fields we do not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Settlement status response, looked up by deposit address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentsStatusResponse {
    /// Deposit address the status refers to
    pub deposit_address: Option<String>,
    /// Remote status string, e.g. "PENDING_DEPOSIT", "PROCESSING", "SUCCESS"
    pub status: String,
    /// Settlement transaction hash, once known
    pub tx_hash: Option<String>,
    /// Provider-defined fields we do not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// HTTP client for the Intents Provider.
#[derive(Clone)]
pub struct IntentsClient {
    base_url: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl IntentsClient {
    /// Creates a new client from provider and timing configuration.
    pub fn new(
        provider: &IntentsProviderConfig,
        poller: &PollerConfig,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(poller.request_timeout_ms))
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()?;

        Ok(Self {
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            api_token: provider.api_token.clone(),
            client,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Requests a quote with a deposit address.
    ///
    /// # Arguments
    ///
    /// * `request` - Quote parameters; `dry` should be false so the provider
    ///   allocates a deposit address
    ///
    /// # Returns
    ///
    /// * `Ok(IntentsQuote)` - Decoded quote (deposit address not yet checked)
    /// * `Err(GatewayError::Transport)` - Network failure or non-2xx reply
    pub async fn quote_with_deposit(
        &self,
        request: &IntentsQuoteRequest,
    ) -> Result<IntentsQuote, GatewayError> {
        let operation = "get quote from intents provider";
        let url = format!("{}/v0/quote", self.base_url);

        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        ensure_success(operation, response)
            .await?
            .json::<IntentsQuote>()
            .await
            .map_err(|e| transport_error(operation, e))
    }

    /// Looks up settlement status by deposit address.
    pub async fn deposit_status(
        &self,
        deposit_address: &str,
    ) -> Result<IntentsStatusResponse, GatewayError> {
        let operation = "get status from intents provider";
        let url = format!("{}/v0/status", self.base_url);

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("depositAddress", deposit_address)])
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        ensure_success(operation, response)
            .await?
            .json::<IntentsStatusResponse>()
            .await
            .map_err(|e| transport_error(operation, e))
    }
}
