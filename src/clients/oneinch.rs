//! Swap Aggregator API Client
//!
//! HTTP client for a 1inch-style EVM swap aggregator. Quotes and transaction
//! builds are plain GET requests parameterized by chain id; the returned
//! transaction descriptor is passed through verbatim - this service never
//! signs or broadcasts it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::config::{OneInchProviderConfig, PollerConfig};
use crate::error::GatewayError;

use super::transport_error;

// ============================================================================
// RESPONSE STRUCTURES
// ============================================================================

/// Quote response from the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneInchQuote {
    /// Expected destination amount in atomic units
    #[serde(rename = "dstAmount")]
    pub dst_amount: String,
    /// Aggregator-defined fields we do not interpret (tokens, protocols, gas)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Unsigned transaction descriptor returned by the aggregator's swap build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapTransaction {
    /// Router contract address
    pub to: String,
    /// Calldata for the swap
    pub data: String,
    /// Native value to attach, in wei
    pub value: String,
    /// Gas limit estimate
    pub gas: u64,
    /// Aggregator-defined fields we do not interpret (gasPrice etc.)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full swap-build response; the descriptor is nested under `tx`.
#[derive(Debug, Clone, Deserialize)]
struct SwapBuildResponse {
    tx: SwapTransaction,
}

/// Error body shape the aggregator uses for 4xx replies.
#[derive(Debug, Clone, Deserialize)]
struct OneInchErrorBody {
    description: Option<String>,
}

// ============================================================================
// CLIENT
// ============================================================================

/// HTTP client for the swap aggregator.
#[derive(Clone)]
pub struct OneInchClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OneInchClient {
    /// Creates a new client from provider and timing configuration.
    pub fn new(
        provider: &OneInchProviderConfig,
        poller: &PollerConfig,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(poller.request_timeout_ms))
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()?;

        Ok(Self {
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            api_key: provider.api_key.clone(),
            client,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Requests a swap quote.
    ///
    /// # Arguments
    ///
    /// * `chain_id` - EVM chain id the swap executes on
    /// * `from_token` - Source token address (payer side)
    /// * `to_token` - Destination token address (merchant side)
    /// * `amount` - Source amount in atomic units
    pub async fn quote(
        &self,
        chain_id: u64,
        from_token: &str,
        to_token: &str,
        amount: &str,
    ) -> Result<OneInchQuote, GatewayError> {
        let operation = "get quote from aggregator";
        let url = format!("{}/{}/quote", self.base_url, chain_id);

        let response = self
            .authorized(self.client.get(&url))
            .query(&[
                ("src", from_token),
                ("dst", to_token),
                ("amount", amount),
                ("includeTokensInfo", "true"),
                ("includeProtocols", "true"),
                ("includeGas", "true"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let response = self.ensure_success(operation, response).await?;
        response
            .json::<OneInchQuote>()
            .await
            .map_err(|e| transport_error(operation, e))
    }

    /// Builds an unsigned swap transaction descriptor.
    ///
    /// # Arguments
    ///
    /// * `amount` - Source amount in atomic units; must be the amount the
    ///   quote was issued for
    /// * `from_address` - The payer address that will sign the transaction
    /// * `slippage` - Slippage tolerance in percent (e.g. 1.0 for 1%)
    pub async fn build_swap_tx(
        &self,
        chain_id: u64,
        from_token: &str,
        to_token: &str,
        amount: &str,
        from_address: &str,
        slippage: f64,
    ) -> Result<SwapTransaction, GatewayError> {
        let operation = "build swap tx from aggregator";
        let url = format!("{}/{}/swap", self.base_url, chain_id);
        let slippage = slippage.to_string();

        let response = self
            .authorized(self.client.get(&url))
            .query(&[
                ("src", from_token),
                ("dst", to_token),
                ("amount", amount),
                ("from", from_address),
                ("slippage", slippage.as_str()),
                ("disableEstimate", "false"),
                ("allowPartialFill", "false"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let response = self.ensure_success(operation, response).await?;
        response
            .json::<SwapBuildResponse>()
            .await
            .map(|build| build.tx)
            .map_err(|e| transport_error(operation, e))
    }

    /// Normalizes non-2xx aggregator replies, surfacing the provider's
    /// `description` field in the message when present.
    async fn ensure_success(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let description = serde_json::from_str::<OneInchErrorBody>(&body)
            .ok()
            .and_then(|b| b.description);
        error!(
            "Failed to {}: upstream returned {} with body {}",
            operation, status, body
        );
        let message = match description {
            Some(description) => format!("failed to {}: {}", operation, description),
            None => format!("failed to {}: upstream returned {}", operation, status),
        };
        Err(GatewayError::Transport {
            message,
            status: Some(status.as_u16()),
            body: Some(body),
        })
    }
}
