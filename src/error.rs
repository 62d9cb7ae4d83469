//! Error taxonomy for the payment gateway
//!
//! All errors that cross the orchestrator or API boundary are expressed as
//! [`GatewayError`] variants. Transport failures from provider clients are
//! normalized at the client boundary and never leak raw stack traces.

use thiserror::Error;

use crate::store::PaymentIntentStatus;

/// Errors surfaced by the payment gateway.
///
/// Validation and state errors map to 4xx responses at the API layer;
/// transport errors map to 502. The reconciliation loop never propagates
/// these to a caller - it only logs and continues.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Unknown intent or merchant id.
    #[error("{resource} with ID {id} not found")]
    NotFound {
        /// Kind of record that was looked up ("payment intent", "merchant")
        resource: &'static str,
        /// The id that missed
        id: String,
    },

    /// Operation is illegal for the intent's current status.
    #[error("payment intent is in {current} status; {allowed}")]
    InvalidState {
        /// Status the intent was in when the operation was attempted
        current: PaymentIntentStatus,
        /// Human-readable description of what would have been accepted
        allowed: &'static str,
    },

    /// The resolver table has no entry for the requested (asset, chain) pair.
    #[error("unsupported asset {asset} on chain {chain}; no provider token id is configured for this pair")]
    UnsupportedAsset {
        /// Asset symbol as supplied by the caller
        asset: String,
        /// Chain identifier as supplied by the caller
        chain: String,
    },

    /// Upstream returned a 2xx response that is missing required fields.
    #[error("invalid provider response: {0}")]
    ProviderResponse(String),

    /// A swap-build was requested before any aggregator quote was stored.
    #[error("no stored aggregator quote for payment intent {0}; request a quote first")]
    MissingQuote(String),

    /// A decimal amount string could not be converted to atomic units.
    #[error("invalid amount {amount:?}: {reason}")]
    InvalidAmount {
        /// The offending input
        amount: String,
        /// Why it was rejected
        reason: String,
    },

    /// A request body failed field-level validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Network or HTTP failure talking to an upstream provider.
    #[error("provider request failed: {message}")]
    Transport {
        /// Normalized description of the failure
        message: String,
        /// Upstream HTTP status, when one was received
        status: Option<u16>,
        /// Upstream response body, when one was received
        body: Option<String>,
    },
}

impl GatewayError {
    /// Shorthand for a payment-intent lookup miss.
    pub fn intent_not_found(id: impl Into<String>) -> Self {
        GatewayError::NotFound {
            resource: "payment intent",
            id: id.into(),
        }
    }

    /// Shorthand for a merchant lookup miss.
    pub fn merchant_not_found(id: impl Into<String>) -> Self {
        GatewayError::NotFound {
            resource: "merchant",
            id: id.into(),
        }
    }
}
