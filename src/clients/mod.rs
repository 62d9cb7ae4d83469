//! Settlement Provider Clients
//!
//! Stateless request/response wrappers around the remote settlement APIs.
//! No business logic lives here; the clients only shape requests, decode
//! known response fields (keeping everything else in an opaque extension
//! bag) and normalize transport failures into [`GatewayError::Transport`].

mod intents;
mod oneinch;

pub use intents::{IntentsClient, IntentsQuote, IntentsQuoteRequest, IntentsStatusResponse};
pub use oneinch::{OneInchClient, OneInchQuote, SwapTransaction};

use tracing::error;

use crate::error::GatewayError;

/// Checks an upstream response status and normalizes non-2xx replies.
///
/// The upstream status and body are logged and carried on the error; raw
/// reqwest errors never cross the client boundary.
pub(crate) async fn ensure_success(
    operation: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(
        "Failed to {}: upstream returned {} with body {}",
        operation, status, body
    );
    Err(GatewayError::Transport {
        message: format!("failed to {}: upstream returned {}", operation, status),
        status: Some(status.as_u16()),
        body: Some(body),
    })
}

/// Normalizes a reqwest send/decode failure.
pub(crate) fn transport_error(operation: &str, err: reqwest::Error) -> GatewayError {
    error!("Failed to {}: {}", operation, err);
    GatewayError::Transport {
        message: format!("failed to {}: {}", operation, err),
        status: err.status().map(|s| s.as_u16()),
        body: None,
    }
}
