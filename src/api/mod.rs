//! REST API Server Module
//!
//! This module provides the REST API server for the payment gateway,
//! exposing payment intent creation, quoting, swap transaction building,
//! confirmation, and status endpoints.
//!
//! Success responses carry the projection bodies directly; failures are
//! funnelled through a single rejection handler that maps the error
//! taxonomy onto HTTP status codes, so provider stack traces never leak
//! to clients.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use warp::hyper::body::Bytes;
use warp::{
    http::{Method, StatusCode},
    Filter, Rejection, Reply,
};

use crate::config::Config;
use crate::error::GatewayError;
use crate::payments::{
    BuildSwapTxRequest, ConfirmTxRequest, ConfirmTxResponse, CreatePaymentIntentRequest,
    PaymentService, QuoteEvmRequest,
};

// ============================================================================
// SHARED RESPONSE STRUCTURES
// ============================================================================

/// Standardized error response structure.
///
/// Successful replies return their projection body directly; this envelope
/// is used for error replies and the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    pub data: Option<T>,
    /// Error message (if failed)
    pub error: Option<String>,
}

// ============================================================================
// API HANDLERS
// ============================================================================

/// Handler for payment intent creation.
pub async fn create_intent_handler(
    request: CreatePaymentIntentRequest,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    let intent = service
        .create(request)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::with_status(
        warp::reply::json(&intent),
        StatusCode::CREATED,
    ))
}

/// Handler for fetching an intent joined with its merchant.
pub async fn get_intent_handler(
    id: String,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    let found = service
        .find(&id)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::json(&found))
}

/// Handler for the read-only status projection.
pub async fn get_status_handler(
    id: String,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = service
        .get_status(&id)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::json(&status))
}

/// Handler for the intents-path quote (ZEC payer flow).
pub async fn quote_zec_handler(
    id: String,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    let projection = service
        .quote_zec(&id)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::with_status(
        warp::reply::json(&projection),
        StatusCode::CREATED,
    ))
}

/// Handler for the aggregator-path quote (EVM payer flow).
pub async fn quote_evm_handler(
    id: String,
    request: QuoteEvmRequest,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    let projection = service
        .quote_evm(&id, request)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::with_status(
        warp::reply::json(&projection),
        StatusCode::CREATED,
    ))
}

/// Handler for building the unsigned swap transaction descriptor.
pub async fn build_swap_tx_handler(
    id: String,
    request: BuildSwapTxRequest,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tx = service
        .build_swap_tx(&id, request)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::with_status(
        warp::reply::json(&tx),
        StatusCode::CREATED,
    ))
}

/// Handler for confirming a payer-submitted transaction hash.
pub async fn confirm_tx_handler(
    id: String,
    request: ConfirmTxRequest,
    service: PaymentService,
) -> Result<impl warp::Reply, warp::Rejection> {
    service
        .confirm_tx(&id, request)
        .await
        .map_err(|e| warp::reject::custom(ApiError(e)))?;
    Ok(warp::reply::with_status(
        warp::reply::json(&ConfirmTxResponse { success: true }),
        StatusCode::CREATED,
    ))
}

// ============================================================================
// WARP FILTER HELPERS
// ============================================================================

/// Creates a warp filter that injects the payment service into handlers.
pub fn with_service(
    service: PaymentService,
) -> impl Filter<Extract = (PaymentService,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || service.clone())
}

/// Deserializes a raw JSON body, logging it for debugging first.
fn parse_body<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    body: &Bytes,
) -> Result<T, warp::Rejection> {
    let body_str = String::from_utf8_lossy(body);
    debug!("{} - Received body: {}", endpoint, body_str);

    serde_json::from_slice::<T>(body).map_err(|e| {
        error!(
            "{} deserialization failed: {}. Body: {}",
            endpoint, e, body_str
        );
        warp::reject::custom(JsonDeserializeError(format!("Invalid JSON: {}", e)))
    })
}

// ============================================================================
// CUSTOM REJECTION TYPES
// ============================================================================

/// Custom rejection for JSON deserialization errors
#[derive(Debug)]
pub struct JsonDeserializeError(pub String);

impl warp::reject::Reject for JsonDeserializeError {}

/// Custom rejection carrying a gateway error
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl warp::reject::Reject for ApiError {}

/// Maps a gateway error to the HTTP status code it surfaces as.
fn error_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::Transport { .. } => StatusCode::BAD_GATEWAY,
        GatewayError::InvalidState { .. }
        | GatewayError::UnsupportedAsset { .. }
        | GatewayError::ProviderResponse(_)
        | GatewayError::MissingQuote(_)
        | GatewayError::InvalidAmount { .. }
        | GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

// ============================================================================
// CORS CONFIGURATION
// ============================================================================

/// Creates a CORS filter based on the configured allowed origins.
fn create_cors_filter(allowed_origins: &[String]) -> warp::cors::Builder {
    let methods = vec![Method::GET, Method::POST, Method::OPTIONS];

    if allowed_origins.contains(&"*".to_string()) {
        warp::cors()
            .allow_any_origin()
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(|s| s.as_str()).collect();
        warp::cors()
            .allow_origins(origins)
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    }
}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Global rejection handler for all API routes.
///
/// Converts rejections into standardized error responses with appropriate
/// HTTP status codes. Raw provider errors and stack traces never reach the
/// client.
pub async fn handle_rejection(rej: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if let Some(ApiError(err)) = rej.find::<ApiError>() {
        (error_status(err), err.to_string())
    } else if let Some(err) = rej.find::<JsonDeserializeError>() {
        (StatusCode::BAD_REQUEST, err.0.clone())
    } else if let Some(err) = rej.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", err))
    } else if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        }),
        status,
    ))
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// REST API server for the payment gateway.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    /// Payment intent orchestrator
    service: PaymentService,
}

impl ApiServer {
    /// Creates a new API server.
    pub fn new(config: Config, service: PaymentService) -> Self {
        Self {
            config: Arc::new(config),
            service,
        }
    }

    /// Starts the API server and begins handling HTTP requests.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server started successfully
    /// * `Err(anyhow::Error)` - Failed to start server
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );

        let routes = self.create_routes();

        let addr: std::net::SocketAddr =
            format!("{}:{}", self.config.api.host, self.config.api.port)
                .parse()
                .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let service = self.service.clone();

        // Health check endpoint - returns service status
        let health = warp::path("health").and(warp::get()).map(|| {
            warp::reply::json(&ApiResponse::<String> {
                success: true,
                data: Some("Payment Gateway Service is running".to_string()),
                error: None,
            })
        });

        // POST /payment-intents - Create a payment intent
        let create_service = service.clone();
        let create_intent = warp::path("payment-intents")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::bytes())
            .and_then(move |body: Bytes| {
                let service = create_service.clone();
                async move {
                    let request = parse_body::<CreatePaymentIntentRequest>(
                        "POST /payment-intents",
                        &body,
                    )?;
                    create_intent_handler(request, service).await
                }
            });

        // GET /payment-intents/:id - Fetch an intent with its merchant
        let get_intent = warp::path("payment-intents")
            .and(warp::path::param())
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(get_intent_handler);

        // GET /payment-intents/:id/status - Status projection
        let get_status = warp::path("payment-intents")
            .and(warp::path::param())
            .and(warp::path("status"))
            .and(warp::path::end())
            .and(warp::get())
            .and(with_service(service.clone()))
            .and_then(get_status_handler);

        // POST /payment-intents/:id/quote-zec - Intents-path quote
        let quote_zec = warp::path("payment-intents")
            .and(warp::path::param())
            .and(warp::path("quote-zec"))
            .and(warp::path::end())
            .and(warp::post())
            .and(with_service(service.clone()))
            .and_then(quote_zec_handler);

        // POST /payment-intents/:id/quote-evm - Aggregator-path quote
        let quote_evm_service = service.clone();
        let quote_evm = warp::path("payment-intents")
            .and(warp::path::param())
            .and(warp::path("quote-evm"))
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::bytes())
            .and_then(move |id: String, body: Bytes| {
                let service = quote_evm_service.clone();
                async move {
                    let request = parse_body::<QuoteEvmRequest>(
                        "POST /payment-intents/:id/quote-evm",
                        &body,
                    )?;
                    quote_evm_handler(id, request, service).await
                }
            });

        // POST /payment-intents/:id/evm-swap-tx - Build the unsigned swap tx
        let swap_tx_service = service.clone();
        let swap_tx = warp::path("payment-intents")
            .and(warp::path::param())
            .and(warp::path("evm-swap-tx"))
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::bytes())
            .and_then(move |id: String, body: Bytes| {
                let service = swap_tx_service.clone();
                async move {
                    let request = parse_body::<BuildSwapTxRequest>(
                        "POST /payment-intents/:id/evm-swap-tx",
                        &body,
                    )?;
                    build_swap_tx_handler(id, request, service).await
                }
            });

        // POST /payment-intents/:id/evm-tx-confirm - Record the payer's tx hash
        let confirm_service = service.clone();
        let confirm_tx = warp::path("payment-intents")
            .and(warp::path::param())
            .and(warp::path("evm-tx-confirm"))
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::bytes())
            .and_then(move |id: String, body: Bytes| {
                let service = confirm_service.clone();
                async move {
                    let request = parse_body::<ConfirmTxRequest>(
                        "POST /payment-intents/:id/evm-tx-confirm",
                        &body,
                    )?;
                    confirm_tx_handler(id, request, service).await
                }
            });

        // Combine all routes and apply rejection handler
        health
            .or(create_intent)
            .or(get_status)
            .or(quote_zec)
            .or(quote_evm)
            .or(swap_tx)
            .or(confirm_tx)
            .or(get_intent)
            .with(create_cors_filter(&self.config.api.cors_origins))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    #[allow(dead_code)] // Used by tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}
