//! Payment Intent Orchestrator
//!
//! The provider-agnostic state machine at the core of the gateway. It
//! validates state transitions, binds quotes to intents, converts decimal
//! amounts to atomic units, and records provider responses. All persistent
//! mutation of payment intents happens here or in the reconciliation loop.

pub mod amounts;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::clients::{IntentsClient, IntentsQuoteRequest, OneInchClient, SwapTransaction};
use crate::error::GatewayError;
use crate::store::{
    IntentStore, Merchant, NewPaymentIntent, PaymentIntent, PaymentIntentStatus,
    SettlementMode, SettlementProvider,
};
use crate::tokens;

/// Swap parameterization for the intents path: the merchant-side output is
/// fixed and the provider prices the payer-side input.
const EXACT_OUTPUT_SWAP: &str = "EXACT_OUTPUT";

/// Fixed slippage tolerance for intents quotes, in basis points.
const INTENTS_SLIPPAGE_TOLERANCE_BPS: u32 = 50;

/// Key under which the computed atomic input amount is injected into the
/// stored aggregator quote. The swap build later reads this exact value back;
/// it is never recomputed.
const INPUT_AMOUNT_KEY: &str = "inputAmount";

// ============================================================================
// REQUEST STRUCTURES
// ============================================================================

/// Payment intent creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    pub merchant_id: String,
    /// Decimal amount string in the payout asset, e.g. "100.00"
    pub amount: String,
    /// Fiat currency code, e.g. "USD"
    pub currency: String,
    pub payout_asset: String,
    pub payout_chain: String,
    pub mode: SettlementMode,
}

/// Aggregator quote request (EVM payer flow).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEvmRequest {
    /// EVM chain id the payer operates on; the payout token is assumed to
    /// live on this same chain
    pub chain_id: u64,
    /// Source token address the payer spends
    pub from_token_address: String,
    /// Decimal precision of the source token
    pub from_token_decimals: u32,
    /// Decimal amount of the source token to spend
    pub amount_decimal: String,
}

/// Swap transaction build request (aggregator path).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSwapTxRequest {
    pub chain_id: u64,
    pub from_token_address: String,
    /// Payer address that will sign the transaction
    pub user_address: String,
    /// Slippage tolerance in basis points (100 = 1%)
    pub slippage_bps: u32,
}

/// Transaction confirmation request (aggregator path).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTxRequest {
    /// Hash of the transaction the payer signed and broadcast
    pub tx_hash: String,
}

// ============================================================================
// PROJECTION STRUCTURES
// ============================================================================

/// Deposit projection returned by the intents quote path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZecDepositProjection {
    /// Address the payer must deposit ZEC to
    pub deposit_address: String,
    /// Expected payer-side amount, as quoted by the provider
    pub expected_amount_in_zec: String,
    pub payout_asset: String,
    pub payout_chain: String,
    pub payment_intent_id: String,
    pub status: PaymentIntentStatus,
}

/// Quote projection returned by the aggregator quote path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmQuoteProjection {
    /// The provider quote, augmented with the computed atomic input amount
    pub quote: Value,
    /// The provider's expected destination amount in atomic units
    pub expected_amount_out: String,
}

/// Read-only status projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusProjection {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub provider: Option<SettlementProvider>,
    pub payout_asset: String,
    pub payout_chain: String,
    pub amount: String,
    pub currency: String,
    pub one_inch_status: Option<String>,
    pub one_inch_tx_hash: Option<String>,
}

/// A payment intent joined with its merchant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentWithMerchant {
    #[serde(flatten)]
    pub intent: PaymentIntent,
    pub merchant: Merchant,
}

/// Confirmation acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmTxResponse {
    pub success: bool,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Payment intent orchestrator.
///
/// Owns a handle to the store and both settlement provider clients. Cloning
/// shares the underlying store.
#[derive(Clone)]
pub struct PaymentService {
    store: IntentStore,
    intents: IntentsClient,
    oneinch: OneInchClient,
    /// Whether non-terminal intents may be re-quoted on the aggregator path
    allow_requote: bool,
}

impl PaymentService {
    /// Creates a new orchestrator.
    pub fn new(
        store: IntentStore,
        intents: IntentsClient,
        oneinch: OneInchClient,
        allow_requote: bool,
    ) -> Self {
        Self {
            store,
            intents,
            oneinch,
            allow_requote,
        }
    }

    /// Creates a new payment intent in CREATED status. No provider call is
    /// made; provider selection happens at quote time.
    pub async fn create(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        for (field, value) in [
            ("merchantId", &request.merchant_id),
            ("amount", &request.amount),
            ("currency", &request.currency),
            ("payoutAsset", &request.payout_asset),
            ("payoutChain", &request.payout_chain),
        ] {
            if value.trim().is_empty() {
                return Err(GatewayError::Validation(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        let intent = self
            .store
            .create_intent(NewPaymentIntent {
                merchant_id: request.merchant_id,
                amount: request.amount,
                currency: request.currency,
                payout_asset: request.payout_asset,
                payout_chain: request.payout_chain,
                mode: request.mode,
            })
            .await?;

        info!("Created payment intent {} for merchant {}", intent.id, intent.merchant_id);
        Ok(intent)
    }

    /// Looks up a payment intent joined with its merchant.
    pub async fn find(&self, id: &str) -> Result<PaymentIntentWithMerchant, GatewayError> {
        let (intent, merchant) = self
            .store
            .find_intent_with_merchant(id)
            .await
            .ok_or_else(|| GatewayError::intent_not_found(id))?;
        Ok(PaymentIntentWithMerchant { intent, merchant })
    }

    /// Returns the read-only status projection for an intent.
    pub async fn get_status(&self, id: &str) -> Result<StatusProjection, GatewayError> {
        let intent = self
            .store
            .find_intent(id)
            .await
            .ok_or_else(|| GatewayError::intent_not_found(id))?;

        Ok(StatusProjection {
            id: intent.id,
            status: intent.status,
            provider: intent.provider,
            payout_asset: intent.payout_asset,
            payout_chain: intent.payout_chain,
            amount: intent.amount,
            currency: intent.currency,
            one_inch_status: intent.one_inch_status,
            one_inch_tx_hash: intent.one_inch_tx_hash,
        })
    }

    /// Requests a settlement quote on the intents path (ZEC payer flow).
    ///
    /// Only legal while the intent is in CREATED status; this prevents
    /// re-quoting and duplicate deposit-address issuance. The quote is an
    /// exact-output request: the merchant must receive exactly the intent's
    /// amount, so the payer-side input is left to the provider's pricing.
    ///
    /// # Returns
    ///
    /// * `Ok(ZecDepositProjection)` - Deposit address and expected payer amount
    /// * `Err(GatewayError::NotFound)` - Unknown intent id
    /// * `Err(GatewayError::InvalidState)` - Intent is not in CREATED status
    /// * `Err(GatewayError::UnsupportedAsset)` - Payout pair not in the resolver table
    /// * `Err(GatewayError::ProviderResponse)` - Quote came back without a deposit address
    pub async fn quote_zec(&self, id: &str) -> Result<ZecDepositProjection, GatewayError> {
        let (intent, merchant) = self
            .store
            .find_intent_with_merchant(id)
            .await
            .ok_or_else(|| GatewayError::intent_not_found(id))?;

        if intent.status != PaymentIntentStatus::Created {
            return Err(GatewayError::InvalidState {
                current: intent.status,
                allowed: "only CREATED intents can be quoted",
            });
        }

        let destination = tokens::resolve_intents_token(&intent.payout_asset, &intent.payout_chain)?;
        let atomic_amount = amounts::to_atomic_units(&intent.amount, destination.decimals)?;

        let request = IntentsQuoteRequest {
            dry: false,
            swap_type: EXACT_OUTPUT_SWAP.to_string(),
            slippage_tolerance: INTENTS_SLIPPAGE_TOLERANCE_BPS,
            origin_asset: tokens::ZEC.id.to_string(),
            destination_asset: destination.id.to_string(),
            amount: atomic_amount,
            destination_address: merchant.payout_address.clone(),
        };

        let quote = self.intents.quote_with_deposit(&request).await?;

        // A quote without a deposit address is useless; persist nothing.
        let deposit_address = quote
            .deposit_address
            .clone()
            .filter(|addr| !addr.is_empty())
            .ok_or_else(|| {
                GatewayError::ProviderResponse(
                    "deposit address missing from quote response".to_string(),
                )
            })?;

        let expected_amount = quote
            .deposit_amount
            .clone()
            .or_else(|| quote.amount.clone())
            .unwrap_or_else(|| intent.amount.clone());

        let raw_quote = serde_json::to_value(&quote).map_err(|e| {
            GatewayError::ProviderResponse(format!("quote not representable as JSON: {}", e))
        })?;

        let updated = self
            .store
            .update_intent(id, |record| {
                record.provider = Some(SettlementProvider::Intents);
                record.intents_deposit_address = Some(deposit_address.clone());
                record.intents_origin_asset_id = Some(request.origin_asset.clone());
                record.intents_destination_asset_id = Some(request.destination_asset.clone());
                record.intents_swap_type = Some(request.swap_type.clone());
                record.intents_raw_quote = Some(raw_quote);
                record.intents_status = Some("PENDING_DEPOSIT".to_string());
                record.status = PaymentIntentStatus::AwaitingDeposit;
            })
            .await?;

        info!(
            "Payment intent {} quoted on intents path, deposit address {}",
            updated.id, deposit_address
        );

        Ok(ZecDepositProjection {
            deposit_address,
            expected_amount_in_zec: expected_amount,
            payout_asset: updated.payout_asset,
            payout_chain: updated.payout_chain,
            payment_intent_id: updated.id,
            status: updated.status,
        })
    }

    /// Requests a settlement quote on the aggregator path (EVM payer flow).
    ///
    /// Terminal intents are always rejected. Re-quoting a non-terminal intent
    /// is allowed when the service was built with `allow_requote` (the
    /// default); otherwise the strict CREATED-only precondition applies. The
    /// computed atomic input amount is injected into the stored quote and is
    /// the exact value later sent to the swap build - it is never recomputed.
    pub async fn quote_evm(
        &self,
        id: &str,
        request: QuoteEvmRequest,
    ) -> Result<EvmQuoteProjection, GatewayError> {
        let intent = self
            .store
            .find_intent(id)
            .await
            .ok_or_else(|| GatewayError::intent_not_found(id))?;

        if intent.status.is_terminal() {
            return Err(GatewayError::InvalidState {
                current: intent.status,
                allowed: "terminal intents accept no further provider calls",
            });
        }
        if !self.allow_requote && intent.status != PaymentIntentStatus::Created {
            return Err(GatewayError::InvalidState {
                current: intent.status,
                allowed: "only CREATED intents can be quoted",
            });
        }
        // An intent never switches providers.
        if intent.provider == Some(SettlementProvider::Intents) {
            return Err(GatewayError::InvalidState {
                current: intent.status,
                allowed: "intent is already bound to the intents provider",
            });
        }

        let atomic_amount =
            amounts::to_atomic_units(&request.amount_decimal, request.from_token_decimals)?;

        let quote = self
            .oneinch
            .quote(
                request.chain_id,
                &request.from_token_address,
                &intent.payout_asset,
                &atomic_amount,
            )
            .await?;

        let expected_amount_out = quote.dst_amount.clone();

        // Bind the quote to the computed input amount under a stable key.
        let mut augmented = serde_json::to_value(&quote).map_err(|e| {
            GatewayError::ProviderResponse(format!("quote not representable as JSON: {}", e))
        })?;
        match augmented.as_object_mut() {
            Some(map) => {
                map.insert(INPUT_AMOUNT_KEY.to_string(), Value::String(atomic_amount));
            }
            None => {
                return Err(GatewayError::ProviderResponse(
                    "aggregator quote is not a JSON object".to_string(),
                ))
            }
        }

        let updated = self
            .store
            .update_intent(id, |record| {
                record.provider = Some(SettlementProvider::OneInch);
                record.one_inch_chain_id = Some(request.chain_id);
                record.one_inch_from_token = Some(request.from_token_address.clone());
                record.one_inch_to_token = Some(record.payout_asset.clone());
                record.one_inch_quote = Some(augmented.clone());
                record.status = PaymentIntentStatus::AwaitingDeposit;
            })
            .await?;

        info!(
            "Payment intent {} quoted on aggregator path, chain {}",
            updated.id, request.chain_id
        );

        Ok(EvmQuoteProjection {
            quote: augmented,
            expected_amount_out,
        })
    }

    /// Builds the unsigned swap transaction descriptor for a previously
    /// quoted aggregator intent.
    ///
    /// The amount sent to the provider is the atomic input amount stored at
    /// quote time, read back verbatim; recomputing it here could drift from
    /// the quoted value.
    pub async fn build_swap_tx(
        &self,
        id: &str,
        request: BuildSwapTxRequest,
    ) -> Result<SwapTransaction, GatewayError> {
        let intent = self
            .store
            .find_intent(id)
            .await
            .ok_or_else(|| GatewayError::intent_not_found(id))?;

        if intent.status.is_terminal() {
            return Err(GatewayError::InvalidState {
                current: intent.status,
                allowed: "terminal intents accept no further provider calls",
            });
        }

        let input_amount = intent
            .one_inch_quote
            .as_ref()
            .and_then(|quote| quote.get(INPUT_AMOUNT_KEY))
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .ok_or_else(|| GatewayError::MissingQuote(id.to_string()))?;

        // Basis points to percent
        let slippage = f64::from(request.slippage_bps) / 100.0;

        self.oneinch
            .build_swap_tx(
                request.chain_id,
                &request.from_token_address,
                &intent.payout_asset,
                &input_amount,
                &request.user_address,
                slippage,
            )
            .await
    }

    /// Records the payer-submitted transaction hash and marks the intent
    /// COMPLETED.
    ///
    /// No on-chain verification is performed; the caller-supplied hash is
    /// trusted and stored verbatim.
    pub async fn confirm_tx(
        &self,
        id: &str,
        request: ConfirmTxRequest,
    ) -> Result<PaymentIntent, GatewayError> {
        let intent = self
            .store
            .find_intent(id)
            .await
            .ok_or_else(|| GatewayError::intent_not_found(id))?;

        if intent.status.is_terminal() {
            return Err(GatewayError::InvalidState {
                current: intent.status,
                allowed: "terminal intents accept no further provider calls",
            });
        }

        let updated = self
            .store
            .update_intent(id, |record| {
                record.one_inch_tx_hash = Some(request.tx_hash.clone());
                record.one_inch_status = Some("SUCCESS".to_string());
                record.status = PaymentIntentStatus::Completed;
            })
            .await?;

        info!(
            "Payment intent {} confirmed with tx hash {}",
            updated.id,
            request.tx_hash
        );
        Ok(updated)
    }
}
