//! Payment Intent Store Module
//!
//! In-process store for merchants and payment intents. This models the
//! relational collaborator at its interface boundary: create, find and
//! update operations keyed by id, plus the conditional write used by the
//! reconciliation loop to avoid clobbering a status that changed between
//! read and write.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::GatewayError;

// ============================================================================
// RECORD TYPES
// ============================================================================

/// A merchant that receives payouts. Immutable after seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
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
    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Record update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a payment intent.
///
/// The status only moves forward through the state graph:
/// CREATED -> AWAITING_DEPOSIT -> SWAPPING -> COMPLETED, with FAILED
/// reachable from AWAITING_DEPOSIT or SWAPPING. COMPLETED and FAILED are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentIntentStatus {
    /// Initial state, no provider bound yet
    Created,
    /// A quote was issued; waiting for the payer to remit funds
    AwaitingDeposit,
    /// The provider reported the settlement is in flight
    Swapping,
    /// Terminal: the merchant payout settled
    Completed,
    /// Terminal: the settlement failed or the deposit was incomplete
    Failed,
}

impl PaymentIntentStatus {
    /// Whether no further provider calls are accepted for this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentIntentStatus::Completed | PaymentIntentStatus::Failed
        )
    }
}

impl fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentIntentStatus::Created => "CREATED",
            PaymentIntentStatus::AwaitingDeposit => "AWAITING_DEPOSIT",
            PaymentIntentStatus::Swapping => "SWAPPING",
            PaymentIntentStatus::Completed => "COMPLETED",
            PaymentIntentStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Settlement provider bound to an intent.
///
/// Set on the first successful quote request and immutable thereafter; an
/// intent cannot switch providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementProvider {
    /// Cross-chain intents network
    #[serde(rename = "intents")]
    Intents,
    /// EVM on-chain swap aggregator
    #[serde(rename = "1inch")]
    OneInch,
}

impl fmt::Display for SettlementProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementProvider::Intents => write!(f, "intents"),
            SettlementProvider::OneInch => write!(f, "1inch"),
        }
    }
}

/// Routing mode requested at intent creation.
///
/// The mode is recorded but does not affect routing yet; no provider price
/// comparison is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementMode {
    /// Route via whichever provider is cheapest (label only for now)
    Cheapest,
    /// Prefer the privacy-preserving deposit path
    Privacy,
    /// Caller picks the settlement path explicitly
    Manual,
}

/// The central payment intent record.
///
/// Exactly one of the provider-specific field groups is populated once
/// `provider` is set; the other group stays entirely null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Opaque intent id
    pub id: String,
    /// Merchant this intent pays out to
    pub merchant_id: String,
    /// Decimal amount string, in the payout asset (e.g. "100.00")
    pub amount: String,
    /// Fiat currency code the amount was priced in (e.g. "USD")
    pub currency: String,
    /// Payout asset symbol, copied from the creation request
    pub payout_asset: String,
    /// Payout chain identifier, copied from the creation request
    pub payout_chain: String,
    /// Routing mode requested at creation
    pub mode: SettlementMode,
    /// Lifecycle status
    pub status: PaymentIntentStatus,
    /// Settlement provider bound to this intent, once quoted
    pub provider: Option<SettlementProvider>,
    /// Metadata merged in by the reconciliation loop (e.g. settlement tx hash)
    pub provider_metadata: Option<serde_json::Value>,

    // Intents-provider field group
    /// Deposit address issued by the intents network
    pub intents_deposit_address: Option<String>,
    /// Origin asset id (payer side)
    pub intents_origin_asset_id: Option<String>,
    /// Destination asset id (merchant side)
    pub intents_destination_asset_id: Option<String>,
    /// Swap type the quote was requested with
    pub intents_swap_type: Option<String>,
    /// Raw quote payload as returned by the provider
    pub intents_raw_quote: Option<serde_json::Value>,
    /// Last known remote status string
    pub intents_status: Option<String>,

    // Swap-aggregator field group
    /// EVM chain id the swap executes on
    pub one_inch_chain_id: Option<u64>,
    /// Source token address (payer side)
    pub one_inch_from_token: Option<String>,
    /// Destination token address (merchant side)
    pub one_inch_to_token: Option<String>,
    /// Aggregator quote, augmented with the computed atomic input amount
    pub one_inch_quote: Option<serde_json::Value>,
    /// Transaction hash submitted by the payer
    pub one_inch_tx_hash: Option<String>,
    /// Remote settlement status for the aggregator path
    pub one_inch_status: Option<String>,

    /// Record creation timestamp
    pub created_at: DateTime<Utc>,
    /// Record update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new payment intent.
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub merchant_id: String,
    pub amount: String,
    pub currency: String,
    pub payout_asset: String,
    pub payout_chain: String,
    pub mode: SettlementMode,
}

// ============================================================================
// STORE IMPLEMENTATION
// ============================================================================

/// In-memory store for merchants and payment intents.
///
/// Cloning is cheap: clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct IntentStore {
    merchants: Arc<RwLock<HashMap<String, Merchant>>>,
    intents: Arc<RwLock<HashMap<String, PaymentIntent>>>,
}

impl IntentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a merchant record.
    pub async fn insert_merchant(&self, merchant: Merchant) {
        let mut merchants = self.merchants.write().await;
        merchants.insert(merchant.id.clone(), merchant);
    }

    /// Looks up a merchant by id.
    pub async fn find_merchant(&self, id: &str) -> Option<Merchant> {
        self.merchants.read().await.get(id).cloned()
    }

    /// Creates a new payment intent in CREATED status with no provider bound.
    ///
    /// The referenced merchant must exist - this is the foreign-key analogue
    /// of the relational collaborator.
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentIntent)` - The stored record
    /// * `Err(GatewayError::NotFound)` - The merchant id is unknown
    pub async fn create_intent(
        &self,
        new: NewPaymentIntent,
    ) -> Result<PaymentIntent, GatewayError> {
        if self.find_merchant(&new.merchant_id).await.is_none() {
            return Err(GatewayError::merchant_not_found(new.merchant_id));
        }

        let now = Utc::now();
        let intent = PaymentIntent {
            id: Uuid::new_v4().to_string(),
            merchant_id: new.merchant_id,
            amount: new.amount,
            currency: new.currency,
            payout_asset: new.payout_asset,
            payout_chain: new.payout_chain,
            mode: new.mode,
            status: PaymentIntentStatus::Created,
            provider: None,
            provider_metadata: None,
            intents_deposit_address: None,
            intents_origin_asset_id: None,
            intents_destination_asset_id: None,
            intents_swap_type: None,
            intents_raw_quote: None,
            intents_status: None,
            one_inch_chain_id: None,
            one_inch_from_token: None,
            one_inch_to_token: None,
            one_inch_quote: None,
            one_inch_tx_hash: None,
            one_inch_status: None,
            created_at: now,
            updated_at: now,
        };

        let mut intents = self.intents.write().await;
        intents.insert(intent.id.clone(), intent.clone());
        Ok(intent)
    }

    /// Looks up a payment intent by id.
    pub async fn find_intent(&self, id: &str) -> Option<PaymentIntent> {
        self.intents.read().await.get(id).cloned()
    }

    /// Looks up a payment intent together with its merchant record.
    pub async fn find_intent_with_merchant(
        &self,
        id: &str,
    ) -> Option<(PaymentIntent, Merchant)> {
        let intent = self.find_intent(id).await?;
        let merchant = self.find_merchant(&intent.merchant_id).await?;
        Some((intent, merchant))
    }

    /// Applies a mutation to a payment intent and bumps its update timestamp.
    ///
    /// # Returns
    ///
    /// * `Ok(PaymentIntent)` - The record after the mutation
    /// * `Err(GatewayError::NotFound)` - The intent id is unknown
    pub async fn update_intent<F>(
        &self,
        id: &str,
        mutate: F,
    ) -> Result<PaymentIntent, GatewayError>
    where
        F: FnOnce(&mut PaymentIntent),
    {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(id)
            .ok_or_else(|| GatewayError::intent_not_found(id))?;
        mutate(intent);
        intent.updated_at = Utc::now();
        Ok(intent.clone())
    }

    /// Applies a mutation only if the stored status still equals `expected`.
    ///
    /// This is the optimistic conditional write used by the reconciliation
    /// loop: if a concurrent confirm call moved the intent to a different
    /// (possibly terminal) status between the poll-time read and this write,
    /// the write is skipped instead of clobbering the newer status.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(PaymentIntent))` - Mutation applied, record returned
    /// * `Ok(None)` - Status changed concurrently, write skipped
    /// * `Err(GatewayError::NotFound)` - The intent id is unknown
    pub async fn update_intent_if_status<F>(
        &self,
        id: &str,
        expected: PaymentIntentStatus,
        mutate: F,
    ) -> Result<Option<PaymentIntent>, GatewayError>
    where
        F: FnOnce(&mut PaymentIntent),
    {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(id)
            .ok_or_else(|| GatewayError::intent_not_found(id))?;
        if intent.status != expected {
            return Ok(None);
        }
        mutate(intent);
        intent.updated_at = Utc::now();
        Ok(Some(intent.clone()))
    }

    /// Lists the intents the reconciliation loop must poll: bound to the
    /// intents provider, in AWAITING_DEPOSIT or SWAPPING, with a deposit
    /// address issued.
    ///
    /// The `Result` models the listing query of the relational collaborator;
    /// a failure here aborts the whole polling pass.
    pub async fn list_reconcilable(&self) -> Result<Vec<PaymentIntent>, GatewayError> {
        let intents = self.intents.read().await;
        let mut matching: Vec<PaymentIntent> = intents
            .values()
            .filter(|intent| {
                intent.provider == Some(SettlementProvider::Intents)
                    && matches!(
                        intent.status,
                        PaymentIntentStatus::AwaitingDeposit | PaymentIntentStatus::Swapping
                    )
                    && intent.intents_deposit_address.is_some()
            })
            .cloned()
            .collect();
        // Stable iteration order keeps logs and tests deterministic
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matching)
    }
}
