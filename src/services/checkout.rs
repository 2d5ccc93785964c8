use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    entities::{
        address, buy_now_selection, cart_item, order, order_item, Address, BuyNowSelection,
        BuyNowSelectionModel, CartItem, FulfillmentStatus, Order, OrderModel, Product,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        payments::{self, PaymentGateway},
        pricing::{PricingService, Quote},
    },
};

/// Which source a checkout consumes. Exactly one is consumed per checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutSource {
    BuyNow,
    Cart,
}

/// Input for stashing a buy-now selection.
#[derive(Debug, Clone, Deserialize)]
pub struct BuyNowInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub customization_text: Option<String>,
    pub image_path: Option<String>,
    pub contact_number: Option<String>,
    pub use_default: bool,
}

/// Checkout page payload: the priced lines and where they came from.
#[derive(Debug, Serialize)]
pub struct CheckoutPreview {
    pub source: CheckoutSource,
    #[serde(flatten)]
    pub quote: Quote,
}

/// Client-facing payment session: everything the payment widget needs.
#[derive(Debug, Serialize)]
pub struct PaymentSession {
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub key_id: String,
}

/// Callback fields posted back after the shopper completes payment.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    pub address_id: Uuid,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
}

/// Drives the order placement workflow: buy-now stashing, payment session
/// creation, signature verification and the atomic order write.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
    pricing: PricingService,
    gateway: Arc<PaymentGateway>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
        pricing: PricingService,
        gateway: Arc<PaymentGateway>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
            pricing,
            gateway,
        }
    }

    /// Stashes a single-item selection for the buy-now path. A new click
    /// replaces any previous selection; the row expires on its own.
    #[instrument(skip(self, input))]
    pub async fn stash_buy_now(
        &self,
        user_id: Uuid,
        input: BuyNowInput,
    ) -> Result<BuyNowSelectionModel, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let txn = self.db.begin().await?;

        BuyNowSelection::delete_many()
            .filter(buy_now_selection::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let now = Utc::now();
        let selection = buy_now_selection::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(input.product_id),
            quantity: Set(input.quantity),
            customization_text: Set(input.customization_text),
            image_path: Set(input.image_path),
            contact_number: Set(input.contact_number),
            use_default: Set(input.use_default),
            expires_at: Set(now + Duration::seconds(self.config.buy_now_ttl_secs)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            "Stashed buy-now selection for user {}: product {} x{}",
            user_id, selection.product_id, selection.quantity
        );
        Ok(selection)
    }

    /// Drops the user's buy-now selection, if any.
    pub async fn clear_buy_now(&self, user_id: Uuid) -> Result<(), ServiceError> {
        BuyNowSelection::delete_many()
            .filter(buy_now_selection::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// Returns the user's live selection; an expired row is deleted and
    /// reported as absent.
    async fn active_selection<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<BuyNowSelectionModel>, ServiceError> {
        let selection = BuyNowSelection::find()
            .filter(buy_now_selection::Column::UserId.eq(user_id))
            .one(conn)
            .await?;

        match selection {
            Some(s) if s.is_expired(Utc::now()) => {
                BuyNowSelection::delete_by_id(s.id).exec(conn).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Prices the pending checkout from its source. A live buy-now selection
    /// takes precedence over the cart.
    async fn resolve_quote<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<(CheckoutSource, Quote), ServiceError> {
        if let Some(selection) = self.active_selection(conn, user_id).await? {
            let quote = self.pricing.quote_selection(conn, &selection).await?;
            return Ok((CheckoutSource::BuyNow, quote));
        }

        let quote = self.pricing.quote_cart(conn, user_id).await?;
        Ok((CheckoutSource::Cart, quote))
    }

    /// Checkout page data: priced lines for whichever source is pending.
    #[instrument(skip(self))]
    pub async fn preview(&self, user_id: Uuid) -> Result<CheckoutPreview, ServiceError> {
        let (source, quote) = self.resolve_quote(&*self.db, user_id).await?;
        if quote.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "nothing to check out".to_string(),
            ));
        }
        Ok(CheckoutPreview { source, quote })
    }

    /// Registers a payment intent with the gateway for the pending checkout
    /// and hands the client what it needs to open the payment widget. Nothing
    /// is persisted locally; an abandoned gateway order expires upstream.
    #[instrument(skip(self))]
    pub async fn create_payment_session(
        &self,
        user_id: Uuid,
    ) -> Result<PaymentSession, ServiceError> {
        let (_, quote) = self.resolve_quote(&*self.db, user_id).await?;
        if quote.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "nothing to check out".to_string(),
            ));
        }

        let receipt = payments::new_receipt_token();
        let gateway_order = self
            .gateway
            .create_gateway_order(quote.total, &receipt)
            .await?;

        Ok(PaymentSession {
            gateway_order_id: gateway_order.id,
            amount_minor: gateway_order.amount,
            currency: gateway_order.currency,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Verifies the gateway callback and persists the order.
    ///
    /// The signature check is a hard gate; after it passes, the order row,
    /// its items and the consumption of the checkout source are committed in
    /// one transaction, so no partial order can remain and the cart cannot be
    /// double-spent alongside the buy-now selection.
    #[instrument(skip(self, input), fields(user_id = %user_id, gateway_order_id = %input.gateway_order_id))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        input: PlaceOrderInput,
    ) -> Result<OrderModel, ServiceError> {
        if !payments::verify_payment_signature(
            &self.config.payment_key_secret,
            &input.gateway_order_id,
            &input.gateway_payment_id,
            &input.gateway_signature,
        ) {
            warn!(
                "Signature verification failed for gateway order {}",
                input.gateway_order_id
            );
            self.event_sender
                .send_or_log(Event::PaymentRejected {
                    gateway_order_id: input.gateway_order_id.clone(),
                })
                .await;
            return Err(ServiceError::PaymentFailed(
                "payment verification failed".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        Address::find_by_id(input.address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", input.address_id))
            })?;

        // One committed order per gateway payment; the unique index backs
        // this check up under concurrency
        let duplicate = Order::find()
            .filter(order::Column::PaymentReference.eq(input.gateway_payment_id.clone()))
            .one(&txn)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "payment {} is already associated with an order",
                input.gateway_payment_id
            )));
        }

        let (source, quote) = self.resolve_quote(&txn, user_id).await?;
        if quote.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "nothing to check out".to_string(),
            ));
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let placed = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            address_id: Set(input.address_id),
            total_amount: Set(quote.total),
            payment_reference: Set(input.gateway_payment_id.clone()),
            payment_status: Set("paid".to_string()),
            fulfillment_status: Set(FulfillmentStatus::Pending),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for line in &quote.lines {
            order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                subtotal: Set(line.subtotal),
                customization_text: Set(line.customization.customization_text.clone()),
                image_path: Set(line.customization.image_path.clone()),
                contact_number: Set(line.customization.contact_number.clone()),
                use_default: Set(line.customization.use_default),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        // Consume exactly one source inside the same transaction
        match source {
            CheckoutSource::BuyNow => {
                BuyNowSelection::delete_many()
                    .filter(buy_now_selection::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;
            }
            CheckoutSource::Cart => {
                CartItem::delete_many()
                    .filter(cart_item::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentVerified {
                payment_reference: input.gateway_payment_id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::OrderCreated {
                order_id,
                user_id,
                total_amount: placed.total_amount,
            })
            .await;

        info!(
            "Order {} placed for user {} from {:?} (total {})",
            order_id, user_id, source, placed.total_amount
        );
        Ok(placed)
    }
}
