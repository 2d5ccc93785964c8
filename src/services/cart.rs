use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{cart_item, CartItem, CartItemModel, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Input for adding a product to the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub customization_text: Option<String>,
    pub image_path: Option<String>,
    pub contact_number: Option<String>,
    pub use_default: bool,
}

/// Quantity adjustment from the cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityAction {
    Increase,
    Decrease,
}

/// Cart line joined with its catalog product.
#[derive(Debug, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItemModel,
    pub product_name: String,
    pub unit_price: Decimal,
    pub product_image_path: Option<String>,
    pub line_total: Decimal,
}

/// The cart page payload: lines plus a catalog-priced running total.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Decimal,
}

/// Persistent per-user shopping cart.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds a line to the user's cart. Every add creates its own row so that
    /// two differently customized copies of one product stay separate.
    #[instrument(skip(self, input))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<CartItemModel, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = Product::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        // Default customization suppresses the custom fields, as on the
        // product page form
        let (customization_text, contact_number, image_path) = if input.use_default {
            (None, None, None)
        } else {
            (
                input.customization_text,
                input.contact_number,
                input.image_path,
            )
        };

        let now = Utc::now();
        let item = cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product.id),
            quantity: Set(input.quantity),
            customization_text: Set(customization_text),
            image_path: Set(image_path),
            contact_number: Set(contact_number),
            use_default: Set(input.use_default),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let item = item.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                product_id: product.id,
            })
            .await;

        info!(
            "Added product {} x{} to cart of user {}",
            product.id, item.quantity, user_id
        );
        Ok(item)
    }

    /// Loads the cart with product names, authoritative prices and the total.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        let mut total = Decimal::ZERO;
        for (item, product) in rows {
            // A vanished product renders as an unpriceable line; checkout
            // applies the configured policy to it
            let (name, price, image) = match product {
                Some(p) => (p.name, p.price, p.image_path),
                None => ("(no longer available)".to_string(), Decimal::ZERO, None),
            };
            let line_total = price * Decimal::from(item.quantity);
            total += line_total;
            items.push(CartLine {
                item,
                product_name: name,
                unit_price: price,
                product_image_path: image,
                line_total,
            });
        }

        Ok(CartView { items, total })
    }

    /// Steps a line's quantity up or down. Decreasing floors at 1; removal is
    /// an explicit separate action.
    #[instrument(skip(self))]
    pub async fn step_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        action: QuantityAction,
    ) -> Result<CartItemModel, ServiceError> {
        let item = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let new_quantity = match action {
            QuantityAction::Increase => item.quantity + 1,
            QuantityAction::Decrease if item.quantity > 1 => item.quantity - 1,
            QuantityAction::Decrease => item.quantity,
        };

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(new_quantity);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        Ok(updated)
    }

    /// Removes a single line from the user's cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::Id.eq(item_id))
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Cart item {} not found",
                item_id
            )));
        }
        Ok(())
    }

    /// Empties the user's cart.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.event_sender.send_or_log(Event::CartCleared(user_id)).await;
        Ok(())
    }
}
