use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{
        order, order_item, Address, AddressModel, Order, OrderItem, OrderModel, Product, User,
    },
    errors::ServiceError,
};

const REMOVED_PRODUCT_NAME: &str = "(product removed)";

/// Order line joined with the product's current name.
#[derive(Debug, Serialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub product_name: String,
}

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<OrderLine>,
}

/// Admin order list row.
#[derive(Debug, Serialize)]
pub struct AdminOrderSummary {
    #[serde(flatten)]
    pub order: OrderModel,
    pub customer_name: String,
}

/// Admin order detail with the shipping address resolved.
#[derive(Debug, Serialize)]
pub struct AdminOrderDetail {
    #[serde(flatten)]
    pub order: OrderModel,
    pub customer_name: String,
    pub address: Option<AddressModel>,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceLine {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub customization_text: Option<String>,
}

/// Structured invoice document for a placed order.
#[derive(Debug, Serialize)]
pub struct Invoice {
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub payment_reference: String,
    pub fulfillment_status: crate::entities::FulfillmentStatus,
    pub lines: Vec<InvoiceLine>,
    pub total: Decimal,
}

/// Order history reads for customers and the back-office.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderLine>, ServiceError> {
        let rows = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| OrderLine {
                product_name: product
                    .map(|p| p.name)
                    .unwrap_or_else(|| REMOVED_PRODUCT_NAME.to_string()),
                item,
            })
            .collect())
    }

    /// Customer order history, newest first, items included.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderWithItems>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.load_items(order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }

    /// A single order, scoped to its owner.
    #[instrument(skip(self))]
    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> Result<OrderWithItems, ServiceError> {
        let order = Order::find_by_id(order_id)
            .filter(order::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = self.load_items(order.id).await?;
        Ok(OrderWithItems { order, items })
    }

    /// Assembles the invoice document for an order the user owns.
    #[instrument(skip(self))]
    pub async fn invoice(&self, user_id: Uuid, order_id: Uuid) -> Result<Invoice, ServiceError> {
        let with_items = self.get_for_user(user_id, order_id).await?;
        let user = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        let lines = with_items
            .items
            .into_iter()
            .map(|line| InvoiceLine {
                product_name: line.product_name,
                quantity: line.item.quantity,
                unit_price: line.item.unit_price,
                subtotal: line.item.subtotal,
                customization_text: if line.item.use_default {
                    None
                } else {
                    line.item.customization_text
                },
            })
            .collect();

        Ok(Invoice {
            order_id: with_items.order.id,
            created_at: with_items.order.created_at,
            customer_name: user.name,
            customer_email: user.email,
            payment_reference: with_items.order.payment_reference,
            fulfillment_status: with_items.order.fulfillment_status,
            lines,
            total: with_items.order.total_amount,
        })
    }

    /// Back-office order list with customer names, newest first.
    #[instrument(skip(self))]
    pub async fn admin_list(&self) -> Result<Vec<AdminOrderSummary>, ServiceError> {
        let rows = Order::find()
            .order_by_desc(order::Column::CreatedAt)
            .find_also_related(User)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, user)| AdminOrderSummary {
                customer_name: user.map(|u| u.name).unwrap_or_default(),
                order,
            })
            .collect())
    }

    /// Back-office order detail with shipping address and items.
    #[instrument(skip(self))]
    pub async fn admin_get(&self, order_id: Uuid) -> Result<AdminOrderDetail, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let customer_name = User::find_by_id(order.user_id)
            .one(&*self.db)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();

        let address = Address::find_by_id(order.address_id).one(&*self.db).await?;
        let items = self.load_items(order.id).await?;

        Ok(AdminOrderDetail {
            order,
            customer_name,
            address,
            items,
        })
    }
}
