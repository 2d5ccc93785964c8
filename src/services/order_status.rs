use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
    entities::{order, FulfillmentStatus, Order, OrderModel},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Server-side guard for administrative fulfillment transitions.
///
/// A status may never move backwards through the flow; `Cancelled` is the
/// one absorbing exception and is reachable from any non-terminal state.
#[derive(Clone)]
pub struct OrderStatusService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderStatusService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Validates if a status transition is allowed
    pub fn is_valid_transition(from: FulfillmentStatus, to: FulfillmentStatus) -> bool {
        if from == to {
            // no-op
            return true;
        }
        if from.is_terminal() {
            return false;
        }
        if to == FulfillmentStatus::Cancelled {
            return true;
        }
        to.rank() > from.rank()
    }

    /// Updates the fulfillment status of an order, rejecting out-of-order
    /// transitions instead of trusting the admin client.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = ?new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: FulfillmentStatus,
    ) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                error!("Order {} not found", order_id);
                ServiceError::NotFound(format!("Order {} not found", order_id))
            })?;

        let old_status = order.fulfillment_status;

        if !Self::is_valid_transition(old_status, new_status) {
            error!(
                "Invalid status transition from {:?} to {:?}",
                old_status, new_status
            );
            return Err(ServiceError::ValidationError(format!(
                "cannot transition from '{:?}' to '{:?}'",
                old_status, new_status
            )));
        }

        if old_status == new_status {
            txn.commit().await?;
            return Ok(order);
        }

        let mut active: order::ActiveModel = order.into();
        active.fulfillment_status = Set(new_status);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            "Order {} status updated from {:?} to {:?} at {}",
            order_id,
            old_status,
            new_status,
            Utc::now()
        );

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await;

        Ok(updated)
    }

    /// Gets the current fulfillment status of an order
    pub async fn get_status(&self, order_id: Uuid) -> Result<FulfillmentStatus, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        Ok(order.fulfillment_status)
    }
}
