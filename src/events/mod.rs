use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entities::FulfillmentStatus;

/// Events emitted by the services after state changes commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order events
    OrderCreated {
        order_id: Uuid,
        user_id: Uuid,
        total_amount: Decimal,
    },
    OrderStatusChanged {
        order_id: Uuid,
        old_status: FulfillmentStatus,
        new_status: FulfillmentStatus,
    },

    // Payment events
    PaymentVerified {
        payment_reference: String,
    },
    PaymentRejected {
        gateway_order_id: String,
    },

    // Cart events
    CartItemAdded {
        user_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Review events
    ReviewCreated {
        product_id: Uuid,
        review_id: Uuid,
    },

    // Account events
    UserRegistered(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// State changes have already committed by the time events fire, so a lost
    /// event must not fail the request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

/// Processes incoming events. Runs as a background task for the lifetime of
/// the server.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderCreated {
                order_id,
                user_id,
                total_amount,
            } => {
                info!(
                    "Order {} created for user {} (total {})",
                    order_id, user_id, total_amount
                );
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Order {} moved from {:?} to {:?}",
                    order_id, old_status, new_status
                );
            }
            Event::PaymentVerified { payment_reference } => {
                info!("Payment {} verified", payment_reference);
            }
            Event::PaymentRejected { gateway_order_id } => {
                warn!(
                    "Payment signature rejected for gateway order {}",
                    gateway_order_id
                );
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::CartCleared(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender
            .send(Event::ProductCreated(id))
            .await
            .expect("send failed");

        match rx.recv().await {
            Some(Event::ProductCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
