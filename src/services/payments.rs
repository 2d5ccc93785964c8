use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info, instrument};

use crate::{config::AppConfig, errors::ServiceError};

type HmacSha256 = Hmac<Sha256>;

/// Gateway-side order record returned by the create-order call.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
struct CreateGatewayOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Client for the external payment gateway.
///
/// Registers pending payment intents; nothing is persisted locally at this
/// stage. A crash after the call leaves an orphaned gateway order, which the
/// gateway expires on its own.
#[derive(Clone)]
pub struct PaymentGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
    currency: String,
}

impl PaymentGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.payment_api_base.trim_end_matches('/').to_string(),
            key_id: config.payment_key_id.clone(),
            key_secret: config.payment_key_secret.clone(),
            currency: config.currency.clone(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Register a pending payment intent with the gateway.
    #[instrument(skip(self))]
    pub async fn create_gateway_order(
        &self,
        amount: Decimal,
        receipt: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        let amount_minor = to_minor_units(amount)?;
        let body = CreateGatewayOrderRequest {
            amount: amount_minor,
            currency: &self.currency,
            receipt,
        };

        let response = self
            .http
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Payment gateway unreachable: {}", e);
                ServiceError::ExternalServiceError(format!("payment gateway unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!("Payment gateway returned {}: {}", status, detail);
            return Err(ServiceError::ExternalServiceError(format!(
                "payment gateway returned {}",
                status
            )));
        }

        let order: GatewayOrder = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("malformed gateway response: {}", e))
        })?;

        info!(
            "Gateway order {} registered for {} minor units",
            order.id, order.amount
        );
        Ok(order)
    }
}

/// Convert a decimal currency amount to the gateway's minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp(0)
        .to_i64()
        .ok_or_else(|| ServiceError::InternalError(format!("amount {} out of range", amount)))
}

/// Generate a receipt token for a new gateway order.
pub fn new_receipt_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("rcpt_{}", suffix)
}

/// Recompute the callback signature and compare it to the supplied one.
///
/// The gateway signs `{order_id}|{payment_id}` with the shared key secret;
/// the comparison is constant-time. Any mismatch must abort order
/// persistence.
pub fn verify_payment_signature(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
    supplied_signature: &str,
) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(gateway_order_id.as_bytes());
    mac.update(b"|");
    mac.update(gateway_payment_id.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    constant_time_eq(&expected, supplied_signature)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
