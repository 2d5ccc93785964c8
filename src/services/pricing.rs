use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::MissingProductPolicy,
    entities::{buy_now_selection, cart_item, product, CartItem, Product},
    errors::ServiceError,
};

/// Customization data carried from a cart/buy-now line onto the order line.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LineCustomization {
    pub customization_text: Option<String>,
    pub image_path: Option<String>,
    pub contact_number: Option<String>,
    pub use_default: bool,
}

/// One priced line of a pending checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub customization: LineCustomization,
}

/// A fully priced checkout: authoritative unit prices and the derived total.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub total: Decimal,
}

impl Quote {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn from_lines(lines: Vec<PricedLine>) -> Self {
        let total = lines.iter().map(|l| l.subtotal).sum();
        Self { lines, total }
    }
}

/// Resolves current catalog prices for a checkout source.
///
/// Prices always come from the products table at the moment of the request;
/// client-supplied amounts are never trusted. Methods take the connection so
/// checkout can re-resolve inside its transaction.
#[derive(Clone)]
pub struct PricingService {
    policy: MissingProductPolicy,
}

impl PricingService {
    pub fn new(policy: MissingProductPolicy) -> Self {
        Self { policy }
    }

    /// Price a single buy-now selection.
    pub async fn quote_selection<C: ConnectionTrait>(
        &self,
        conn: &C,
        selection: &buy_now_selection::Model,
    ) -> Result<Quote, ServiceError> {
        let product = Product::find_by_id(selection.product_id).one(conn).await?;

        let lines = match product {
            Some(product) => vec![price_line(
                &product,
                selection.quantity,
                LineCustomization {
                    customization_text: selection.customization_text.clone(),
                    image_path: selection.image_path.clone(),
                    contact_number: selection.contact_number.clone(),
                    use_default: selection.use_default,
                },
            )],
            None => {
                self.handle_missing(selection.product_id)?;
                Vec::new()
            }
        };

        Ok(Quote::from_lines(lines))
    }

    /// Price all of a user's cart rows.
    pub async fn quote_cart<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<Quote, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .find_also_related(Product)
            .all(conn)
            .await?;

        let mut lines = Vec::with_capacity(rows.len());
        for (item, product) in rows {
            match product {
                Some(product) => lines.push(price_line(
                    &product,
                    item.quantity,
                    LineCustomization {
                        customization_text: item.customization_text,
                        image_path: item.image_path,
                        contact_number: item.contact_number,
                        use_default: item.use_default,
                    },
                )),
                None => self.handle_missing(item.product_id)?,
            }
        }

        Ok(Quote::from_lines(lines))
    }

    fn handle_missing(&self, product_id: Uuid) -> Result<(), ServiceError> {
        match self.policy {
            MissingProductPolicy::Fail => Err(ServiceError::InvalidOperation(format!(
                "product {} is no longer available",
                product_id
            ))),
            MissingProductPolicy::Skip => {
                warn!(
                    "Product {} vanished before checkout; line dropped",
                    product_id
                );
                Ok(())
            }
        }
    }
}

fn price_line(
    product: &product::Model,
    quantity: i32,
    customization: LineCustomization,
) -> PricedLine {
    let subtotal = product.price * Decimal::from(quantity);
    PricedLine {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity,
        unit_price: product.price,
        subtotal,
        customization,
    }
}
