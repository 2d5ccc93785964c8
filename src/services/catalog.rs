use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{category, product, Category, CategoryModel, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};

const RELATED_PRODUCTS_LIMIT: u64 = 3;

/// Admin input for creating or updating a product.
///
/// `new_category` takes precedence over `category` and is upserted into the
/// categories table, so a product form can introduce a category on the fly.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Option<String>,
    pub new_category: Option<String>,
    pub image_path: Option<String>,
}

/// Product detail page payload.
#[derive(Debug)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub related: Vec<ProductModel>,
}

/// Catalog reads for the storefront plus admin-side product management.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Storefront product listing, newest first.
    pub async fn list_products(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(Product::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Product page: the product and up to three others from its category.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        let product = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let related = Product::find()
            .filter(product::Column::Category.eq(product.category.clone()))
            .filter(product::Column::Id.ne(product.id))
            .limit(RELATED_PRODUCTS_LIMIT)
            .all(&*self.db)
            .await?;

        Ok(ProductDetail { product, related })
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Admin: add a product, upserting a brand-new category when supplied.
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductModel, ServiceError> {
        let category = self.resolve_category(&input).await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            image_path: Set(input.image_path),
            category: Set(category),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        let created = model.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;

        info!("Created product {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Admin: update a product in place. A missing `image_path` keeps the
    /// current image.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: ProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let existing = Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

        let category = self.resolve_category(&input).await?;

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active.price = Set(input.price);
        active.category = Set(category);
        if let Some(path) = input.image_path {
            active.image_path = Set(Some(path));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;

        Ok(updated)
    }

    /// Admin: remove a product from the catalog. Existing order lines keep
    /// their frozen copy of the price; live cart lines hit the missing-product
    /// policy at checkout.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Product {} not found", id)));
        }

        self.event_sender.send_or_log(Event::ProductDeleted(id)).await;
        Ok(())
    }

    async fn resolve_category(&self, input: &ProductInput) -> Result<String, ServiceError> {
        if let Some(name) = input
            .new_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let exists = Category::find()
                .filter(category::Column::Name.eq(name))
                .one(&*self.db)
                .await?;
            if exists.is_none() {
                category::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    created_at: Set(Utc::now()),
                }
                .insert(&*self.db)
                .await?;
            }
            return Ok(name.to_string());
        }

        input
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServiceError::ValidationError("category is required".to_string()))
    }
}
