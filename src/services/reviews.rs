use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{review, Product, Review, ReviewModel, User},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    pub comment: Option<String>,
    pub image_path: Option<String>,
}

/// Review joined with the reviewer's display name.
#[derive(Debug, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: ReviewModel,
    pub reviewer_name: String,
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn add_review(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: ReviewInput,
    ) -> Result<ReviewModel, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::ValidationError(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let model = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            comment: Set(input.comment),
            image_path: Set(input.image_path),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewCreated {
                product_id,
                review_id: created.id,
            })
            .await;

        Ok(created)
    }

    pub async fn list_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ReviewView>, ServiceError> {
        let rows = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::CreatedAt)
            .find_also_related(User)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, user)| ReviewView {
                reviewer_name: user.map(|u| u.name).unwrap_or_default(),
                review,
            })
            .collect())
    }
}
