use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{address, Address, AddressModel},
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub address_type: String,
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Per-user address book.
#[derive(Clone)]
pub struct AddressBookService {
    db: Arc<DatabaseConnection>,
}

impl AddressBookService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<AddressModel>, ServiceError> {
        Ok(Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn add(
        &self,
        user_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        let model = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            address_type: Set(input.address_type),
            full_name: Set(input.full_name),
            line1: Set(input.line1),
            line2: Set(input.line2),
            city: Set(input.city),
            state: Set(input.state),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            is_default: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };

        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        let existing = Address::find_by_id(address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", address_id))
            })?;

        let mut active: address::ActiveModel = existing.into();
        active.address_type = Set(input.address_type);
        active.full_name = Set(input.full_name);
        active.line1 = Set(input.line1);
        active.line2 = Set(input.line2);
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.postal_code = Set(input.postal_code);
        active.country = Set(input.country);
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let result = Address::delete_many()
            .filter(address::Column::Id.eq(address_id))
            .filter(address::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Address {} not found",
                address_id
            )));
        }
        Ok(())
    }

    /// Marks one address as the default, clearing the previous default in the
    /// same transaction.
    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<AddressModel, ServiceError> {
        let txn = self.db.begin().await?;

        let target = Address::find_by_id(address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Address {} not found", address_id))
            })?;

        Address::update_many()
            .col_expr(address::Column::IsDefault, sea_orm::sea_query::Expr::value(false))
            .filter(address::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let mut active: address::ActiveModel = target.into();
        active.is_default = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }
}
