use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{AuthService, Role},
    config::AppConfig,
    entities::{user, User, UserModel},
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A signed-in principal and its bearer token.
#[derive(Debug)]
pub struct AuthenticatedSession {
    pub user: Option<UserModel>,
    pub token: String,
}

/// Account registration and login for customers, plus the bootstrap admin
/// login against configured credentials.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    config: Arc<AppConfig>,
    event_sender: Arc<EventSender>,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        auth: Arc<AuthService>,
        config: Arc<AppConfig>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db,
            auth,
            config,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(
        &self,
        input: RegisterInput,
    ) -> Result<AuthenticatedSession, ServiceError> {
        if input.password.len() < 8 {
            return Err(ServiceError::ValidationError(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let existing = User::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "an account with this email already exists".to_string(),
            ));
        }

        let password_hash = AuthService::hash_password(&input.password)?;
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        info!("Registered user {}", created.id);

        let token = self.auth.issue_token(
            created.id,
            Some(created.name.clone()),
            Some(created.email.clone()),
            Role::Customer,
        )?;

        Ok(AuthenticatedSession {
            user: Some(created),
            token,
        })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, ServiceError> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        if !AuthService::verify_password(password, &user.password_hash)? {
            warn!("Failed login attempt for {}", email);
            return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
        }

        let token = self.auth.issue_token(
            user.id,
            Some(user.name.clone()),
            Some(user.email.clone()),
            Role::Customer,
        )?;

        Ok(AuthenticatedSession {
            user: Some(user),
            token,
        })
    }

    /// Back-office login against the configured bootstrap credentials.
    #[instrument(skip(self, password))]
    pub async fn admin_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, ServiceError> {
        if email != self.config.admin_email || password != self.config.admin_password {
            warn!("Failed admin login attempt");
            return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
        }

        let token = self.auth.issue_token(
            Uuid::nil(),
            Some("Administrator".to_string()),
            Some(self.config.admin_email.clone()),
            Role::Admin,
        )?;

        Ok(AuthenticatedSession { user: None, token })
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserModel, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }
}
