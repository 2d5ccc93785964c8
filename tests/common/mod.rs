#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use uuid::Uuid;

use storefront_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    entities::{address, product, user},
    events::EventSender,
    handlers::AppServices,
    migrator::Migrator,
    AppState,
};

/// Shared test harness: in-memory sqlite with the full schema applied and the
/// services wired the same way main() wires them.
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        // A single connection keeps every session on the same in-memory db
        let mut opt = ConnectOptions::new(config.database_url.clone());
        opt.max_connections(1).sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .expect("failed to open in-memory database");
        Migrator::up(&db, None).await.expect("migrations failed");

        let db = Arc::new(db);
        let config = Arc::new(config);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(storefront_api::events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(AuthConfig::new(
            config.jwt_secret.clone(),
            Duration::from_secs(3600),
        )));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            auth.clone(),
            config.clone(),
        );

        let state = AppState {
            db,
            config,
            event_sender,
            services,
            auth,
        };

        TestApp { state }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }
}

pub fn test_config() -> AppConfig {
    let raw = r#"
        database_url = "sqlite::memory:"
        jwt_secret = "test_secret_that_is_long_enough_for_validation"
        payment_key_id = "key_test"
        payment_key_secret = "gateway_secret"
        admin_email = "admin@example.com"
        admin_password = "admin_password"
    "#;

    config::Config::builder()
        .add_source(config::File::from_str(raw, config::FileFormat::Toml))
        .build()
        .expect("test config build failed")
        .try_deserialize()
        .expect("test config deserialize failed")
}

/// Insert a user row directly
pub async fn seed_user(app: &TestApp, name: &str, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set("unused".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(app.db())
    .await
    .expect("failed to seed user");
    id
}

/// Insert a product row directly
pub async fn seed_product(app: &TestApp, name: &str, price: Decimal) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        description: Set(format!("{} description", name)),
        price: Set(price),
        image_path: Set(None),
        category: Set("gifts".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(app.db())
    .await
    .expect("failed to seed product");
    id
}

/// Insert an address row directly
pub async fn seed_address(app: &TestApp, user_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    address::ActiveModel {
        id: Set(id),
        user_id: Set(user_id),
        address_type: Set("home".to_string()),
        full_name: Set("Test Recipient".to_string()),
        line1: Set("12 Lakeview Road".to_string()),
        line2: Set(None),
        city: Set("Pune".to_string()),
        state: Set("MH".to_string()),
        postal_code: Set("411001".to_string()),
        country: Set("IN".to_string()),
        is_default: Set(false),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(app.db())
    .await
    .expect("failed to seed address");
    id
}

/// Compute a valid gateway callback signature the way the gateway would
pub fn gateway_signature(secret: &str, gateway_order_id: &str, payment_id: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}|{}", gateway_order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
