pub mod addresses;
pub mod auth;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;

use std::sync::Arc;

use crate::{
    auth::AuthService,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        AddressBookService, CartService, CatalogService, CheckoutService, OrderService,
        OrderStatusService, PaymentGateway, PricingService, ReviewService, UserService,
    },
};

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
    pub order_status: Arc<OrderStatusService>,
    pub addresses: Arc<AddressBookService>,
    pub reviews: Arc<ReviewService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
        config: Arc<AppConfig>,
    ) -> Self {
        let gateway = Arc::new(PaymentGateway::new(&config));
        let pricing = PricingService::new(config.missing_product_policy());

        let catalog = Arc::new(CatalogService::new(db.clone(), event_sender.clone()));
        let cart = Arc::new(CartService::new(db.clone(), event_sender.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            event_sender.clone(),
            config.clone(),
            pricing,
            gateway,
        ));
        let orders = Arc::new(OrderService::new(db.clone()));
        let order_status = Arc::new(OrderStatusService::new(db.clone(), event_sender.clone()));
        let addresses = Arc::new(AddressBookService::new(db.clone()));
        let reviews = Arc::new(ReviewService::new(db.clone(), event_sender.clone()));
        let users = Arc::new(UserService::new(db, auth, config, event_sender));

        Self {
            catalog,
            cart,
            checkout,
            orders,
            order_status,
            addresses,
            reviews,
            users,
        }
    }
}
