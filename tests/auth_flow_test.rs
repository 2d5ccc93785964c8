mod common;

use common::TestApp;
use storefront_api::{errors::ServiceError, services::users::RegisterInput};

#[tokio::test]
async fn register_then_login() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;

    let session = users
        .register(RegisterInput {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "correct horse battery".to_string(),
        })
        .await
        .expect("register failed");

    let registered = session.user.expect("registered user expected");
    assert_eq!(registered.email, "asha@example.com");

    // The token identifies the new account
    let principal = app.state.auth.verify_token(&session.token).unwrap();
    assert_eq!(principal.user_id, registered.id);
    assert!(!principal.is_admin());

    let login = users
        .login("asha@example.com", "correct horse battery")
        .await
        .expect("login failed");
    assert_eq!(login.user.unwrap().id, registered.id);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;

    let input = || RegisterInput {
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        password: "correct horse battery".to_string(),
    };

    users.register(input()).await.unwrap();
    let second = users.register(input()).await;
    assert!(matches!(second, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;

    users
        .register(RegisterInput {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "correct horse battery".to_string(),
        })
        .await
        .unwrap();

    let result = users.login("asha@example.com", "wrong password").await;
    assert!(matches!(result, Err(ServiceError::Unauthorized(_))));

    let result = users.login("nobody@example.com", "whatever!").await;
    assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
}

#[tokio::test]
async fn admin_login_uses_configured_credentials() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;

    let session = users
        .admin_login("admin@example.com", "admin_password")
        .await
        .expect("admin login failed");
    let principal = app.state.auth.verify_token(&session.token).unwrap();
    assert!(principal.is_admin());

    let result = users.admin_login("admin@example.com", "guess").await;
    assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
}
