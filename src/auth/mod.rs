use async_trait::async_trait;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Token-bearing principal role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(ServiceError::AuthError(format!("unknown role: {}", other))),
        }
    }
}

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated principal extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            token_expiration,
        }
    }
}

/// Issues and verifies tokens, hashes and checks passwords.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issue a signed token for a principal
    pub fn issue_token(
        &self,
        user_id: Uuid,
        name: Option<String>,
        email: Option<String>,
        role: Role,
    ) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            name,
            email,
            role: role.as_str().to_string(),
            iat: now,
            exp: now + self.config.token_expiration.as_secs() as i64,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::AuthError(format!("failed to sign token: {}", e)))
    }

    /// Verify a token and extract the principal
    pub fn verify_token(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!("Token validation failed: {}", e);
            ServiceError::Unauthorized("invalid or expired token".to_string())
        })?;

        let claims = data.claims;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("malformed token subject".to_string()))?;
        let role = Role::from_str(&claims.role)
            .map_err(|_| ServiceError::Unauthorized("malformed token role".to_string()))?;

        Ok(AuthUser {
            user_id,
            name: claims.name,
            email: claims.email,
            role,
        })
    }

    /// Hash a password with argon2
    pub fn hash_password(password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }

    /// Verify a password against a stored argon2 hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ServiceError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Arc<AuthService>>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::InternalError("auth service not available".to_string())
            })?;

        let token = bearer_token(parts)?;
        auth.verify_token(token)
    }
}

/// Extractor that additionally requires the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "administrator access required".to_string(),
            ));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "test_secret_that_is_long_enough_for_validation".into(),
            Duration::from_secs(3600),
        ))
    }

    #[test]
    fn token_round_trip() {
        let auth = service();
        let user_id = Uuid::new_v4();

        let token = auth
            .issue_token(
                user_id,
                Some("Asha".into()),
                Some("asha@example.com".into()),
                Role::Customer,
            )
            .expect("issue failed");

        let user = auth.verify_token(&token).expect("verify failed");
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role, Role::Customer);
        assert!(!user.is_admin());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = service();
        let token = auth
            .issue_token(Uuid::new_v4(), None, None, Role::Admin)
            .expect("issue failed");

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert!(auth.verify_token(&tampered).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let auth = service();
        let other = AuthService::new(AuthConfig::new(
            "a_completely_different_secret_0123456789abcdef".into(),
            Duration::from_secs(3600),
        ));

        let token = other
            .issue_token(Uuid::new_v4(), None, None, Role::Customer)
            .expect("issue failed");
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = AuthService::hash_password("hunter2hunter2").expect("hash failed");
        assert!(AuthService::verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!AuthService::verify_password("wrong-password", &hash).unwrap());
    }
}
