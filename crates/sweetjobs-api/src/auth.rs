//! Bearer token authentication.
//!
//! Tokens are HS256 JWTs carrying the user's email and role. Two extractors
//! gate the handlers:
//! - [`AdminUser`]: 401 without a valid token, 403 unless the role is admin
//! - [`Identity`]: any valid token; every failure is a plain 403
//!
//! Both reject before the handler body runs, so a rejected request never
//! reaches the store.

use std::time::Duration;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sweetjobs_models::ADMIN_ROLE;

use crate::error::ApiError;

/// Default lifetime of issued tokens.
const TOKEN_TTL: Duration = Duration::from_secs(24 * 3600);

/// Decoded token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub role: String,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Issues and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct AccessGate {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl AccessGate {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for `email` valid for a day.
    pub fn issue(&self, email: &str, role: &str) -> Result<String, ApiError> {
        self.issue_with_expiry(email, role, Utc::now().timestamp() + TOKEN_TTL.as_secs() as i64)
    }

    pub fn issue_with_expiry(&self, email: &str, role: &str, exp: i64) -> Result<String, ApiError> {
        let claims = Claims {
            sub: email.to_string(),
            role: role.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

/// Token from the Authorization header, with or without the Bearer prefix.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// A caller holding a valid admin token.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub email: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AccessGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = AccessGate::from_ref(state);

        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let claims = gate
            .verify(token)
            .map_err(|e| ApiError::unauthorized(format!("Token validation failed: {}", e)))?;

        if claims.role != ADMIN_ROLE {
            debug!(email = %claims.sub, role = %claims.role, "Admin route refused");
            return Err(ApiError::forbidden("Admin role required"));
        }

        Ok(AdminUser { email: claims.sub })
    }
}

/// The email and role of any caller holding a valid token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub role: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    AccessGate: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let gate = AccessGate::from_ref(state);
        let claims = bearer_token(parts)
            .and_then(|token| gate.verify(token).ok())
            .ok_or_else(|| ApiError::forbidden("forbidden"))?;

        Ok(Identity {
            email: claims.sub,
            role: claims.role,
        })
    }
}
