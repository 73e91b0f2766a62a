//! Rider session tokens.
//!
//! HS256 over `JWT_SECRET`. A token names the rider's account and email so
//! booking routes can attach the reservation to an account without a user
//! lookup. Anonymous booking never touches this module.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as TokenErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id of the rider
    pub sub: Uuid,
    /// Email the rider signed in with
    pub email: String,
    /// Unix seconds
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_rider(user_id: Uuid, email: &str, valid_for: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            exp: (now + valid_for).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn sign(&self, secret: &str) -> AppResult<String> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }
}

/// Decode a bearer token. Expiry and every other failure are both
/// Unauthorized, with distinct messages so clients know to sign in again.
pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    let mut validation = Validation::default();
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            TokenErrorKind::ExpiredSignature => {
                AppError::Unauthorized("Session expired".to_string())
            }
            _ => AppError::Unauthorized("Invalid token".to_string()),
        })
}
