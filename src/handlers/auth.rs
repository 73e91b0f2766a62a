use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::handlers::json_body;
use crate::utils::jwt::Claims;
use crate::utils::validation::validate_email;
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue(state: &AppState, user: user::Model) -> AppResult<AuthResponse> {
    let valid_for = Duration::hours(state.config.jwt_expiration_hours);
    let token = Claims::for_rider(user.id, &user.email, valid_for).sign(&state.config.jwt_secret)?;

    Ok(AuthResponse {
        user: UserInfo {
            id: user.id,
            email: user.email,
        },
        token,
    })
}

/// Create an account and sign it in
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let payload = json_body(payload)?;
    let email = normalize_email(&payload.email);
    validate_email(&email)?;

    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    // A concurrent signup for the same email loses on the unique index
    // and surfaces as a conflict.
    let user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(user_id = %user.id, "User signed up");

    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

/// Sign in with email and password
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let payload = json_body(payload)?;
    let email = normalize_email(&payload.email);

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

    Ok(Json(issue(&state, user)?))
}
