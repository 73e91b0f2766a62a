use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let auth = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Caller identity for routes where signing in is optional. A missing,
/// malformed or expired token yields `None` instead of a rejection.
#[derive(Debug, Clone)]
pub struct MaybeClaims(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeClaims {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .and_then(|auth| match verify_token(auth.token(), &state.config.jwt_secret) {
                Ok(claims) => Some(claims),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring invalid token on optional auth route");
                    None
                }
            });

        Ok(MaybeClaims(claims))
    }
}
