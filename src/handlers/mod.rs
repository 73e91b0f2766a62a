pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod schedules;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

/// Unwrap a JSON body, reporting malformed payloads as invalid input.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

/// Unwrap a numeric path id, reporting anything else as invalid input.
pub(crate) fn path_id(path: Result<Path<i32>, PathRejection>) -> AppResult<i32> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
