use axum::{extract::State, Json};

use crate::entities::route;
use crate::error::AppResult;
use crate::services::catalog;
use crate::AppState;

pub async fn list_routes(State(state): State<AppState>) -> AppResult<Json<Vec<route::Model>>> {
    Ok(Json(catalog::list_routes(&state.db).await?))
}

pub async fn list_locations(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(catalog::list_locations(&state.db).await?))
}
