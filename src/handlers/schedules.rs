use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::path_id;
use crate::services::catalog::{self, Departure};
use crate::services::reservations::{self, Availability};
use crate::services::seat_map::{self, SeatMap};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Departures between two locations on a date
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Departure>>> {
    let (Some(origin), Some(destination), Some(date)) = (
        present(query.origin),
        present(query.destination),
        present(query.date),
    ) else {
        return Err(AppError::InvalidInput(
            "Missing required parameters: origin, destination, date".to_string(),
        ));
    };

    let date = catalog::parse_travel_date(&date)?;
    let departures = catalog::search_departures(&state.db, &origin, &destination, date).await?;

    Ok(Json(departures))
}

pub async fn availability(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Availability>> {
    let inventory_id = path_id(path)?;
    Ok(Json(reservations::availability(&state.db, inventory_id).await?))
}

/// Seats of an inventory unit grouped by tier
pub async fn seats(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<SeatMap>> {
    let inventory_id = path_id(path)?;
    Ok(Json(
        seat_map::seat_map(&state.db, inventory_id, &state.seat_layout).await?,
    ))
}
