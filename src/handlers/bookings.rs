use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::entities::booking_modification;
use crate::entities::reservation::ReservationStatus;
use crate::error::{AppError, AppResult};
use crate::handlers::{json_body, path_id};
use crate::middleware::auth::MaybeClaims;
use crate::services::reservations::{
    self, BookedReservation, NewReservation, ReservationPatch, ScheduledReservation, UserBooking,
};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub inventory_id: Option<i32>,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<String>,
    pub seat_number: Option<i32>,
    pub seat_level: Option<i32>,
}

impl TryFrom<CreateBookingRequest> for NewReservation {
    type Error = AppError;

    fn try_from(req: CreateBookingRequest) -> AppResult<Self> {
        let (Some(inventory_id), Some(passenger_name), Some(passenger_email)) =
            (req.inventory_id, req.passenger_name, req.passenger_email)
        else {
            return Err(AppError::InvalidInput(
                "Missing required fields: inventory_id, passenger_name, passenger_email"
                    .to_string(),
            ));
        };

        Ok(NewReservation {
            inventory_id,
            passenger_name,
            passenger_email,
            seat_number: req.seat_number,
            seat_level: req.seat_level,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: i32,
    pub schedule_id: i32,
    pub inventory_id: i32,
    pub passenger_name: String,
    pub passenger_email: String,
    pub seat_number: Option<i32>,
    pub seat_level: Option<i32>,
    pub status: ReservationStatus,
    pub booking_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

impl From<BookedReservation> for BookingResponse {
    fn from(booked: BookedReservation) -> Self {
        let r = booked.reservation;
        Self {
            id: r.id,
            schedule_id: r.schedule_id,
            inventory_id: r.inventory_id,
            passenger_name: r.passenger_name,
            passenger_email: r.passenger_email,
            seat_number: r.seat_number,
            seat_level: r.seat_level,
            status: r.status,
            booking_date: r.booking_date,
            departure_time: booked.departure_time,
            arrival_time: booked.arrival_time,
            price: booked.price,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub id: i32,
    pub status: ReservationStatus,
    pub cancelled_at: DateTimeWithTimeZone,
}

/// Book a seat-equivalent on an inventory unit. Signing in is optional; a
/// valid token links the booking to the account.
pub async fn create_booking(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    let request = NewReservation::try_from(json_body(payload)?)?;
    let user_id = claims.map(|c| c.sub);

    let booked =
        reservations::create_reservation(&state.db, &state.seat_layout, user_id, request).await?;

    Ok((StatusCode::CREATED, Json(booked.into())))
}

pub async fn update_booking(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<ReservationPatch>, JsonRejection>,
) -> AppResult<Json<ScheduledReservation>> {
    let reservation_id = path_id(path)?;
    let patch = json_body(payload)?;
    let updated =
        reservations::modify_reservation(&state.db, &state.seat_layout, reservation_id, patch)
            .await?;

    Ok(Json(updated))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<CancellationResponse>> {
    let reservation_id = path_id(path)?;
    let cancelled = reservations::cancel_reservation(&state.db, reservation_id).await?;

    Ok(Json(CancellationResponse {
        id: cancelled.id,
        status: cancelled.status,
        cancelled_at: cancelled.updated_at,
    }))
}

/// Bookings of the signed-in user, newest first
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<UserBooking>>> {
    Ok(Json(reservations::list_for_user(&state.db, claims.sub).await?))
}

pub async fn booking_history(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<Vec<booking_modification::Model>>> {
    let reservation_id = path_id(path)?;
    Ok(Json(
        reservations::modification_history(&state.db, reservation_id).await?,
    ))
}
