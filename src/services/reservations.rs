//! Inventory reservation protocol.
//!
//! Booking and cancellation take an exclusive lock on the inventory row as
//! their first statement and hold it until commit, so capacity changes on
//! one unit are strictly serialized. Modification locks the reservation row
//! (and the inventory row first when the seat moves). Lock order is always
//! inventory, then reservation.
//!
//! Invariant upheld by every path here, for each inventory unit:
//! `available_seats + live reservations == total_seats`.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::entities::booking_modification::ModificationKind;
use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{inventory, route, schedule};
use crate::error::{AppError, AppResult};
use crate::services::audit::{self, FieldChange};
use crate::services::seat_map::{is_valid_tier, SeatLayout};
use crate::utils::pricing::fare;
use crate::utils::validation::{validate_email, validate_passenger_name};

#[derive(Debug, Clone, Deserialize)]
pub struct NewReservation {
    pub inventory_id: i32,
    pub passenger_name: String,
    pub passenger_email: String,
    pub seat_number: Option<i32>,
    pub seat_level: Option<i32>,
}

impl NewReservation {
    /// Syntactic checks; runs before any store access.
    fn validated(self, layout: &SeatLayout) -> AppResult<Self> {
        let passenger_name = validate_passenger_name(&self.passenger_name)?;
        validate_email(&self.passenger_email)?;

        if let Some(seat) = self.seat_number {
            if !layout.contains(seat) {
                return Err(AppError::InvalidInput(format!(
                    "Seat number must be between 1 and {}",
                    layout.total_seats()
                )));
            }
        }
        if let Some(level) = self.seat_level {
            if !is_valid_tier(level) {
                return Err(AppError::InvalidInput(
                    "Seat level must be 1, 2, or 3".to_string(),
                ));
            }
        }

        Ok(Self {
            passenger_name,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationPatch {
    pub seat_number: Option<i32>,
    pub passenger_name: Option<String>,
    pub passenger_email: Option<String>,
}

impl ReservationPatch {
    fn validated(self, layout: &SeatLayout) -> AppResult<Self> {
        let passenger_name = self
            .passenger_name
            .as_deref()
            .map(validate_passenger_name)
            .transpose()?;
        if let Some(email) = &self.passenger_email {
            validate_email(email)?;
        }
        if let Some(seat) = self.seat_number {
            if !layout.contains(seat) {
                return Err(AppError::InvalidInput(format!(
                    "Seat number must be between 1 and {}",
                    layout.total_seats()
                )));
            }
        }

        Ok(Self {
            passenger_name,
            ..self
        })
    }
}

/// Field changes `patch` would make to `current`. Fields equal to their
/// current value produce nothing.
pub fn diff_patch(current: &reservation::Model, patch: &ReservationPatch) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if let Some(seat) = patch.seat_number {
        if current.seat_number != Some(seat) {
            changes.push(FieldChange::new(
                ModificationKind::SeatChanged,
                "seat_number",
                current.seat_number.map(|s| s.to_string()),
                Some(seat.to_string()),
            ));
        }
    }

    if let Some(name) = &patch.passenger_name {
        if *name != current.passenger_name {
            changes.push(FieldChange::new(
                ModificationKind::PassengerUpdated,
                "passenger_name",
                Some(current.passenger_name.clone()),
                Some(name.clone()),
            ));
        }
    }

    if let Some(email) = &patch.passenger_email {
        if *email != current.passenger_email {
            changes.push(FieldChange::new(
                ModificationKind::PassengerUpdated,
                "passenger_email",
                Some(current.passenger_email.clone()),
                Some(email.clone()),
            ));
        }
    }

    changes
}

#[derive(Debug, Clone)]
pub struct BookedReservation {
    pub reservation: reservation::Model,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub price: Decimal,
    pub available_seats: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub inventory_id: i32,
    pub schedule_id: i32,
    pub date: NaiveDate,
    pub total_seats: i32,
    pub available_seats: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

fn no_seats() -> AppError {
    AppError::Conflict("No seats available".to_string())
}

fn seat_taken() -> AppError {
    AppError::Conflict("Seat already taken".to_string())
}

/// The partial unique index on live seats backs up the explicit check.
fn seat_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => seat_taken(),
        _ => err.into(),
    }
}

async fn lock_inventory<C: ConnectionTrait>(txn: &C, inventory_id: i32) -> AppResult<inventory::Model> {
    inventory::Entity::find_by_id(inventory_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory not found".to_string()))
}

async fn lock_reservation<C: ConnectionTrait>(
    txn: &C,
    reservation_id: i32,
) -> AppResult<reservation::Model> {
    reservation::Entity::find_by_id(reservation_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

async fn find_reservation<C: ConnectionTrait>(
    db: &C,
    reservation_id: i32,
) -> AppResult<reservation::Model> {
    reservation::Entity::find_by_id(reservation_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

async fn schedule_and_route<C: ConnectionTrait>(
    db: &C,
    unit: &inventory::Model,
) -> AppResult<(schedule::Model, route::Model)> {
    let sched = schedule::Entity::find_by_id(unit.schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Schedule {} not found", unit.schedule_id)))?;
    let route = route::Entity::find_by_id(sched.route_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Route {} not found", sched.route_id)))?;
    Ok((sched, route))
}

/// Live reservation on `inventory_id` holding `seat_number`, other than
/// `except`.
async fn seat_holder<C: ConnectionTrait>(
    db: &C,
    inventory_id: i32,
    seat_number: i32,
    except: Option<i32>,
) -> AppResult<Option<reservation::Model>> {
    let mut query = reservation::Entity::find()
        .filter(reservation::Column::InventoryId.eq(inventory_id))
        .filter(reservation::Column::SeatNumber.eq(seat_number))
        .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled));
    if let Some(id) = except {
        query = query.filter(reservation::Column::Id.ne(id));
    }
    Ok(query.one(db).await?)
}

// ============ Create ============

pub async fn create_reservation(
    db: &DatabaseConnection,
    layout: &SeatLayout,
    user_id: Option<Uuid>,
    request: NewReservation,
) -> AppResult<BookedReservation> {
    let request = request.validated(layout)?;

    let txn = db.begin().await?;
    let result = book_in(&txn, user_id, &request).await;
    let booked = db::finish(txn, result).await?;

    tracing::info!(
        reservation_id = booked.reservation.id,
        inventory_id = booked.reservation.inventory_id,
        seat_number = ?booked.reservation.seat_number,
        available_seats = booked.available_seats,
        "Reservation confirmed"
    );

    Ok(booked)
}

async fn book_in<C: ConnectionTrait>(
    txn: &C,
    user_id: Option<Uuid>,
    request: &NewReservation,
) -> AppResult<BookedReservation> {
    let unit = lock_inventory(txn, request.inventory_id).await?;
    book_against(txn, user_id, request, unit).await
}

/// Book against `unit` as read under the inventory lock. The capacity
/// claim re-checks the stored count, so a snapshot that has gone stale
/// still cannot take the unit below zero.
async fn book_against<C: ConnectionTrait>(
    txn: &C,
    user_id: Option<Uuid>,
    request: &NewReservation,
    unit: inventory::Model,
) -> AppResult<BookedReservation> {
    if unit.available_seats <= 0 {
        return Err(no_seats());
    }

    if let Some(seat) = request.seat_number {
        if seat_holder(txn, unit.id, seat, None).await?.is_some() {
            return Err(seat_taken());
        }
    }

    claim_seat(txn, unit.id).await?;

    let (sched, route) = schedule_and_route(txn, &unit).await?;
    let price = fare(route.base_price, unit.price_modifier)?;

    let now = Utc::now();
    let reservation = insert_reservation(
        txn,
        reservation::ActiveModel {
            user_id: Set(user_id),
            schedule_id: Set(unit.schedule_id),
            inventory_id: Set(unit.id),
            passenger_name: Set(request.passenger_name.clone()),
            passenger_email: Set(request.passenger_email.clone()),
            seat_number: Set(request.seat_number),
            seat_level: Set(request.seat_level),
            booking_date: Set(unit.date),
            status: Set(ReservationStatus::Confirmed),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        },
    )
    .await?;

    Ok(BookedReservation {
        reservation,
        departure_time: sched.departure_time,
        arrival_time: sched.arrival_time,
        price,
        available_seats: unit.available_seats - 1,
    })
}

/// `available_seats - 1`, only while it is still positive.
async fn claim_seat<C: ConnectionTrait>(txn: &C, inventory_id: i32) -> AppResult<()> {
    let claimed = inventory::Entity::update_many()
        .col_expr(
            inventory::Column::AvailableSeats,
            Expr::col(inventory::Column::AvailableSeats).sub(1),
        )
        .filter(inventory::Column::Id.eq(inventory_id))
        .filter(inventory::Column::AvailableSeats.gt(0))
        .exec(txn)
        .await?;

    if claimed.rows_affected != 1 {
        tracing::warn!(inventory_id, "Capacity claim lost to a concurrent booking");
        return Err(no_seats());
    }
    Ok(())
}

async fn insert_reservation<C: ConnectionTrait>(
    txn: &C,
    row: reservation::ActiveModel,
) -> AppResult<reservation::Model> {
    row.insert(txn).await.map_err(seat_conflict)
}

// ============ Modify ============

/// A reservation together with the times of the departure it is on.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledReservation {
    #[serde(flatten)]
    pub reservation: reservation::Model,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

pub async fn modify_reservation(
    db: &DatabaseConnection,
    layout: &SeatLayout,
    reservation_id: i32,
    patch: ReservationPatch,
) -> AppResult<ScheduledReservation> {
    let current = find_reservation(db, reservation_id).await?;
    if !current.status.is_live() {
        return Err(AppError::InvalidState(
            "Cannot modify a cancelled booking".to_string(),
        ));
    }
    let patch = patch.validated(layout)?;

    let txn = db.begin().await?;
    let result = modify_in(&txn, current.inventory_id, reservation_id, &patch).await;
    let updated = db::finish(txn, result).await?;

    tracing::info!(
        reservation_id,
        inventory_id = updated.inventory_id,
        "Reservation modified"
    );

    let sched = schedule::Entity::find_by_id(updated.schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Schedule {} not found", updated.schedule_id)))?;

    Ok(ScheduledReservation {
        reservation: updated,
        departure_time: sched.departure_time,
        arrival_time: sched.arrival_time,
    })
}

async fn modify_in<C: ConnectionTrait>(
    txn: &C,
    inventory_id: i32,
    reservation_id: i32,
    patch: &ReservationPatch,
) -> AppResult<reservation::Model> {
    if patch.seat_number.is_some() {
        lock_inventory(txn, inventory_id).await?;
    }
    let current = lock_reservation(txn, reservation_id).await?;

    // Re-checked under the row lock: a cancellation may have won the race.
    if !current.status.is_live() {
        return Err(AppError::InvalidState(
            "Cannot modify a cancelled booking".to_string(),
        ));
    }

    let changes = diff_patch(&current, patch);
    if changes.is_empty() {
        return Err(AppError::InvalidInput("No valid fields to update".to_string()));
    }

    let mut active: reservation::ActiveModel = current.clone().into();
    if let Some(seat) = patch.seat_number.filter(|s| current.seat_number != Some(*s)) {
        if seat_holder(txn, current.inventory_id, seat, Some(current.id))
            .await?
            .is_some()
        {
            return Err(seat_taken());
        }
        active.seat_number = Set(Some(seat));
    }
    if let Some(name) = &patch.passenger_name {
        active.passenger_name = Set(name.clone());
    }
    if let Some(email) = &patch.passenger_email {
        active.passenger_email = Set(email.clone());
    }
    active.status = Set(ReservationStatus::Modified);
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(txn).await.map_err(seat_conflict)?;
    audit::record_all(txn, updated.id, changes).await?;

    Ok(updated)
}

// ============ Cancel ============

pub async fn cancel_reservation(
    db: &DatabaseConnection,
    reservation_id: i32,
) -> AppResult<reservation::Model> {
    let current = find_reservation(db, reservation_id).await?;
    if !current.status.is_live() {
        return Err(AppError::InvalidState("Booking already cancelled".to_string()));
    }

    let txn = db.begin().await?;
    let result = cancel_in(&txn, current.inventory_id, reservation_id).await;
    let cancelled = db::finish(txn, result).await?;

    tracing::info!(
        reservation_id,
        inventory_id = cancelled.inventory_id,
        "Reservation cancelled"
    );

    Ok(cancelled)
}

async fn cancel_in<C: ConnectionTrait>(
    txn: &C,
    inventory_id: i32,
    reservation_id: i32,
) -> AppResult<reservation::Model> {
    lock_inventory(txn, inventory_id).await?;
    let current = lock_reservation(txn, reservation_id).await?;

    if !current.status.is_live() {
        return Err(AppError::InvalidState("Booking already cancelled".to_string()));
    }
    let prior_status = current.status;

    let mut active: reservation::ActiveModel = current.into();
    active.status = Set(ReservationStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    let cancelled = active.update(txn).await?;

    let released = inventory::Entity::update_many()
        .col_expr(
            inventory::Column::AvailableSeats,
            Expr::col(inventory::Column::AvailableSeats).add(1),
        )
        .filter(inventory::Column::Id.eq(inventory_id))
        .filter(
            Expr::col(inventory::Column::AvailableSeats)
                .lt(Expr::col(inventory::Column::TotalSeats)),
        )
        .exec(txn)
        .await?;
    if released.rows_affected != 1 {
        return Err(AppError::Internal(format!(
            "Inventory {} is already at full capacity",
            inventory_id
        )));
    }

    audit::record(
        txn,
        cancelled.id,
        FieldChange::new(
            ModificationKind::Cancelled,
            "status",
            Some(prior_status.as_str().to_string()),
            Some(ReservationStatus::Cancelled.as_str().to_string()),
        ),
    )
    .await?;

    Ok(cancelled)
}

// ============ Queries ============

/// Advisory snapshot read; takes no lock.
pub async fn availability<C: ConnectionTrait>(db: &C, inventory_id: i32) -> AppResult<Availability> {
    let unit = inventory::Entity::find_by_id(inventory_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory not found".to_string()))?;
    let (sched, route) = schedule_and_route(db, &unit).await?;

    Ok(Availability {
        inventory_id: unit.id,
        schedule_id: unit.schedule_id,
        date: unit.date,
        total_seats: unit.total_seats,
        available_seats: unit.available_seats,
        price: fare(route.base_price, unit.price_modifier)?,
        departure_time: sched.departure_time,
        arrival_time: sched.arrival_time,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct UserBooking {
    #[serde(flatten)]
    pub reservation: reservation::Model,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub origin: String,
    pub destination: String,
    pub base_price: f64,
}

/// Reservations linked to `user_id`, newest first.
pub async fn list_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Vec<UserBooking>> {
    let rows = reservation::Entity::find()
        .find_also_related(schedule::Entity)
        .filter(reservation::Column::UserId.eq(user_id))
        .order_by_desc(reservation::Column::CreatedAt)
        .order_by_desc(reservation::Column::Id)
        .all(db)
        .await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let route_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(_, sched)| sched.as_ref().map(|s| s.route_id))
        .collect();
    let routes: HashMap<i32, route::Model> = route::Entity::find()
        .filter(route::Column::Id.is_in(route_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    let bookings = rows
        .into_iter()
        .filter_map(|(r, sched)| {
            let sched = sched?;
            let route = routes.get(&sched.route_id)?;
            Some(UserBooking {
                departure_time: sched.departure_time,
                arrival_time: sched.arrival_time,
                origin: route.origin.clone(),
                destination: route.destination.clone(),
                base_price: route.base_price,
                reservation: r,
            })
        })
        .collect();

    Ok(bookings)
}

/// Audit records of an existing reservation.
pub async fn modification_history<C: ConnectionTrait>(
    db: &C,
    reservation_id: i32,
) -> AppResult<Vec<crate::entities::booking_modification::Model>> {
    find_reservation(db, reservation_id).await?;
    audit::history(db, reservation_id).await
}
