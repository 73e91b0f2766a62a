use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::entities::{inventory, route, schedule};
use crate::error::{AppError, AppResult};
use crate::utils::pricing::fare;

pub async fn list_routes<C: ConnectionTrait>(db: &C) -> AppResult<Vec<route::Model>> {
    Ok(route::Entity::find()
        .order_by_asc(route::Column::Origin)
        .order_by_asc(route::Column::Destination)
        .all(db)
        .await?)
}

/// Every location that appears as a route endpoint, sorted.
pub async fn list_locations<C: ConnectionTrait>(db: &C) -> AppResult<Vec<String>> {
    let routes = route::Entity::find().all(db).await?;
    let mut names: Vec<String> = routes
        .into_iter()
        .flat_map(|r| [r.origin, r.destination])
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_travel_date(raw: &str) -> AppResult<NaiveDate> {
    let well_formed = raw.len() == 10
        && raw
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(AppError::InvalidInput(
            "Invalid date format. Use YYYY-MM-DD".to_string(),
        ));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput("Invalid date format. Use YYYY-MM-DD".to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct Departure {
    pub schedule_id: i32,
    pub inventory_id: i32,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub available_seats: i32,
    pub total_seats: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub date: NaiveDate,
}

/// Bookable departures between two locations on `date`, earliest first.
/// Units that are sold out or not generated yet are left out.
pub async fn search_departures<C: ConnectionTrait>(
    db: &C,
    origin: &str,
    destination: &str,
    date: NaiveDate,
) -> AppResult<Vec<Departure>> {
    let route = route::Entity::find()
        .filter(route::Column::Origin.eq(origin))
        .filter(route::Column::Destination.eq(destination))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Route not found".to_string()))?;

    let weekday = date.weekday().num_days_from_sunday() as i32;
    let schedules = schedule::Entity::find()
        .filter(schedule::Column::RouteId.eq(route.id))
        .filter(
            Condition::any()
                .add(schedule::Column::DayOfWeek.is_null())
                .add(schedule::Column::DayOfWeek.eq(weekday)),
        )
        .order_by_asc(schedule::Column::DepartureTime)
        .all(db)
        .await?;

    let mut departures = Vec::new();
    for sched in schedules {
        let unit = inventory::Entity::find()
            .filter(inventory::Column::ScheduleId.eq(sched.id))
            .filter(inventory::Column::Date.eq(date))
            .one(db)
            .await?;

        let Some(unit) = unit else { continue };
        if unit.available_seats <= 0 {
            continue;
        }

        departures.push(Departure {
            schedule_id: sched.id,
            inventory_id: unit.id,
            departure_time: sched.departure_time,
            arrival_time: sched.arrival_time,
            available_seats: unit.available_seats,
            total_seats: unit.total_seats,
            price: fare(route.base_price, unit.price_modifier)?,
            date,
        });
    }

    Ok(departures)
}
