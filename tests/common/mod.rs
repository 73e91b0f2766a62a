#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use landline_backend::entities::reservation::{self, ReservationStatus};
use landline_backend::entities::{inventory, route, schedule};
use landline_backend::services::inventory::{generate_inventory, GenerationWindow};
use landline_backend::services::reservations::NewReservation;
use landline_backend::{AppState, Config};
use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use tokio::sync::OnceCell;

pub const SEATS: i32 = 14;

/// Fresh in-memory database with the production schema. A single pooled
/// connection keeps every task on the same database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("failed to open sqlite");
    Migrator::up(&db, None).await.expect("failed to migrate");
    db
}

static POSTGRES_MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Pooled Postgres connection from `TEST_DATABASE_URL`, with several
/// connections so transactions really overlap. `None` when the variable is
/// unset; callers skip.
pub async fn postgres_db() -> Option<DatabaseConnection> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let mut options = ConnectOptions::new(url);
    options.max_connections(20).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");
    POSTGRES_MIGRATED
        .get_or_init(|| async {
            Migrator::up(&db, None).await.expect("failed to migrate");
        })
        .await;
    Some(db)
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        seats_per_unit: SEATS,
        seat_tier_sizes: None,
        inventory_window_days: 1,
        inventory_refresh_hours: 24,
        seed_reference_data: false,
    }
}

pub fn test_state(db: DatabaseConnection) -> AppState {
    AppState::new(db, test_config())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Thursday
pub fn weekday() -> NaiveDate {
    date(2025, 12, 18)
}

/// Saturday
pub fn saturday() -> NaiveDate {
    date(2025, 12, 20)
}

pub struct Fixture {
    pub route_id: i32,
    pub schedule_id: i32,
}

/// Los Angeles to San Francisco at 49.00, one daily 06:00 departure.
pub async fn la_to_sf(db: &DatabaseConnection) -> Fixture {
    route_between(db, "Los Angeles", "San Francisco").await
}

/// A 49.00 route with one daily 06:00 departure.
pub async fn route_between(db: &DatabaseConnection, origin: &str, destination: &str) -> Fixture {
    let route = route::ActiveModel {
        origin: Set(origin.to_string()),
        destination: Set(destination.to_string()),
        distance_miles: Set(380),
        base_price: Set(49.0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let schedule = schedule::ActiveModel {
        route_id: Set(route.id),
        departure_time: Set(NaiveTime::from_hms_opt(6, 0, 0).unwrap()),
        arrival_time: Set(NaiveTime::from_hms_opt(10, 30, 0).unwrap()),
        day_of_week: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    Fixture {
        route_id: route.id,
        schedule_id: schedule.id,
    }
}

/// Generate the unit of `schedule_id` on `on` and return it.
pub async fn unit_on(db: &DatabaseConnection, schedule_id: i32, on: NaiveDate) -> inventory::Model {
    generate_inventory(db, GenerationWindow::new(on, 1), SEATS)
        .await
        .unwrap();

    find_unit(db, schedule_id, on).await
}

/// Insert a full unit directly, bypassing generation.
pub async fn insert_unit(db: &DatabaseConnection, schedule_id: i32, on: NaiveDate) -> inventory::Model {
    inventory::ActiveModel {
        schedule_id: Set(schedule_id),
        date: Set(on),
        total_seats: Set(SEATS),
        available_seats: Set(SEATS),
        price_modifier: Set(1.0),
        created_at: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn find_unit(db: &DatabaseConnection, schedule_id: i32, on: NaiveDate) -> inventory::Model {
    inventory::Entity::find()
        .filter(inventory::Column::ScheduleId.eq(schedule_id))
        .filter(inventory::Column::Date.eq(on))
        .one(db)
        .await
        .unwrap()
        .expect("inventory unit missing")
}

pub async fn reload_unit(db: &DatabaseConnection, inventory_id: i32) -> inventory::Model {
    inventory::Entity::find_by_id(inventory_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}

pub fn passenger(inventory_id: i32, seat_number: Option<i32>) -> NewReservation {
    NewReservation {
        inventory_id,
        passenger_name: "Jane Doe".to_string(),
        passenger_email: "jane@example.com".to_string(),
        seat_number,
        seat_level: None,
    }
}

pub async fn live_reservations(db: &DatabaseConnection, inventory_id: i32) -> u64 {
    reservation::Entity::find()
        .filter(reservation::Column::InventoryId.eq(inventory_id))
        .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled))
        .count(db)
        .await
        .unwrap()
}

/// `available_seats + live reservations == total_seats`
pub async fn assert_conserved(db: &DatabaseConnection, inventory_id: i32) {
    let unit = reload_unit(db, inventory_id).await;
    let live = live_reservations(db, inventory_id).await as i32;
    assert_eq!(
        unit.available_seats + live,
        unit.total_seats,
        "available {} + live {} != total {}",
        unit.available_seats,
        live,
        unit.total_seats
    );
}
