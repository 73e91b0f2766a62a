pub use sea_orm_migration::prelude::*;

mod m20251218_000001_create_users;
mod m20251218_000002_create_routes;
mod m20251218_000003_create_schedules;
mod m20251218_000004_create_inventory;
mod m20251218_000005_create_reservations;
mod m20251218_000006_create_booking_modifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251218_000001_create_users::Migration),
            Box::new(m20251218_000002_create_routes::Migration),
            Box::new(m20251218_000003_create_schedules::Migration),
            Box::new(m20251218_000004_create_inventory::Migration),
            Box::new(m20251218_000005_create_reservations::Migration),
            Box::new(m20251218_000006_create_booking_modifications::Migration),
        ]
    }
}
