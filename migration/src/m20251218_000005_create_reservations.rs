use sea_orm_migration::{prelude::*, schema::*};

use super::m20251218_000001_create_users::User;
use super::m20251218_000003_create_schedules::Schedule;
use super::m20251218_000004_create_inventory::Inventory;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservation::Table)
                    .if_not_exists()
                    .col(pk_auto(Reservation::Id))
                    .col(uuid_null(Reservation::UserId))
                    .col(integer(Reservation::ScheduleId).not_null())
                    .col(integer(Reservation::InventoryId).not_null())
                    .col(string_len(Reservation::PassengerName, 255).not_null())
                    .col(string_len(Reservation::PassengerEmail, 255).not_null())
                    .col(integer_null(Reservation::SeatNumber))
                    .col(
                        integer_null(Reservation::SeatLevel)
                            .check(Expr::col(Reservation::SeatLevel).is_in([1, 2, 3])),
                    )
                    .col(date(Reservation::BookingDate).not_null())
                    .col(
                        string_len(Reservation::Status, 16)
                            .not_null()
                            .default("confirmed")
                            .check(Expr::col(Reservation::Status).is_in([
                                "confirmed",
                                "modified",
                                "cancelled",
                            ])),
                    )
                    .col(
                        timestamp_with_time_zone(Reservation::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Reservation::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_user")
                            .from(Reservation::Table, Reservation::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_schedule")
                            .from(Reservation::Table, Reservation::ScheduleId)
                            .to(Schedule::Table, Schedule::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservation_inventory")
                            .from(Reservation::Table, Reservation::InventoryId)
                            .to(Inventory::Table, Inventory::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservation_inventory_id")
                    .table(Reservation::Table)
                    .col(Reservation::InventoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservation_user_id")
                    .table(Reservation::Table)
                    .col(Reservation::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Two live reservations can never hold the same seat of one unit.
        // Partial indexes have no builder form, the statement is portable
        // between Postgres and SQLite.
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_reservation_live_seat"
                   ON "reservation" ("inventory_id", "seat_number")
                   WHERE "status" <> 'cancelled' AND "seat_number" IS NOT NULL"#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservation::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Reservation {
    Table,
    Id,
    UserId,
    ScheduleId,
    InventoryId,
    PassengerName,
    PassengerEmail,
    SeatNumber,
    SeatLevel,
    BookingDate,
    Status,
    CreatedAt,
    UpdatedAt,
}
