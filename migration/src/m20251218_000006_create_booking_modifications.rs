use sea_orm_migration::{prelude::*, schema::*};

use super::m20251218_000005_create_reservations::Reservation;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingModification::Table)
                    .if_not_exists()
                    .col(pk_auto(BookingModification::Id))
                    .col(integer(BookingModification::ReservationId).not_null())
                    .col(
                        string_len(BookingModification::ModificationType, 32)
                            .not_null()
                            .check(Expr::col(BookingModification::ModificationType).is_in([
                                "seat_changed",
                                "passenger_updated",
                                "cancelled",
                            ])),
                    )
                    .col(string_len(BookingModification::Field, 32).not_null())
                    .col(text_null(BookingModification::OldValue))
                    .col(text_null(BookingModification::NewValue))
                    .col(
                        timestamp_with_time_zone(BookingModification::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_modification_reservation")
                            .from(BookingModification::Table, BookingModification::ReservationId)
                            .to(Reservation::Table, Reservation::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_modification_reservation_id")
                    .table(BookingModification::Table)
                    .col(BookingModification::ReservationId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingModification::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingModification {
    Table,
    Id,
    ReservationId,
    ModificationType,
    Field,
    OldValue,
    NewValue,
    CreatedAt,
}
