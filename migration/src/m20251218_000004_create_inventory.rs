use sea_orm_migration::{prelude::*, schema::*};

use super::m20251218_000003_create_schedules::Schedule;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(pk_auto(Inventory::Id))
                    .col(integer(Inventory::ScheduleId).not_null())
                    .col(date(Inventory::Date).not_null())
                    .col(integer(Inventory::TotalSeats).not_null())
                    .col(
                        integer(Inventory::AvailableSeats)
                            .not_null()
                            .check(Expr::col(Inventory::AvailableSeats).gte(0)),
                    )
                    .col(double(Inventory::PriceModifier).not_null().default(1.0))
                    .col(
                        timestamp_with_time_zone(Inventory::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_schedule")
                            .from(Inventory::Table, Inventory::ScheduleId)
                            .to(Schedule::Table, Schedule::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Target of the generator's ON CONFLICT clause
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_schedule_date")
                    .table(Inventory::Table)
                    .col(Inventory::ScheduleId)
                    .col(Inventory::Date)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Inventory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Inventory {
    Table,
    Id,
    ScheduleId,
    Date,
    TotalSeats,
    AvailableSeats,
    PriceModifier,
    CreatedAt,
}
