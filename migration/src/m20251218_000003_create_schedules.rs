use sea_orm_migration::{prelude::*, schema::*};

use super::m20251218_000002_create_routes::Route;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schedule::Table)
                    .if_not_exists()
                    .col(pk_auto(Schedule::Id))
                    .col(integer(Schedule::RouteId).not_null())
                    .col(time(Schedule::DepartureTime).not_null())
                    .col(time(Schedule::ArrivalTime).not_null())
                    // 0 = Sunday .. 6 = Saturday, NULL = every day
                    .col(
                        integer_null(Schedule::DayOfWeek)
                            .check(Expr::col(Schedule::DayOfWeek).between(0, 6)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_route")
                            .from(Schedule::Table, Schedule::RouteId)
                            .to(Route::Table, Route::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schedule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Schedule {
    Table,
    Id,
    RouteId,
    DepartureTime,
    ArrivalTime,
    DayOfWeek,
}
