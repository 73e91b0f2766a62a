use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Route::Table)
                    .if_not_exists()
                    .col(pk_auto(Route::Id))
                    .col(string_len(Route::Origin, 100).not_null())
                    .col(string_len(Route::Destination, 100).not_null())
                    .col(integer(Route::DistanceMiles).not_null())
                    .col(double(Route::BasePrice).not_null())
                    .to_owned(),
            )
            .await?;

        // A route is identified by its ordered (origin, destination) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_route_origin_destination")
                    .table(Route::Table)
                    .col(Route::Origin)
                    .col(Route::Destination)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Route::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Route {
    Table,
    Id,
    Origin,
    Destination,
    DistanceMiles,
    BasePrice,
}
