use chrono::{Datelike, NaiveDate};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub route_id: i32,
    pub departure_time: Time,
    pub arrival_time: Time,
    /// 0 = Sunday .. 6 = Saturday; `None` runs every day.
    pub day_of_week: Option<i32>,
}

impl Model {
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        runs_on(self.day_of_week, date)
    }
}

pub fn runs_on(day_of_week: Option<i32>, date: NaiveDate) -> bool {
    match day_of_week {
        None => true,
        Some(day) => day == date.weekday().num_days_from_sunday() as i32,
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id"
    )]
    Route,
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
