//! Reference network: locations, routes between every ordered pair, and
//! the daily timetable. Insert-if-absent; existing rows are never touched.

use chrono::NaiveTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{route, schedule};
use crate::error::{AppError, AppResult};

pub const LOCATIONS: [&str; 10] = [
    "Los Angeles",
    "San Francisco",
    "Las Vegas",
    "Sacramento",
    "San Diego",
    "New York",
    "Boston",
    "Philadelphia",
    "Portland",
    "Phoenix",
];

const DEFAULT_BASE_PRICE: f64 = 50.0;
const DEFAULT_DISTANCE_MILES: i32 = 100;

/// `BASE_PRICES[i][j]` is the fare from `LOCATIONS[i]` to `LOCATIONS[j]`.
const BASE_PRICES: [[u32; 10]; 10] = [
    [0, 49, 39, 50, 29, 199, 209, 189, 89, 55],
    [49, 0, 69, 25, 59, 209, 219, 199, 79, 89],
    [39, 69, 0, 69, 45, 179, 189, 169, 109, 42],
    [50, 25, 69, 0, 59, 199, 209, 189, 69, 89],
    [29, 59, 45, 59, 0, 189, 199, 179, 119, 48],
    [199, 209, 179, 199, 189, 0, 42, 28, 179, 169],
    [209, 219, 189, 209, 199, 42, 0, 48, 32, 179],
    [189, 199, 169, 189, 179, 28, 48, 0, 179, 159],
    [89, 79, 109, 69, 119, 179, 32, 179, 0, 139],
    [55, 89, 42, 89, 48, 169, 179, 159, 139, 0],
];

const DISTANCES_MILES: [[u32; 10]; 10] = [
    [0, 380, 270, 385, 120, 2789, 2977, 2714, 960, 370],
    [380, 0, 568, 90, 500, 2905, 3093, 2830, 635, 756],
    [270, 568, 0, 571, 331, 2520, 2708, 2445, 1118, 300],
    [385, 90, 571, 0, 500, 2815, 3003, 2740, 580, 756],
    [120, 500, 331, 500, 0, 2669, 2857, 2594, 1255, 355],
    [2789, 2905, 2520, 2815, 2669, 0, 215, 95, 2454, 2425],
    [2977, 3093, 2708, 3003, 2857, 215, 0, 310, 110, 2613],
    [2714, 2830, 2445, 2740, 2594, 95, 310, 0, 2549, 2350],
    [960, 635, 1118, 580, 1255, 2454, 110, 2549, 0, 1485],
    [370, 756, 300, 756, 355, 2425, 2613, 2350, 1485, 0],
];

/// Departure/arrival pairs run on every route, every day.
const TIMETABLE: [((u32, u32), (u32, u32)); 7] = [
    ((6, 0), (10, 30)),
    ((8, 0), (12, 30)),
    ((10, 0), (14, 30)),
    ((12, 0), (16, 30)),
    ((14, 0), (18, 30)),
    ((16, 0), (20, 30)),
    ((18, 0), (22, 30)),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RouteSeed {
    pub origin: &'static str,
    pub destination: &'static str,
    pub distance_miles: i32,
    pub base_price: f64,
}

/// One seed per ordered pair of distinct locations.
pub fn route_seeds() -> Vec<RouteSeed> {
    let mut seeds = Vec::new();
    for (i, &origin) in LOCATIONS.iter().enumerate() {
        for (j, &destination) in LOCATIONS.iter().enumerate() {
            if i == j {
                continue;
            }
            let price = BASE_PRICES[i][j];
            let distance = DISTANCES_MILES[i][j];
            seeds.push(RouteSeed {
                origin,
                destination,
                distance_miles: if distance == 0 {
                    DEFAULT_DISTANCE_MILES
                } else {
                    distance as i32
                },
                base_price: if price == 0 {
                    DEFAULT_BASE_PRICE
                } else {
                    price as f64
                },
            });
        }
    }
    seeds
}

fn clock(hour: u32, minute: u32) -> AppResult<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppError::Internal(format!("Invalid timetable entry {}:{}", hour, minute)))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub routes_created: u64,
    pub schedules_created: u64,
}

pub async fn seed_reference_data(db: &DatabaseConnection) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    for seed in route_seeds() {
        let existing = route::Entity::find()
            .filter(route::Column::Origin.eq(seed.origin))
            .filter(route::Column::Destination.eq(seed.destination))
            .one(db)
            .await?;

        if existing.is_none() {
            route::ActiveModel {
                origin: Set(seed.origin.to_string()),
                destination: Set(seed.destination.to_string()),
                distance_miles: Set(seed.distance_miles),
                base_price: Set(seed.base_price),
                ..Default::default()
            }
            .insert(db)
            .await?;
            report.routes_created += 1;
        }
    }

    let routes = route::Entity::find()
        .order_by_asc(route::Column::Id)
        .all(db)
        .await?;

    for r in routes {
        let scheduled = schedule::Entity::find()
            .filter(schedule::Column::RouteId.eq(r.id))
            .count(db)
            .await?;
        if scheduled > 0 {
            continue;
        }

        for ((dep_h, dep_m), (arr_h, arr_m)) in TIMETABLE {
            schedule::ActiveModel {
                route_id: Set(r.id),
                departure_time: Set(clock(dep_h, dep_m)?),
                arrival_time: Set(clock(arr_h, arr_m)?),
                day_of_week: Set(None),
                ..Default::default()
            }
            .insert(db)
            .await?;
            report.schedules_created += 1;
        }
    }

    tracing::info!(
        routes_created = report.routes_created,
        schedules_created = report.schedules_created,
        "Reference data seeded"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_ordered_pair_has_a_route() {
        let seeds = route_seeds();
        assert_eq!(seeds.len(), 90);
        assert!(seeds.iter().all(|s| s.origin != s.destination));
    }

    #[test]
    fn test_reference_fares() {
        let seeds = route_seeds();
        let la_sf = seeds
            .iter()
            .find(|s| s.origin == "Los Angeles" && s.destination == "San Francisco")
            .unwrap();
        assert_eq!(la_sf.base_price, 49.0);
        assert_eq!(la_sf.distance_miles, 380);

        let ny_phl = seeds
            .iter()
            .find(|s| s.origin == "New York" && s.destination == "Philadelphia")
            .unwrap();
        assert_eq!(ny_phl.base_price, 28.0);
    }

    #[test]
    fn test_timetable_is_valid() {
        for ((dep_h, dep_m), (arr_h, arr_m)) in TIMETABLE {
            assert!(clock(dep_h, dep_m).unwrap() < clock(arr_h, arr_m).unwrap());
        }
    }
}
