use std::collections::{BTreeMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::entities::reservation::{self, ReservationStatus};
use crate::error::{AppError, AppResult};

/// Seat tiers are the closed set `{1, 2, 3}`.
pub const SEAT_TIERS: [i32; 3] = [1, 2, 3];

pub fn is_valid_tier(level: i32) -> bool {
    SEAT_TIERS.contains(&level)
}

/// Partition of seat numbers `1..=total_seats` into three contiguous tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLayout {
    total_seats: i32,
    /// Last seat number of each tier.
    tier_ends: [i32; 3],
}

impl SeatLayout {
    /// First third (rounded up) is tier 1, the next third tier 2, the rest
    /// tier 3. Gives 1-5 / 6-10 / 11-14 for fourteen seats.
    pub fn thirds(total_seats: i32) -> Self {
        let total_seats = total_seats.max(0);
        let size = (total_seats + 2) / 3;
        Self {
            total_seats,
            tier_ends: [
                size.min(total_seats),
                (size * 2).min(total_seats),
                total_seats,
            ],
        }
    }

    pub fn with_tier_sizes(total_seats: i32, sizes: &[i32]) -> AppResult<Self> {
        if sizes.len() != SEAT_TIERS.len() {
            return Err(AppError::InvalidInput(format!(
                "Expected {} seat tier sizes, got {}",
                SEAT_TIERS.len(),
                sizes.len()
            )));
        }
        if sizes.iter().any(|s| *s < 0) || sizes.iter().sum::<i32>() != total_seats {
            return Err(AppError::InvalidInput(format!(
                "Seat tier sizes {:?} do not add up to {} seats",
                sizes, total_seats
            )));
        }

        Ok(Self {
            total_seats,
            tier_ends: [sizes[0], sizes[0] + sizes[1], total_seats],
        })
    }

    pub fn total_seats(&self) -> i32 {
        self.total_seats
    }

    pub fn contains(&self, seat_number: i32) -> bool {
        (1..=self.total_seats).contains(&seat_number)
    }

    pub fn tier_of(&self, seat_number: i32) -> Option<i32> {
        if !self.contains(seat_number) {
            return None;
        }
        SEAT_TIERS
            .iter()
            .zip(self.tier_ends)
            .find(|(_, end)| seat_number <= *end)
            .map(|(tier, _)| *tier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatInfo {
    pub seat_number: i32,
    pub level: i32,
    pub available: bool,
}

/// Seats grouped by tier; every tier is present, possibly empty.
pub type SeatMap = BTreeMap<i32, Vec<SeatInfo>>;

pub fn build_seat_map(layout: &SeatLayout, taken: &HashSet<i32>) -> SeatMap {
    let mut map: SeatMap = SEAT_TIERS.iter().map(|t| (*t, Vec::new())).collect();

    for seat_number in 1..=layout.total_seats() {
        let Some(level) = layout.tier_of(seat_number) else {
            continue;
        };
        map.entry(level).or_default().push(SeatInfo {
            seat_number,
            level,
            available: !taken.contains(&seat_number),
        });
    }

    map
}

/// Seat numbers held by live reservations on a unit.
pub async fn taken_seats<C: ConnectionTrait>(db: &C, inventory_id: i32) -> AppResult<HashSet<i32>> {
    let live = reservation::Entity::find()
        .filter(reservation::Column::InventoryId.eq(inventory_id))
        .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled))
        .filter(reservation::Column::SeatNumber.is_not_null())
        .all(db)
        .await?;

    Ok(live.into_iter().filter_map(|r| r.seat_number).collect())
}

pub async fn seat_map<C: ConnectionTrait>(
    db: &C,
    inventory_id: i32,
    layout: &SeatLayout,
) -> AppResult<SeatMap> {
    let taken = taken_seats(db, inventory_id).await?;
    Ok(build_seat_map(layout, &taken))
}
