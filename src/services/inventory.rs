//! Materializes inventory units for a rolling window of dates.
//!
//! Every (schedule, date) pair is written with insert-if-absent semantics,
//! so re-running generation never resets seats that were already sold. The
//! first day of the window is the reconciliation day: an existing row there
//! gets its `available_seats` recomputed from the live reservations, under
//! the same row lock the booking path takes.

use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::db;
use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::{inventory, schedule};
use crate::error::AppResult;
use crate::utils::pricing::price_modifier_for;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationWindow {
    pub start: NaiveDate,
    pub days: u32,
}

impl GenerationWindow {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    /// `(offset, date)` for each day in the window.
    pub fn dates(&self) -> impl Iterator<Item = (u32, NaiveDate)> + '_ {
        (0..self.days).filter_map(move |offset| {
            self.start
                .checked_add_days(Days::new(offset as u64))
                .map(|date| (offset, date))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedUnit {
    pub schedule_id: i32,
    pub date: NaiveDate,
    pub price_modifier: f64,
    pub reconcile: bool,
}

/// Every (schedule, date) pair in the window on which the schedule runs.
pub fn plan(schedules: &[schedule::Model], window: GenerationWindow) -> Vec<PlannedUnit> {
    let mut planned = Vec::new();
    for (offset, date) in window.dates() {
        let price_modifier = price_modifier_for(date);
        for sched in schedules.iter().filter(|s| s.runs_on(date)) {
            planned.push(PlannedUnit {
                schedule_id: sched.id,
                date,
                price_modifier,
                reconcile: offset == 0,
            });
        }
    }
    planned
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub created: u64,
    pub reconciled: u64,
    pub existing: u64,
}

enum Outcome {
    Created,
    Reconciled,
    Existing,
}

pub async fn generate_inventory(
    db: &DatabaseConnection,
    window: GenerationWindow,
    total_seats: i32,
) -> AppResult<GenerationReport> {
    let schedules = schedule::Entity::find().all(db).await?;
    let mut report = GenerationReport::default();

    for unit in plan(&schedules, window) {
        let outcome = if unit.reconcile {
            let txn = db.begin().await?;
            let result = reconcile_or_insert(&txn, &unit, total_seats).await;
            db::finish(txn, result).await?
        } else {
            insert_if_absent(db, &unit, total_seats).await?
        };

        match outcome {
            Outcome::Created => report.created += 1,
            Outcome::Reconciled => report.reconciled += 1,
            Outcome::Existing => report.existing += 1,
        }
    }

    tracing::info!(
        start = %window.start,
        days = window.days,
        created = report.created,
        reconciled = report.reconciled,
        existing = report.existing,
        "Inventory generation complete"
    );

    Ok(report)
}

async fn insert_if_absent<C: ConnectionTrait>(
    db: &C,
    unit: &PlannedUnit,
    total_seats: i32,
) -> AppResult<Outcome> {
    let row = inventory::ActiveModel {
        schedule_id: Set(unit.schedule_id),
        date: Set(unit.date),
        total_seats: Set(total_seats),
        available_seats: Set(total_seats),
        price_modifier: Set(unit.price_modifier),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let inserted = inventory::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([inventory::Column::ScheduleId, inventory::Column::Date])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(if inserted > 0 {
        Outcome::Created
    } else {
        Outcome::Existing
    })
}

async fn reconcile_or_insert<C: ConnectionTrait>(
    txn: &C,
    unit: &PlannedUnit,
    total_seats: i32,
) -> AppResult<Outcome> {
    let existing = inventory::Entity::find()
        .filter(inventory::Column::ScheduleId.eq(unit.schedule_id))
        .filter(inventory::Column::Date.eq(unit.date))
        .lock_exclusive()
        .one(txn)
        .await?;

    let Some(existing) = existing else {
        return insert_if_absent(txn, unit, total_seats).await;
    };

    let reserved = reservation::Entity::find()
        .filter(reservation::Column::InventoryId.eq(existing.id))
        .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled))
        .count(txn)
        .await?;
    let available = (total_seats as i64 - reserved as i64).max(0) as i32;

    if available != existing.available_seats {
        tracing::warn!(
            inventory_id = existing.id,
            stored = existing.available_seats,
            recomputed = available,
            "Reconciled available seats from live reservations"
        );
    }

    let mut active: inventory::ActiveModel = existing.into();
    active.total_seats = Set(total_seats);
    active.available_seats = Set(available);
    active.price_modifier = Set(unit.price_modifier);
    active.update(txn).await?;

    Ok(Outcome::Reconciled)
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshSettings {
    pub window_days: u32,
    pub total_seats: i32,
    pub every: Duration,
}

/// Re-run generation periodically so the window keeps rolling forward. The
/// first run happens one period after the call; startup generation is the
/// caller's job.
pub fn spawn_refresher(db: DatabaseConnection, settings: RefreshSettings) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + settings.every, settings.every);
        loop {
            ticker.tick().await;
            let window = GenerationWindow::new(Utc::now().date_naive(), settings.window_days);
            if let Err(e) = generate_inventory(&db, window, settings.total_seats).await {
                tracing::error!(error = %e, "Scheduled inventory generation failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::utils::pricing::{WEEKDAY_PRICE_MODIFIER, WEEKEND_PRICE_MODIFIER};

    fn sched(id: i32, day_of_week: Option<i32>) -> schedule::Model {
        schedule::Model {
            id,
            route_id: 1,
            departure_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            day_of_week,
        }
    }

    #[test]
    fn test_window_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        let dates: Vec<_> = GenerationWindow::new(start, 3).dates().collect();

        assert_eq!(
            dates,
            vec![
                (0, start),
                (1, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
                (2, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
            ]
        );
    }

    #[test]
    fn test_plan_respects_day_filter() {
        // Thursday 2025-12-18 .. Wednesday 2025-12-24
        let start = NaiveDate::from_ymd_opt(2025, 12, 18).unwrap();
        let schedules = vec![sched(1, None), sched(2, Some(6))];

        let planned = plan(&schedules, GenerationWindow::new(start, 7));

        assert_eq!(planned.iter().filter(|u| u.schedule_id == 1).count(), 7);
        let saturday_only: Vec<_> = planned.iter().filter(|u| u.schedule_id == 2).collect();
        assert_eq!(saturday_only.len(), 1);
        assert_eq!(saturday_only[0].date, NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
    }

    #[test]
    fn test_plan_marks_only_first_day_for_reconciliation() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 18).unwrap();
        let planned = plan(&[sched(1, None)], GenerationWindow::new(start, 4));

        let reconcile: Vec<_> = planned.iter().map(|u| u.reconcile).collect();
        assert_eq!(reconcile, vec![true, false, false, false]);
    }

    #[test]
    fn test_plan_applies_weekend_modifier() {
        let start = NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(); // Friday
        let planned = plan(&[sched(1, None)], GenerationWindow::new(start, 4));

        let modifiers: Vec<_> = planned.iter().map(|u| u.price_modifier).collect();
        assert_eq!(
            modifiers,
            vec![
                WEEKDAY_PRICE_MODIFIER,
                WEEKEND_PRICE_MODIFIER,
                WEEKEND_PRICE_MODIFIER,
                WEEKDAY_PRICE_MODIFIER,
            ]
        );
    }
}
