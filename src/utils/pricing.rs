use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, AppResult};

pub const WEEKDAY_PRICE_MODIFIER: f64 = 1.0;
pub const WEEKEND_PRICE_MODIFIER: f64 = 1.15;

/// Price multiplier applied to a route's base fare on `date`.
pub fn price_modifier_for(date: NaiveDate) -> f64 {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => WEEKEND_PRICE_MODIFIER,
        _ => WEEKDAY_PRICE_MODIFIER,
    }
}

/// `base_price × modifier`, rounded half-up to whole cents.
pub fn fare(base_price: f64, price_modifier: f64) -> AppResult<Decimal> {
    let base = Decimal::from_f64(base_price)
        .ok_or_else(|| AppError::Internal(format!("Unrepresentable base price {}", base_price)))?;
    let modifier = Decimal::from_f64(price_modifier).ok_or_else(|| {
        AppError::Internal(format!("Unrepresentable price modifier {}", price_modifier))
    })?;

    Ok((base * modifier).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
