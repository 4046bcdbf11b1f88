//! Cost projection engine
//!
//! Pure and deterministic. No I/O, no failure path.
//! All arithmetic stays in `BigDecimal`, so totals are never bounded.

use crate::models::{Horizon, ProjectionResult, PurchaseHabit};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

pub const PRIMARY_ANNUAL_LABEL: &str = "1 year";

const LONG_RUN_YEARS: u32 = 5;

/// Project the cumulative cost of a habit as seen from `today`
pub fn project(habit: &PurchaseHabit, today: NaiveDate) -> ProjectionResult {
    match habit.horizon() {
        Horizon::Annualized => {
            let annual = annual_total(habit);
            let five_years = &annual * BigDecimal::from(LONG_RUN_YEARS);
            ProjectionResult {
                primary_label: PRIMARY_ANNUAL_LABEL.to_string(),
                primary_total: annual,
                secondary_total: Some(five_years),
            }
        }
        Horizon::BoundedByDate(target) => {
            let days_remaining = (target - today).num_days();
            ProjectionResult {
                primary_label: format!("Until {}", target.format("%Y-%m-%d")),
                primary_total: bounded_total(habit, days_remaining),
                secondary_total: None,
            }
        }
    }
}

fn annual_total(habit: &PurchaseHabit) -> BigDecimal {
    habit.unit_price() * habit.frequency() * BigDecimal::from(habit.period().periods_per_year())
}

/// `unit_price * (days / days_in_period) * frequency`, dividing last
fn bounded_total(habit: &PurchaseHabit, days_remaining: i64) -> BigDecimal {
    let days_in_period = BigDecimal::from(habit.period().days_in_period());

    habit.unit_price() * habit.frequency() * BigDecimal::from(days_remaining) / days_in_period
}
