//! Input validation
//!
//! Turns raw form strings into a `PurchaseHabit`.
//! Nothing invalid ever reaches the projection engine.

use crate::error::HabitError;
use crate::models::{Horizon, Period, PurchaseHabit};
use crate::Result;
use chrono::NaiveDate;
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw user input, exactly as typed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitForm {
    pub price: String,
    pub frequency: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub use_date: bool,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl HabitForm {
    /// Validate the form against `today`
    pub fn validate(&self, today: NaiveDate) -> Result<PurchaseHabit> {
        validate(
            &self.price,
            &self.frequency,
            self.period.as_deref(),
            self.use_date,
            self.until.as_deref(),
            today,
        )
    }

    /// Description with surrounding whitespace removed, `None` when blank
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

pub fn validate(
    price: &str,
    frequency: &str,
    period: Option<&str>,
    use_date: bool,
    until: Option<&str>,
    today: NaiveDate,
) -> Result<PurchaseHabit> {
    let unit_price = parse_amount(price)?;
    let frequency = parse_amount(frequency)?;

    let period = match period.map(str::trim) {
        Some(p) if !p.is_empty() => Period::from_str(p)?,
        _ => return Err(HabitError::MissingPeriod),
    };

    let horizon = match until.map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) if use_date => Horizon::BoundedByDate(parse_target_date(raw, today)?),
        _ => Horizon::Annualized,
    };

    PurchaseHabit::new(unit_price, frequency, period, horizon)
}

/// Parse a strictly positive decimal of any magnitude, accepting `,` as the
/// fractional separator
pub fn parse_amount(raw: &str) -> Result<BigDecimal> {
    let normalized = normalize_decimal(raw);
    if normalized.is_empty() {
        return Err(HabitError::InvalidAmount);
    }

    let value = BigDecimal::from_str(&normalized).map_err(|_| HabitError::InvalidAmount)?;

    if value <= BigDecimal::zero() {
        return Err(HabitError::InvalidAmount);
    }

    Ok(value)
}

fn normalize_decimal(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

/// Parse an ISO date that must lie strictly after `today`
pub fn parse_target_date(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| HabitError::InvalidDate(format!("{}: {}", raw.trim(), e)))?;

    if date <= today {
        return Err(HabitError::DateNotInFuture);
    }

    Ok(date)
}
