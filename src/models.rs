//! Core data models for the habit cost estimator

use crate::error::HabitError;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Recurrence unit for the purchase frequency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub fn periods_per_year(self) -> u32 {
        match self {
            Period::Day => 365,
            Period::Week => 52,
            Period::Month => 12,
        }
    }

    /// Calendar approximation: a month always counts as 30 days
    pub fn days_in_period(self) -> u32 {
        match self {
            Period::Day => 1,
            Period::Week => 7,
            Period::Month => 30,
        }
    }

    /// Localized phrase used in the analysis prompt
    pub fn prompt_phrase(self) -> &'static str {
        match self {
            Period::Day => "в день",
            Period::Week => "в неделю",
            Period::Month => "в месяц",
        }
    }
}

impl FromStr for Period {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Period::Day),
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            _ => Err(HabitError::MissingPeriod),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        };
        write!(f, "{}", s)
    }
}

/// Time frame of a projection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", content = "target_date", rename_all = "snake_case")]
pub enum Horizon {
    /// One year and five years, no end date
    Annualized,
    /// Up to (not including) a future calendar date
    BoundedByDate(NaiveDate),
}

//
// ================= Habit =================
//

/// A recurring purchase. Price and frequency are always strictly positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseHabit {
    unit_price: BigDecimal,
    frequency: BigDecimal,
    period: Period,
    horizon: Horizon,
}

impl PurchaseHabit {
    pub fn new(
        unit_price: BigDecimal,
        frequency: BigDecimal,
        period: Period,
        horizon: Horizon,
    ) -> Result<Self> {
        if unit_price <= BigDecimal::zero() || frequency <= BigDecimal::zero() {
            return Err(HabitError::InvalidAmount);
        }

        Ok(Self {
            unit_price,
            frequency,
            period,
            horizon,
        })
    }

    pub fn unit_price(&self) -> &BigDecimal {
        &self.unit_price
    }

    pub fn frequency(&self) -> &BigDecimal {
        &self.frequency
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }
}

//
// ================= Projection =================
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub primary_label: String,
    pub primary_total: BigDecimal,
    /// Five-year figure, only present for annualized projections
    pub secondary_total: Option<BigDecimal>,
}

impl ProjectionResult {
    pub const SECONDARY_LABEL: &'static str = "5 years";
}

//
// ================= Analysis =================
//

/// Access token issued by the remote model's auth endpoint
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub value: String,
    /// Expiry as epoch milliseconds
    pub expires_at: i64,
}

impl AccessToken {
    /// Seconds left before the token expires, negative once it has
    pub fn ttl_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now.timestamp_millis()).div_euclid(1000)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Resolved result of one background analysis task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Success {
        task_id: Uuid,
        text: String,
        token_ttl_secs: i64,
    },
    Failure {
        task_id: Uuid,
        message: String,
    },
}

impl AnalysisOutcome {
    pub fn task_id(&self) -> Uuid {
        match self {
            AnalysisOutcome::Success { task_id, .. } => *task_id,
            AnalysisOutcome::Failure { task_id, .. } => *task_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success { .. })
    }
}

/// Decimal literal for tests
#[cfg(test)]
pub(crate) fn amount(text: &str) -> BigDecimal {
    text.parse().expect("decimal literal")
}
