//! Habit Cost Estimator
//!
//! Estimates what a recurring small purchase costs over time and optionally
//! asks GigaChat for a pros/cons analysis of the habit.
//!
//! FLOW:
//! INPUT → VALIDATE → PROJECT → REPORT → (DISPATCH → CHANNEL → POLL → PRESENT)
//!
//! The projection is pure decimal arithmetic. The analysis call runs on a
//! worker runtime and hands its single outcome back through a channel that
//! the interactive side polls.

pub mod analysis;
pub mod api;
pub mod calculator;
pub mod config;
pub mod error;
pub mod gigachat;
pub mod models;
pub mod projection;
pub mod prompt;
pub mod report;
pub mod validation;

pub use error::{HabitError, Result};

// Re-export common types
pub use models::*;
pub use calculator::{AnalysisStatus, Calculation, HabitCalculator};
