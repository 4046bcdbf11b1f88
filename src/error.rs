//! Error types for the habit cost estimator

use thiserror::Error;

/// Result type alias for estimator operations
pub type Result<T> = std::result::Result<T, HabitError>;

#[derive(Error, Debug)]
pub enum HabitError {

    // =============================
    // Input Validation Errors
    // =============================

    #[error("Enter a valid price and frequency")]
    InvalidAmount,

    #[error("Select a purchase period")]
    MissingPeriod,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("The date must be in the future")]
    DateNotInFuture,

    // =============================
    // Analysis Pipeline Errors
    // =============================

    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),

    #[error("An analysis request is already in progress")]
    AnalysisInFlight,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HabitError {
    /// True for errors caused by user input rather than the environment
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HabitError::InvalidAmount
                | HabitError::MissingPeriod
                | HabitError::InvalidDate(_)
                | HabitError::DateNotInFuture
        )
    }
}
