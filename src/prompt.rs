//! Analysis prompt construction
//!
//! The closing instruction is part of the contract with the remote model
//! and must stay word for word.

use crate::models::{Horizon, ProjectionResult, PurchaseHabit};
use crate::report::{group_thousands, CURRENCY};

pub const ANALYSIS_INSTRUCTION: &str =
    "Верни ровно 3 плюса, 3 минуса и 3 альтернативы строго по шаблону Markdown.";

/// Build the prompt describing `habit` and its projected cost
pub fn build_prompt(description: &str, habit: &PurchaseHabit, projection: &ProjectionResult) -> String {
    let scope = match habit.horizon() {
        Horizon::Annualized => "в год".to_string(),
        Horizon::BoundedByDate(target) => format!("(до {})", target.format("%Y-%m-%d")),
    };

    format!(
        "Привычка: {}. Цена {} {}, {} раз {}. Суммарный расход: {} {} {}. {}",
        description.trim(),
        habit.unit_price(),
        CURRENCY,
        habit.frequency(),
        habit.period().prompt_phrase(),
        group_thousands(&projection.primary_total, 0, ','),
        CURRENCY,
        scope,
        ANALYSIS_INSTRUCTION
    )
}
