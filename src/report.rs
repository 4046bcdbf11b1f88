//! Presentation helpers: money formatting, summary text and chart data
//!
//! The chart itself is drawn by whoever consumes `ChartBar`s; a plain
//! text renderer is provided for terminals.

use crate::models::ProjectionResult;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

pub const CURRENCY: &str = "₽";

const BAR_GLYPH: char = '█';

/// One bar of the cost chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBar {
    pub label: String,
    pub value: BigDecimal,
    /// Value rounded to whole units, grouped with spaces
    pub annotation: String,
}

/// Everything the presentation layer needs after a calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub summary: String,
    pub bars: Vec<ChartBar>,
}

impl Report {
    pub fn from_projection(projection: &ProjectionResult) -> Self {
        Self {
            summary: summary_text(projection),
            bars: chart_bars(projection),
        }
    }
}

/// Round half-to-even to `dp` places and group thousands with `separator`
pub fn group_thousands(value: &BigDecimal, dp: u32, separator: char) -> String {
    let rounded = value.with_scale_round(i64::from(dp), RoundingMode::HalfEven);
    let (unscaled, _) = rounded.as_bigint_and_exponent();

    let text = unscaled.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };

    // Unscaled digits carry exactly `dp` fractional places
    let dp = dp as usize;
    let digits = format!("{:0>width$}", digits, width = dp + 1);
    let (integer, fraction) = digits.split_at(digits.len() - dp);

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }

    if fraction.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, fraction)
    }
}

/// Two decimal places, space-grouped
pub fn format_money(value: &BigDecimal) -> String {
    group_thousands(value, 2, ' ')
}

pub fn summary_text(projection: &ProjectionResult) -> String {
    match &projection.secondary_total {
        Some(five_years) => format!(
            "You spend {} {} per year\nand {} {} over 5 years.",
            format_money(&projection.primary_total),
            CURRENCY,
            format_money(five_years),
            CURRENCY
        ),
        None => format!(
            "{}: {} {}",
            projection.primary_label,
            format_money(&projection.primary_total),
            CURRENCY
        ),
    }
}

pub fn chart_bars(projection: &ProjectionResult) -> Vec<ChartBar> {
    let mut bars = vec![bar(&projection.primary_label, &projection.primary_total)];
    if let Some(five_years) = &projection.secondary_total {
        bars.push(bar(ProjectionResult::SECONDARY_LABEL, five_years));
    }
    bars
}

fn bar(label: &str, value: &BigDecimal) -> ChartBar {
    ChartBar {
        label: label.to_string(),
        value: value.clone(),
        annotation: group_thousands(value, 0, ' '),
    }
}

/// Horizontal text bars scaled so the largest value spans `width` glyphs
pub fn render_bars(bars: &[ChartBar], width: usize) -> String {
    let zero = BigDecimal::zero();
    let max = bars.iter().map(|b| &b.value).max().unwrap_or(&zero);
    let label_width = bars.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for b in bars {
        let len = if *max > zero {
            (&b.value * BigDecimal::from(width as u64) / max)
                .with_scale_round(0, RoundingMode::HalfEven)
                .to_usize()
                .unwrap_or(width)
                .max(1)
        } else {
            0
        };
        out.push_str(&format!(
            "{:<label_width$} | {} {} {}\n",
            b.label,
            BAR_GLYPH.to_string().repeat(len),
            b.annotation,
            CURRENCY,
            label_width = label_width
        ));
    }
    out
}

/// Text placed on the clipboard: the summary, then the analysis if any
pub fn clipboard_text(summary: &str, analysis: Option<&str>) -> String {
    match analysis.filter(|a| !a.is_empty()) {
        Some(a) => format!("{}\n\n{}", summary, a),
        None => summary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::amount;

    fn annualized() -> ProjectionResult {
        ProjectionResult {
            primary_label: "1 year".to_string(),
            primary_total: amount("23400"),
            secondary_total: Some(amount("117000")),
        }
    }

    fn bounded() -> ProjectionResult {
        ProjectionResult {
            primary_label: "Until 2026-10-28".to_string(),
            primary_total: amount("2000"),
            secondary_total: None,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(format_money(&amount("23400")), "23 400.00");
        assert_eq!(format_money(&amount("1234567.891")), "1 234 567.89");
        assert_eq!(format_money(&amount("999.999")), "1 000.00");
        assert_eq!(format_money(&amount("-1500")), "-1 500.00");
        assert_eq!(group_thousands(&amount("117000"), 0, ','), "117,000");
        assert_eq!(group_thousands(&amount("12.5"), 0, ','), "12");
        assert_eq!(group_thousands(&amount("13.5"), 0, ','), "14");
        assert_eq!(format_money(&amount("0.005")), "0.00");
        assert_eq!(format_money(&amount("0.015")), "0.02");
    }

    #[test]
    fn test_group_thousands_beyond_machine_range() {
        assert_eq!(
            format_money(&amount("3.65e31")),
            "36 500 000 000 000 000 000 000 000 000 000.00"
        );
        assert_eq!(group_thousands(&amount("1e6"), 0, ','), "1,000,000");
    }

    #[test]
    fn test_summary_text() {
        assert_eq!(
            summary_text(&annualized()),
            "You spend 23 400.00 ₽ per year\nand 117 000.00 ₽ over 5 years."
        );
        assert_eq!(summary_text(&bounded()), "Until 2026-10-28: 2 000.00 ₽");
    }

    #[test]
    fn test_chart_bars() {
        let bars = chart_bars(&annualized());
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].label, "5 years");
        assert_eq!(bars[1].annotation, "117 000");

        let bars = chart_bars(&bounded());
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].label, "Until 2026-10-28");
    }

    #[test]
    fn test_render_bars_scales_to_width() {
        let rendered = render_bars(&chart_bars(&annualized()), 10);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches(BAR_GLYPH).count(), 2);
        assert_eq!(lines[1].matches(BAR_GLYPH).count(), 10);
    }

    #[test]
    fn test_clipboard_text() {
        assert_eq!(clipboard_text("sum", None), "sum");
        assert_eq!(clipboard_text("sum", Some("")), "sum");
        assert_eq!(clipboard_text("sum", Some("## Pros")), "sum\n\n## Pros");
    }
}
