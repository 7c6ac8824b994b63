//! Report generation.
//!
//! This module renders an aggregation result as a plain-text summary or
//! as a JSON document.

use crate::models::{AggregationResult, MonthlyAggregate, RunStatus, Scalar};
use anyhow::Result;

/// Shown while a run is still in progress.
pub const LOADING_MESSAGE: &str = "Loading...";

/// Shown in place of the monthly table when there is nothing to plot.
pub const EMPTY_SERIES_MESSAGE: &str = "No data available for the chart.";

/// Generate the plain-text summary.
pub fn generate_text_report(result: &AggregationResult, decimals: usize) -> String {
    if result.status == RunStatus::Loading {
        return format!("{}\n", LOADING_MESSAGE);
    }

    let mut output = String::new();

    if result.status == RunStatus::Error {
        output.push_str("Session history could not be read; monthly series omitted.\n\n");
    }

    output.push_str(&generate_performance_section(
        &result.global_scalars.performance_global,
        decimals,
    ));
    output.push_str(&generate_monthly_section(&result.monthly_series, decimals));
    output.push_str(&generate_skills_section(result, decimals));

    output
}

fn generate_performance_section(performance: &Scalar, decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("Global Performance\n");
    section.push_str(&format!(
        "  Overall result from assessments and performance tests: {}\n\n",
        percent(performance, decimals)
    ));

    section
}

fn generate_monthly_section(series: &[MonthlyAggregate], decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("Assessment by Month\n");

    if series.is_empty() {
        section.push_str(&format!("  {}\n\n", EMPTY_SERIES_MESSAGE));
        return section;
    }

    let width = series
        .iter()
        .map(|m| m.month.chars().count())
        .max()
        .unwrap_or(0)
        .max("Month".len());

    section.push_str(&format!(
        "  {:<width$}  {:>10}  {:>10}  {:>10}\n",
        "Month",
        "Stress",
        "Focus",
        "Control",
        width = width
    ));

    for month in series {
        section.push_str(&format!(
            "  {:<width$}  {:>10.prec$}  {:>10.prec$}  {:>10.prec$}\n",
            month.month,
            month.stress_mean,
            month.focus_mean,
            month.control_mean,
            width = width,
            prec = decimals
        ));
    }
    section.push('\n');

    section
}

fn generate_skills_section(result: &AggregationResult, decimals: usize) -> String {
    let scalars = &result.global_scalars;
    let mut section = String::new();

    section.push_str("Skill Summary\n");
    section.push_str(&format!(
        "  Stress Management: {}\n",
        percent(&scalars.stress_value, decimals)
    ));
    section.push_str(&format!(
        "  Focus: {}\n",
        percent(&scalars.focus_value, decimals)
    ));
    section.push_str(&format!(
        "  Impulse Control: {}\n",
        percent(&scalars.control_value, decimals)
    ));

    section
}

fn percent(value: &Scalar, decimals: usize) -> String {
    if value.is_available() {
        format!("{}%", value.display(decimals))
    } else {
        value.display(decimals)
    }
}

/// Generate a JSON report. Unavailable values are `null`.
pub fn generate_json_report(result: &AggregationResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(Into::into)
}
