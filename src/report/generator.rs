//! Result table rendering.
//!
//! This module renders the intersection report as CSV, JSON or Markdown
//! and writes it to disk.

use crate::cli::OutputFormat;
use crate::models::{AggregatedRow, IntersectionReport, Metric};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Output columns, in order.
pub const OUTPUT_COLUMNS: [&str; 7] = [
    "domain_name",
    "experiment_name",
    "problem_count",
    "search_elapsed_time",
    "solution_size",
    "expanded_nodes",
    "heuristic_name",
];

/// Render the report in the requested format.
pub fn render_report(report: &IntersectionReport, format: OutputFormat, precision: usize) -> Result<String> {
    match format {
        OutputFormat::Csv => generate_csv_report(report, precision),
        OutputFormat::Json => generate_json_report(report, precision),
        OutputFormat::Markdown => Ok(generate_markdown_report(report, precision)),
    }
}

/// Format a number with a fixed number of decimals.
fn format_number(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

/// Cells of one row, with missing metrics rendered as `missing`.
///
/// `problem_count` is a count and is always written as an integer.
fn row_cells(row: &AggregatedRow, precision: usize, missing: &str) -> Vec<String> {
    let mut cells = vec![
        row.domain_name.clone(),
        row.experiment_name.clone(),
        row.problem_count.to_string(),
    ];
    for metric in Metric::ALL {
        cells.push(match row.metric(metric) {
            Some(value) => format_number(value, precision),
            None => missing.to_string(),
        });
    }
    cells.push(row.heuristic_name.clone());
    cells
}

/// Generate the CSV table. Missing metrics are empty cells.
pub fn generate_csv_report(report: &IntersectionReport, precision: usize) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(OUTPUT_COLUMNS)?;
    for row in report.all_rows() {
        writer.write_record(row_cells(row, precision, ""))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// JSON view of a row with metrics rounded to the output precision.
#[derive(Serialize)]
struct JsonRow<'a> {
    domain_name: &'a str,
    experiment_name: &'a str,
    problem_count: usize,
    search_elapsed_time: Option<f64>,
    solution_size: Option<f64>,
    expanded_nodes: Option<f64>,
    heuristic_name: &'a str,
}

fn round_to(value: f64, precision: usize) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// Generate a JSON array of rows, total row last.
pub fn generate_json_report(report: &IntersectionReport, precision: usize) -> Result<String> {
    let rows: Vec<JsonRow<'_>> = report
        .all_rows()
        .map(|row| {
            let rounded = |metric: Metric| row.metric(metric).map(|v| round_to(v, precision));
            JsonRow {
                domain_name: &row.domain_name,
                experiment_name: &row.experiment_name,
                problem_count: row.problem_count,
                search_elapsed_time: rounded(Metric::SearchElapsedTime),
                solution_size: rounded(Metric::SolutionSize),
                expanded_nodes: rounded(Metric::ExpandedNodes),
                heuristic_name: &row.heuristic_name,
            }
        })
        .collect();

    serde_json::to_string_pretty(&rows).map_err(Into::into)
}

/// Generate a Markdown table. Missing metrics render as `-`.
pub fn generate_markdown_report(report: &IntersectionReport, precision: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("| {} |\n", OUTPUT_COLUMNS.join(" | ")));
    output.push_str(&format!(
        "|{}\n",
        OUTPUT_COLUMNS.iter().map(|_| "---|").collect::<String>()
    ));

    for row in report.all_rows() {
        let cells: Vec<String> = row_cells(row, precision, "-")
            .into_iter()
            .map(|cell| cell.replace('|', "\\|"))
            .collect();
        output.push_str(&format!("| {} |\n", cells.join(" | ")));
    }

    output
}

/// Write rendered content to the output file in one go.
///
/// Content goes to a temporary file next to `path` which is then renamed over
/// it, so a failed write never leaves a truncated output file behind.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("Error writing output file: {}", path.display()))?;
    staged
        .write_all(content.as_bytes())
        .and_then(|_| staged.flush())
        .with_context(|| format!("Error writing output file: {}", path.display()))?;
    staged
        .persist(path)
        .with_context(|| format!("Error writing output file: {}", path.display()))?;

    Ok(())
}
