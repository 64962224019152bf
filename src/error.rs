//! Errors raised while validating the results table.

use thiserror::Error;

/// Validation failures that stop a run before any aggregation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// A column the aggregation consumes is absent from the header.
    #[error("The input file does not contain the '{column}' column.")]
    MissingColumn { column: &'static str },

    /// Requested experiments that never appear in `experiment_name`.
    #[error("{}", describe_missing(.missing, .available))]
    MissingExperiments {
        missing: Vec<String>,
        available: Vec<String>,
    },
}

fn describe_missing(missing: &[String], available: &[String]) -> String {
    let mut lines = vec![
        "The following experiment configuration(s) were not found in the input file:".to_string(),
    ];
    lines.extend(missing.iter().map(|name| format!("  - {}", name)));
    lines.push(String::new());
    lines.push("Available experiment configurations in the input file:".to_string());
    lines.extend(available.iter().map(|name| format!("  - {}", name)));
    lines.join("\n")
}
