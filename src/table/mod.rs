//! Results table loading.
//!
//! This module reads a CSV results table into typed run records. Only the
//! columns the aggregation consumes are extracted; the rest are ignored.

use crate::models::{coerce_numeric, Column, RunRecord, RunTable, Schema};
use anyhow::{Context, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Load a results table from a CSV file.
pub fn load_table(path: &Path) -> Result<RunTable> {
    let file = File::open(path)
        .with_context(|| format!("Error reading input file: {}", path.display()))?;

    RunTable::from_reader(file)
        .with_context(|| format!("Error reading input file: {}", path.display()))
}

impl RunTable {
    /// Parse a results table from any CSV source.
    ///
    /// Rows shorter than the header are accepted; their trailing cells read as
    /// empty. Rows longer than the header are rejected, since every cell after
    /// the extra one would land in the wrong column.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers().context("Failed to read CSV header")?;
        let header_len = headers.len();

        let mut positions: HashMap<Column, usize> = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header.trim()) {
                positions.entry(column).or_insert(index);
            }
        }

        let present: Vec<Column> = Column::ALL
            .into_iter()
            .filter(|c| positions.contains_key(c))
            .collect();
        let schema = Schema::with_columns(&present);
        debug!("Consumed columns present: {:?}", present);

        let mut records = Vec::new();
        for (line, row) in csv_reader.records().enumerate() {
            // Header is line 1.
            let row = row.with_context(|| format!("Malformed CSV record at line {}", line + 2))?;
            if row.len() > header_len {
                anyhow::bail!(
                    "Malformed CSV record at line {}: expected at most {} fields, found {}",
                    line + 2,
                    header_len,
                    row.len()
                );
            }
            let cell = |column: Column| cell_at(&row, &positions, column);

            let heuristic = cell(Column::HeuristicName);
            records.push(RunRecord {
                domain_name: cell(Column::DomainName).to_string(),
                experiment_name: cell(Column::ExperimentName).to_string(),
                problem_name: cell(Column::ProblemName).to_string(),
                solution_size: coerce_numeric(cell(Column::SolutionSize)),
                expanded_nodes: coerce_numeric(cell(Column::ExpandedNodes)),
                search_elapsed_time: coerce_numeric(cell(Column::SearchElapsedTime)),
                heuristic_name: (!heuristic.is_empty()).then(|| heuristic.to_string()),
            });
        }

        debug!("Parsed {} run records", records.len());
        Ok(Self { schema, records })
    }

    /// Distinct non-empty experiment names, sorted.
    pub fn experiment_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .filter(|r| !r.experiment_name.is_empty())
            .map(|r| r.experiment_name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn cell_at<'r>(row: &'r StringRecord, positions: &HashMap<Column, usize>, column: Column) -> &'r str {
    positions
        .get(&column)
        .and_then(|&index| row.get(index))
        .unwrap_or("")
}
