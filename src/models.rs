//! Data models for the intersection report.
//!
//! This module contains the typed run records read from the results table,
//! the schema describing which columns were present, and the aggregated rows
//! that make up the report.

/// A column consumed from the input results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    DomainName,
    ExperimentName,
    ProblemName,
    SolutionSize,
    ExpandedNodes,
    SearchElapsedTime,
    HeuristicName,
}

impl Column {
    /// Every consumed column.
    pub const ALL: [Column; 7] = [
        Column::DomainName,
        Column::ExperimentName,
        Column::ProblemName,
        Column::SolutionSize,
        Column::ExpandedNodes,
        Column::SearchElapsedTime,
        Column::HeuristicName,
    ];

    /// Header name of the column.
    pub fn name(&self) -> &'static str {
        match self {
            Column::DomainName => "domain_name",
            Column::ExperimentName => "experiment_name",
            Column::ProblemName => "problem_name",
            Column::SolutionSize => "solution_size",
            Column::ExpandedNodes => "expanded_nodes",
            Column::SearchElapsedTime => "search_elapsed_time",
            Column::HeuristicName => "heuristic_name",
        }
    }

    /// Look up a column by its header name.
    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == header)
    }
}

/// Columns present in the input header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    present: Vec<Column>,
}

impl Schema {
    /// Schema with every consumed column present.
    #[cfg(test)]
    pub fn complete() -> Self {
        Self {
            present: Column::ALL.to_vec(),
        }
    }

    /// Schema with only the given columns present.
    pub fn with_columns(columns: &[Column]) -> Self {
        let mut schema = Self::default();
        for column in columns {
            schema.insert(*column);
        }
        schema
    }

    pub fn insert(&mut self, column: Column) {
        if !self.present.contains(&column) {
            self.present.push(column);
        }
    }

    pub fn has(&self, column: Column) -> bool {
        self.present.contains(&column)
    }
}

/// Coerce a raw cell to a number.
///
/// Empty cells, unparsable text and NaN all yield `None`, which fails every
/// comparison in the solved predicate.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// One row of the input results table.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub domain_name: String,
    pub experiment_name: String,
    pub problem_name: String,
    pub solution_size: Option<f64>,
    pub expanded_nodes: Option<f64>,
    pub search_elapsed_time: Option<f64>,
    pub heuristic_name: Option<String>,
}

impl RunRecord {
    /// A run is solved when it produced a plan and expanded more than the root.
    pub fn is_solved(&self) -> bool {
        matches!(self.solution_size, Some(size) if size > 0.0)
            && matches!(self.expanded_nodes, Some(nodes) if nodes > 1.0)
    }
}

/// The loaded results table.
#[derive(Debug, Clone, Default)]
pub struct RunTable {
    /// Which consumed columns the header contained.
    pub schema: Schema,
    /// Rows in file order.
    pub records: Vec<RunRecord>,
}

/// A numeric column averaged in the report, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    SearchElapsedTime,
    SolutionSize,
    ExpandedNodes,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::SearchElapsedTime,
        Metric::SolutionSize,
        Metric::ExpandedNodes,
    ];

    pub fn column(&self) -> Column {
        match self {
            Metric::SearchElapsedTime => Column::SearchElapsedTime,
            Metric::SolutionSize => Column::SolutionSize,
            Metric::ExpandedNodes => Column::ExpandedNodes,
        }
    }

    /// The metric's value on a run record.
    pub fn of_record(&self, record: &RunRecord) -> Option<f64> {
        match self {
            Metric::SearchElapsedTime => record.search_elapsed_time,
            Metric::SolutionSize => record.solution_size,
            Metric::ExpandedNodes => record.expanded_nodes,
        }
    }
}

/// One row of the report: a (domain, experiment) pair, or the total row.
///
/// Metric fields are `None` when the column was absent or had no numeric
/// value among the contributing rows.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub domain_name: String,
    pub experiment_name: String,
    pub problem_count: usize,
    pub search_elapsed_time: Option<f64>,
    pub solution_size: Option<f64>,
    pub expanded_nodes: Option<f64>,
    pub heuristic_name: String,
}

impl AggregatedRow {
    /// A row with every metric missing.
    pub fn new(domain_name: impl Into<String>, experiment_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            experiment_name: experiment_name.into(),
            problem_count: 0,
            search_elapsed_time: None,
            solution_size: None,
            expanded_nodes: None,
            heuristic_name: String::new(),
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::SearchElapsedTime => self.search_elapsed_time,
            Metric::SolutionSize => self.solution_size,
            Metric::ExpandedNodes => self.expanded_nodes,
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::SearchElapsedTime => self.search_elapsed_time = value,
            Metric::SolutionSize => self.solution_size = value,
            Metric::ExpandedNodes => self.expanded_nodes = value,
        }
    }
}

/// The complete report: domain rows followed by the total row.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionReport {
    /// Domain rows, grouped by domain in processing order.
    pub rows: Vec<AggregatedRow>,
    /// The synthetic total row.
    pub total: AggregatedRow,
}

impl IntersectionReport {
    /// Domain rows followed by the total row.
    pub fn all_rows(&self) -> impl Iterator<Item = &AggregatedRow> {
        self.rows.iter().chain(std::iter::once(&self.total))
    }

    /// Number of distinct domains with at least one row.
    pub fn domain_count(&self) -> usize {
        let mut domains: Vec<&str> = self.rows.iter().map(|r| r.domain_name.as_str()).collect();
        domains.dedup();
        domains.len()
    }
}
