//! Common-solved-set aggregation.
//!
//! For every domain, the problems solved by all requested experiments form the
//! common set. Each experiment's metrics are then averaged over exactly those
//! problems, and a total row summarises the domain rows.

use crate::config::AggregationConfig;
use crate::error::AggregateError;
use crate::models::{
    AggregatedRow, Column, IntersectionReport, Metric, RunRecord, RunTable, Schema,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Columns that must be present once the experiment names are known to exist.
const REQUIRED_COLUMNS: [Column; 4] = [
    Column::DomainName,
    Column::ProblemName,
    Column::SolutionSize,
    Column::ExpandedNodes,
];

/// Options controlling domain order and the total row.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Process domains in lexicographic order instead of first-seen order.
    pub sort_domains: bool,
    /// `domain_name` of the total row.
    pub total_label: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            sort_domains: false,
            total_label: "Total".to_string(),
        }
    }
}

impl From<&AggregationConfig> for AggregateOptions {
    fn from(config: &AggregationConfig) -> Self {
        Self {
            sort_domains: config.sort_domains,
            total_label: config.total_label.clone(),
        }
    }
}

/// Check the schema and the requested experiment names.
pub fn validate(table: &RunTable, experiments: &[String]) -> Result<(), AggregateError> {
    if !table.schema.has(Column::ExperimentName) {
        return Err(AggregateError::MissingColumn {
            column: Column::ExperimentName.name(),
        });
    }

    let available = table.experiment_names();
    let mut missing: Vec<String> = Vec::new();
    for name in experiments {
        if available.binary_search(name).is_err() && !missing.contains(name) {
            missing.push(name.clone());
        }
    }
    if !missing.is_empty() {
        return Err(AggregateError::MissingExperiments { missing, available });
    }

    if let Some(column) = REQUIRED_COLUMNS.iter().find(|c| !table.schema.has(**c)) {
        return Err(AggregateError::MissingColumn {
            column: column.name(),
        });
    }

    Ok(())
}

/// Distinct names of the problems solved among `records`.
pub fn solved_problems<'a, I>(records: I) -> BTreeSet<&'a str>
where
    I: IntoIterator<Item = &'a RunRecord>,
{
    records
        .into_iter()
        .filter(|r| r.is_solved())
        .map(|r| r.problem_name.as_str())
        .collect()
}

/// Problems solved by every experiment within one domain's records.
///
/// No experiments means no common problems.
pub fn common_solved<'a>(domain_records: &[&'a RunRecord], experiments: &[String]) -> BTreeSet<&'a str> {
    let domain = domain_records.first().map(|r| r.domain_name.as_str()).unwrap_or("");
    let mut common: Option<BTreeSet<&'a str>> = None;

    for experiment in experiments {
        let solved = solved_problems(
            domain_records
                .iter()
                .copied()
                .filter(|r| &r.experiment_name == experiment),
        );
        debug!("{} {}: solved {:?}", experiment, domain, solved);

        common = Some(match common {
            None => solved,
            Some(acc) => acc.intersection(&solved).copied().collect(),
        });
    }

    common.unwrap_or_default()
}

/// Mean of the defined values, or `None` if there are none.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Distinct heuristic names in first-seen order, joined with `;`.
pub fn join_heuristics<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen: Vec<&str> = Vec::new();
    for name in names.into_iter().flatten() {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen.join(";")
}

/// Aggregate one experiment's contributing records into a report row.
pub fn aggregate_row(
    schema: &Schema,
    domain: &str,
    experiment: &str,
    problem_count: usize,
    records: &[&RunRecord],
) -> AggregatedRow {
    let mut row = AggregatedRow::new(domain, experiment);
    row.problem_count = problem_count;

    for metric in Metric::ALL {
        let value = if schema.has(metric.column()) {
            mean(records.iter().map(|r| metric.of_record(r)))
        } else {
            None
        };
        row.set_metric(metric, value);
    }

    if schema.has(Column::HeuristicName) {
        row.heuristic_name = join_heuristics(records.iter().map(|r| r.heuristic_name.as_deref()));
    }

    row
}

/// Build the total row from the domain rows.
///
/// Metrics are the unweighted mean of the domain rows' means; a domain with few
/// problems weighs as much as a large one.
pub fn total_row(rows: &[AggregatedRow], label: &str) -> AggregatedRow {
    let mut total = AggregatedRow::new(label, "");
    total.problem_count = rows.iter().map(|r| r.problem_count).sum();

    for metric in Metric::ALL {
        total.set_metric(metric, mean(rows.iter().map(|r| r.metric(metric))));
    }

    total
}

/// Domains in processing order.
fn domain_order<'a>(records: &[&'a RunRecord], sort: bool) -> Vec<&'a str> {
    let mut domains: Vec<&str> = Vec::new();
    for record in records {
        let domain = record.domain_name.as_str();
        if !domain.is_empty() && !domains.contains(&domain) {
            domains.push(domain);
        }
    }
    if sort {
        domains.sort_unstable();
    }
    domains
}

/// Compute the intersection report.
///
/// Returns `Ok(None)` when no domain has a problem solved by every experiment.
pub fn compute_intersection(
    table: &RunTable,
    experiments: &[String],
    options: &AggregateOptions,
) -> Result<Option<IntersectionReport>, AggregateError> {
    validate(table, experiments)?;

    let selected: Vec<&RunRecord> = table
        .records
        .iter()
        .filter(|r| experiments.contains(&r.experiment_name))
        .collect();

    let skipped = selected.iter().filter(|r| r.domain_name.is_empty()).count();
    if skipped > 0 {
        debug!("Ignoring {} records without a domain_name", skipped);
    }

    let mut rows: Vec<AggregatedRow> = Vec::new();

    for domain in domain_order(&selected, options.sort_domains) {
        let domain_records: Vec<&RunRecord> = selected
            .iter()
            .copied()
            .filter(|r| r.domain_name == domain)
            .collect();

        let common = common_solved(&domain_records, experiments);
        if common.is_empty() {
            debug!("Skipping domain {}: no common solved problems", domain);
            continue;
        }
        info!("Domain {}: {} common solved problems", domain, common.len());

        for experiment in experiments {
            let contributing: Vec<&RunRecord> = domain_records
                .iter()
                .copied()
                .filter(|r| &r.experiment_name == experiment)
                .filter(|r| r.is_solved() && common.contains(r.problem_name.as_str()))
                .collect();

            if contributing.is_empty() {
                continue;
            }

            rows.push(aggregate_row(
                &table.schema,
                domain,
                experiment,
                common.len(),
                &contributing,
            ));
        }
    }

    if rows.is_empty() {
        return Ok(None);
    }

    let total = total_row(&rows, &options.total_label);
    Ok(Some(IntersectionReport { rows, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(domain: &str, experiment: &str, problem: &str, size: f64, nodes: f64, time: f64) -> RunRecord {
        RunRecord {
            domain_name: domain.to_string(),
            experiment_name: experiment.to_string(),
            problem_name: problem.to_string(),
            solution_size: Some(size),
            expanded_nodes: Some(nodes),
            search_elapsed_time: Some(time),
            heuristic_name: Some(format!("h-{}", experiment)),
        }
    }

    fn table(records: Vec<RunRecord>) -> RunTable {
        RunTable {
            schema: Schema::complete(),
            records,
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn two_experiment_table() -> RunTable {
        table(vec![
            run("D1", "E1", "p1", 10.0, 100.0, 1.0),
            run("D1", "E1", "p2", 20.0, 200.0, 2.0),
            run("D1", "E2", "p2", 30.0, 300.0, 3.0),
            run("D1", "E2", "p3", 40.0, 400.0, 4.0),
        ])
    }

    #[test]
    fn test_common_set_scenario() {
        let table = two_experiment_table();
        let report = compute_intersection(&table, &names(&["E1", "E2"]), &AggregateOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].experiment_name, "E1");
        assert_eq!(report.rows[0].problem_count, 1);
        assert_eq!(report.rows[0].solution_size, Some(20.0));
        assert_eq!(report.rows[0].expanded_nodes, Some(200.0));
        assert_eq!(report.rows[1].experiment_name, "E2");
        assert_eq!(report.rows[1].solution_size, Some(30.0));
        assert_eq!(report.rows[1].heuristic_name, "h-E2");
    }

    #[test]
    fn test_total_row_is_mean_of_means() {
        // D1 averages two problems for E1, D2 one; the total ignores row counts.
        let table = table(vec![
            run("D1", "E1", "p1", 10.0, 100.0, 1.0),
            run("D1", "E1", "p2", 30.0, 100.0, 3.0),
            run("D2", "E1", "q1", 100.0, 100.0, 10.0),
        ]);
        let report = compute_intersection(&table, &names(&["E1"]), &AggregateOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(report.rows[0].solution_size, Some(20.0));
        assert_eq!(report.rows[1].solution_size, Some(100.0));
        assert_eq!(report.total.domain_name, "Total");
        assert_eq!(report.total.experiment_name, "");
        assert_eq!(report.total.problem_count, 3);
        assert_eq!(report.total.solution_size, Some(60.0));
        assert_eq!(report.total.search_elapsed_time, Some(6.0));
        assert_eq!(report.total.heuristic_name, "");
    }

    #[test]
    fn test_domain_with_unsolving_experiment_is_skipped() {
        let mut records = two_experiment_table().records;
        records.push(run("D2", "E1", "q1", 5.0, 50.0, 1.0));
        records.push(run("D2", "E2", "q1", 0.0, 50.0, 1.0));
        let report = compute_intersection(&table(records), &names(&["E1", "E2"]), &AggregateOptions::default())
            .unwrap()
            .unwrap();

        assert!(report.rows.iter().all(|r| r.domain_name == "D1"));
        assert_eq!(report.total.problem_count, 2);
    }

    #[test]
    fn test_no_common_problems_yields_none() {
        let table = table(vec![
            run("D1", "E1", "p1", 10.0, 100.0, 1.0),
            run("D1", "E2", "p2", 10.0, 100.0, 1.0),
        ]);
        let result = compute_intersection(&table, &names(&["E1", "E2"]), &AggregateOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_empty_experiment_list_yields_none() {
        let result = compute_intersection(&two_experiment_table(), &[], &AggregateOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_non_numeric_solution_size_is_unsolved() {
        let mut bad = run("D1", "E1", "p1", 10.0, 100.0, 1.0);
        bad.solution_size = crate::models::coerce_numeric("abc");
        let records = [bad];
        assert!(solved_problems(records.iter()).is_empty());
    }

    #[test]
    fn test_duplicate_rows_count_once() {
        let table = table(vec![
            run("D1", "E1", "p1", 10.0, 100.0, 1.0),
            run("D1", "E1", "p1", 20.0, 100.0, 3.0),
        ]);
        let report = compute_intersection(&table, &names(&["E1", "E1"]), &AggregateOptions::default())
            .unwrap()
            .unwrap();

        // The duplicate request re-emits the row; both rows see the same common set.
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].problem_count, 1);
        assert_eq!(report.rows[0].solution_size, Some(15.0));
    }

    #[test]
    fn test_missing_experiment_error() {
        let err = compute_intersection(
            &two_experiment_table(),
            &names(&["E1", "ghost", "ghost"]),
            &AggregateOptions::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            AggregateError::MissingExperiments {
                missing: names(&["ghost"]),
                available: names(&["E1", "E2"]),
            }
        );
    }

    #[test]
    fn test_missing_experiment_column() {
        let mut table = two_experiment_table();
        table.schema = Schema::with_columns(&[Column::DomainName, Column::ProblemName]);
        let err = validate(&table, &names(&["E1"])).unwrap_err();
        assert_eq!(
            err,
            AggregateError::MissingColumn {
                column: "experiment_name"
            }
        );
    }

    #[test]
    fn test_missing_required_column() {
        let mut table = two_experiment_table();
        table.schema = Schema::with_columns(&[
            Column::DomainName,
            Column::ExperimentName,
            Column::ProblemName,
            Column::SolutionSize,
        ]);
        let err = validate(&table, &names(&["E1"])).unwrap_err();
        assert_eq!(
            err,
            AggregateError::MissingColumn {
                column: "expanded_nodes"
            }
        );
    }

    #[test]
    fn test_absent_optional_columns() {
        let mut table = two_experiment_table();
        table.schema = Schema::with_columns(&[
            Column::DomainName,
            Column::ExperimentName,
            Column::ProblemName,
            Column::SolutionSize,
            Column::ExpandedNodes,
        ]);
        let report = compute_intersection(&table, &names(&["E1"]), &AggregateOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(report.rows[0].search_elapsed_time, None);
        assert_eq!(report.rows[0].heuristic_name, "");
        assert_eq!(report.total.search_elapsed_time, None);
    }

    #[test]
    fn test_domain_order() {
        let table = table(vec![
            run("zeno", "E1", "p1", 1.0, 2.0, 1.0),
            run("blocks", "E1", "p1", 1.0, 2.0, 1.0),
        ]);
        let experiments = names(&["E1"]);

        let first_seen = compute_intersection(&table, &experiments, &AggregateOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(first_seen.rows[0].domain_name, "zeno");

        let options = AggregateOptions {
            sort_domains: true,
            ..AggregateOptions::default()
        };
        let sorted = compute_intersection(&table, &experiments, &options).unwrap().unwrap();
        assert_eq!(sorted.rows[0].domain_name, "blocks");
    }

    #[test]
    fn test_join_heuristics_first_seen() {
        let joined = join_heuristics([Some("ff"), None, Some("lmcut"), Some("ff")]);
        assert_eq!(joined, "ff;lmcut");
    }

    #[test]
    fn test_mean_skips_missing() {
        assert_eq!(mean([Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean([None, None]), None);
    }

    #[test]
    fn test_problem_count_matches_intersection() {
        let table = table(vec![
            run("D1", "E1", "p1", 1.0, 2.0, 1.0),
            run("D1", "E1", "p2", 1.0, 2.0, 1.0),
            run("D1", "E1", "p3", 1.0, 2.0, 1.0),
            run("D1", "E2", "p1", 1.0, 2.0, 1.0),
            run("D1", "E2", "p3", 1.0, 2.0, 1.0),
            run("D1", "E3", "p1", 1.0, 2.0, 1.0),
            run("D1", "E3", "p2", 1.0, 2.0, 1.0),
            run("D1", "E3", "p3", 1.0, 2.0, 1.0),
        ]);
        let records: Vec<&RunRecord> = table.records.iter().collect();
        let common = common_solved(&records, &names(&["E1", "E2", "E3"]));
        assert_eq!(common.into_iter().collect::<Vec<_>>(), vec!["p1", "p3"]);

        let report = compute_intersection(&table, &names(&["E1", "E2", "E3"]), &AggregateOptions::default())
            .unwrap()
            .unwrap();
        assert!(report.rows.iter().all(|r| r.problem_count == 2));
        assert_eq!(report.total.problem_count, 6);
    }
}
