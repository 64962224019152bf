//! common-solved - cross-experiment comparison over commonly solved problems
//!
//! Reads a planning-benchmark results table, intersects the problems solved
//! by every selected experiment within each domain, and writes averaged
//! metrics over that common set plus a total row.
//!
//! Exit codes:
//!   0 - Success (including when no domain has common solved problems)
//!   1 - Error (arguments, config, input, missing columns or experiments, output)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod table;

use analysis::AggregateOptions;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("common-solved v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .common-solved.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the load, aggregate, render and write pipeline. Returns the exit code.
fn run(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();
    let quiet = args.quiet;

    let experiments = args.experiment_names();
    info!("Comparing experiments: {:?}", experiments);

    // Step 1: Load the results table
    if !quiet {
        println!("📥 Reading results: {}", args.input_path().display());
    }
    let table = table::load_table(args.input_path())?;
    info!("Loaded {} run records", table.records.len());

    // Step 2: Intersect and aggregate
    let options = AggregateOptions::from(&config.aggregation);
    let report = match analysis::compute_intersection(&table, &experiments, &options)? {
        Some(report) => report,
        None => {
            println!("No domains with common solved problems were found for the specified experiments.");
            return Ok(0);
        }
    };

    // Step 3: Render and write once
    let output = report::render_report(&report, config.output.format, config.output.precision)?;
    report::write_report(&output, args.output_path())?;

    if !quiet {
        println!("\n📊 Intersection Summary:");
        println!("   Experiments: {}", experiments.len());
        println!("   Domains with common solved problems: {}", report.domain_count());
        println!("   Common solved problems: {}", report.total.problem_count);
        println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Aggregated results written to {}",
            args.output_path().display()
        );
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            eprintln!("⚠️  Ignoring {}: {:#}", DEFAULT_CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
