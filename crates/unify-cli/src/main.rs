//! unify-csvs CLI
//!
//! Merges delimited files into one CSV over the union of their columns,
//! tagging each row with the file it came from.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use unify_core::pipeline::{DEFAULT_INPUTS, DEFAULT_OUTPUT};
use unify_core::{
    unify, Delimiter, RowPolicy, UnifyConfig, DEFAULT_PROVENANCE_COLUMN, DEFAULT_SUFFIX,
};

#[derive(Parser)]
#[command(name = "unify-csvs")]
#[command(
    about = "Merge CSV files into one output with the union of their columns and a provenance column",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Input CSV files, merged in the order given
    #[arg(short, long, num_args = 1.., default_values_t = DEFAULT_INPUTS.map(String::from))]
    inputs: Vec<String>,

    /// Output CSV path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Do not add the provenance column
    #[arg(long, visible_alias = "no-organograma", alias = "no-origem")]
    no_provenance: bool,

    /// Name of the provenance column
    #[arg(long, default_value = DEFAULT_PROVENANCE_COLUMN)]
    provenance_column: String,

    /// Suffix removed from input file names to build the provenance value
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Input delimiter (',', ';', '|' or 'tab') instead of detecting it per file
    #[arg(short, long, value_parser = parse_delimiter)]
    delimiter: Option<Delimiter>,

    /// Fail on any row whose field count differs from its header
    #[arg(long)]
    strict: bool,

    /// Columns placed first in the output when present (comma-separated)
    #[arg(long, value_delimiter = ',')]
    leading_columns: Vec<String>,

    /// Also write a JSON summary of the run to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> unify_core::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let config = UnifyConfig {
        inputs: cli.inputs.iter().map(|p| absolute(&cwd, Path::new(p))).collect(),
        output: absolute(&cwd, &cli.output),
        suffix: cli.suffix,
        provenance: (!cli.no_provenance).then_some(cli.provenance_column),
        delimiter: cli.delimiter,
        row_policy: if cli.strict {
            RowPolicy::Strict
        } else {
            RowPolicy::Lenient
        },
        leading_columns: cli.leading_columns,
        create_dirs: true,
    };

    let report = unify(&config)?;
    info!(
        rows = report.rows,
        columns = report.columns.len(),
        sources = report.sources.len(),
        "unified inputs"
    );

    if let Some(path) = &cli.report {
        report.save(absolute(&cwd, path))?;
    }

    println!("Merged file written to: {}", report.output.display());

    Ok(())
}

fn parse_delimiter(s: &str) -> Result<Delimiter, String> {
    s.parse().map_err(|e: unify_core::Error| e.to_string())
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
