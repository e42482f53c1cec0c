//! Command-line entrypoint: load puzzle(s), run the solver, report metrics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use prettytable::{Cell, Row, Table};
use tracing::{error, warn};

use zebra_csp::error::Result;
use zebra_csp::grid::{format_solution, Grid};
use zebra_csp::loader::load_puzzles;
use zebra_csp::puzzle::{GridTemplate, PuzzleRecord};
use zebra_csp::trace::{global_tracer, reset_tracer};

const INPUT_EXTENSIONS: &[&str] = &["json", "jsonl", "parquet", "csv"];

#[derive(Debug, Parser)]
#[command(
    name = "zebra-csp",
    about = "Solve Zebra-style logic grid puzzles as constraint satisfaction problems"
)]
struct Cli {
    /// Path to a puzzle file or a directory of puzzle files.
    input: PathBuf,

    /// Optional path to write the result CSV (`id, grid_solution, steps`).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Optional sample submission CSV used to align output header/shape per id.
    #[arg(long)]
    sample_submission: Option<PathBuf>,

    /// Include a `status` field in grid_solution (debug only).
    #[arg(long)]
    include_status: bool,

    /// Optional directory for per-puzzle solver trace CSVs.
    #[arg(long)]
    trace_dir: Option<PathBuf>,

    /// Which tracer counter to report as `steps`.
    #[arg(long, value_enum, default_value = "assignments")]
    steps_metric: StepsMetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StepsMetric {
    /// Assignments made during search; excludes bookkeeping events.
    Assignments,
    /// Every trace event.
    Total,
}

struct PuzzleResult {
    id: String,
    grid: Grid,
    steps: i64,
}

fn collect_puzzles(input: &Path) -> Result<Vec<PuzzleRecord>> {
    if input.is_file() {
        return load_puzzles(input);
    }
    if !input.is_dir() {
        return Err(zebra_csp::Error::input(format!(
            "input path {} is neither file nor directory",
            input.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(input)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| INPUT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();

    let mut puzzles = Vec::new();
    for path in paths {
        match load_puzzles(&path) {
            Ok(records) => puzzles.extend(records),
            Err(err) => warn!(path = %path.display(), %err, "skipping unreadable puzzle file"),
        }
    }
    Ok(puzzles)
}

/// Per-id grid templates from a sample submission CSV. Rows with missing or
/// unparseable `grid_solution` cells are skipped.
fn load_sample_templates(path: &Path) -> Result<HashMap<String, GridTemplate>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_at = headers.iter().position(|h| h == "id");
    let grid_at = headers.iter().position(|h| h == "grid_solution");
    let (Some(id_at), Some(grid_at)) = (id_at, grid_at) else {
        return Ok(HashMap::new());
    };

    let mut templates = HashMap::new();
    for row in reader.records() {
        let row = row?;
        let (Some(id), Some(raw)) = (row.get(id_at), row.get(grid_at)) else {
            continue;
        };
        let raw = raw.trim();
        if id.is_empty() || raw.is_empty() || raw.eq_ignore_ascii_case("null") {
            continue;
        }
        let Ok(template) = serde_json::from_str::<GridTemplate>(raw) else {
            continue;
        };
        if !template.header.is_empty() && !template.rows.is_empty() {
            templates.insert(id.to_string(), template);
        }
    }
    Ok(templates)
}

fn solve_one(
    record: &PuzzleRecord,
    templates: &HashMap<String, GridTemplate>,
    cli: &Cli,
) -> PuzzleResult {
    reset_tracer();
    let id = record.id_or_unknown().to_string();

    match zebra_csp::solve_puzzle(record) {
        Ok(solution) => {
            let grid = format_solution(
                &solution,
                Some(record),
                templates.get(&id),
                cli.include_status,
            );
            if let Some(dir) = &cli.trace_dir {
                let path = dir.join(format!("{id}_trace.csv"));
                if let Err(err) = global_tracer().to_csv(&path) {
                    warn!(path = %path.display(), %err, "failed to write trace");
                }
            }
            let summary = global_tracer().summary();
            let steps = match cli.steps_metric {
                // Assignments approximate search effort without counting
                // bookkeeping events.
                StepsMetric::Assignments => summary.num_assignments,
                StepsMetric::Total => summary.total_steps,
            };
            PuzzleResult {
                id,
                grid,
                steps: steps as i64,
            }
        }
        Err(err) => {
            error!(puzzle = %id, %err, "failed to solve puzzle");
            PuzzleResult {
                id,
                grid: Grid::default(),
                steps: -1,
            }
        }
    }
}

fn write_results_csv(results: &[PuzzleResult], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "grid_solution", "steps"])?;
    for result in results {
        writer.write_record([
            result.id.clone(),
            serde_json::to_string(&result.grid)?,
            result.steps.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_results(results: &[PuzzleResult]) {
    for result in results {
        println!("{} (steps: {})", result.id, result.steps);
        if result.grid.rows.is_empty() {
            println!("  no solution");
            continue;
        }
        let mut table = Table::new();
        table.add_row(Row::new(
            result.grid.header.iter().map(|h| Cell::new(h)).collect(),
        ));
        for row in &result.grid.rows {
            table.add_row(Row::new(row.iter().map(|c| Cell::new(c)).collect()));
        }
        table.printstd();
    }
}

fn run(cli: &Cli) -> Result<()> {
    let templates = match &cli.sample_submission {
        Some(path) => load_sample_templates(path)?,
        None => HashMap::new(),
    };

    let puzzles = collect_puzzles(&cli.input)?;
    if puzzles.is_empty() {
        warn!(input = %cli.input.display(), "no puzzles loaded");
    }

    let results: Vec<PuzzleResult> = puzzles
        .iter()
        .map(|record| solve_one(record, &templates, cli))
        .collect();

    match &cli.output {
        Some(path) => write_results_csv(&results, path)?,
        None => print_results(&results),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "fatal error");
            ExitCode::FAILURE
        }
    }
}
