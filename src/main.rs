//! Shift rostering driver.
//!
//! Assembles the input, builds the constraint model for the requested
//! horizon and optionally pins a seed grid. The finite-domain engine is an
//! external collaborator wired in through `solver::SolverBackend`; without
//! one linked, the binary can still verify and re-render an externally
//! solved grid (`--solution`), or it reports the built model and exits with
//! the UNKNOWN status code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info, warn};

use shift_rostering::builder::{build_model, BuildOptions};
use shift_rostering::driver;
use shift_rostering::input_data::{add_virtual_employees, create_input, ModelInput};
use shift_rostering::objective::ObjectiveProfile;
use shift_rostering::report;
use shift_rostering::rules::absence::{AbsencePlan, BlockSpec};
use shift_rostering::seed;
use shift_rostering::solution::RosterSolution;
use shift_rostering::solver::{SolveParameters, SolverStatus};
use shift_rostering::universe::parse_key;
use shift_rostering::verify::verify_solution;

#[derive(Parser, Debug)]
#[command(
    name = "shift-rostering",
    about = "Builds preference-optimized cyclic shift rosters",
    version
)]
struct Cli {
    /// Visible planning horizon in whole weeks.
    #[arg(long, default_value_t = 4)]
    weeks: usize,

    /// Seed grid (CSV) whose decisions are pinned true.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Shift name treated as the night shift.
    #[arg(long, default_value = "N")]
    night_shift: String,

    /// Soft-objective profile (roster|staffing).
    #[arg(long, default_value = "roster")]
    profile: ObjectiveProfile,

    /// Engine wall-clock budget in seconds.
    #[arg(long, default_value_t = 120)]
    max_time_secs: u64,

    /// Engine search workers.
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Disable the M->A->N weekly rotation.
    #[arg(long)]
    no_shift_cycle: bool,

    /// Vacation quota as INTERVALSxLENGTH, e.g. 1x6.
    #[arg(long)]
    vacation: Option<String>,

    /// Illness quota as INTERVALSxLENGTH, e.g. 1x2.
    #[arg(long)]
    illness: Option<String>,

    /// Open-skill employees appended per team for staffing analysis.
    #[arg(long, default_value_t = 0)]
    virtual_employees: usize,

    /// Verify and re-render an externally solved grid instead of solving.
    #[arg(long)]
    solution: Option<PathBuf>,

    /// Write the reported roster as a styled workbook.
    #[arg(long)]
    xlsx_out: Option<PathBuf>,

    /// Write the reported roster as a round-trippable grid.
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Write the reported roster as JSON.
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Monday of week one, used for workbook headers.
    #[arg(long)]
    start_date: Option<NaiveDate>,
}

fn parse_blocks(text: &str) -> anyhow::Result<BlockSpec> {
    let (intervals, length) = text
        .split_once('x')
        .context("expected INTERVALSxLENGTH, e.g. 1x6")?;
    Ok(BlockSpec {
        intervals: intervals.trim().parse()?,
        length: length.trim().parse()?,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(status) => {
            info!(%status, "finished");
            ExitCode::from(driver::exit_code(status))
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<SolverStatus> {
    let mut input = create_input(cli.weeks)?;
    if cli.virtual_employees > 0 {
        add_virtual_employees(&mut input, cli.virtual_employees);
        input.validate()?;
    }

    let mut options = BuildOptions {
        night_shift: cli.night_shift.clone(),
        profile: cli.profile,
        ..BuildOptions::default()
    };
    if cli.no_shift_cycle {
        options.shift_cycle = None;
    }
    if cli.vacation.is_some() || cli.illness.is_some() {
        let none = BlockSpec {
            intervals: 0,
            length: 0,
        };
        options.absence = Some(AbsencePlan {
            vacation: cli
                .vacation
                .as_deref()
                .map(parse_blocks)
                .transpose()?
                .unwrap_or(none),
            illness: cli
                .illness
                .as_deref()
                .map(parse_blocks)
                .transpose()?
                .unwrap_or(none),
        });
    }
    if let Some(path) = &cli.seed {
        options.seed_keys = seed::read_seed_grid(path)
            .with_context(|| format!("reading seed grid {}", path.display()))?;
        info!(keys = options.seed_keys.len(), "seed loaded");
    }

    let built = build_model(&input, &options)?;

    if let Some(path) = &cli.solution {
        let keys = seed::read_seed_grid(path)
            .with_context(|| format!("reading solution grid {}", path.display()))?;
        let parsed = keys
            .iter()
            .map(|k| parse_key(&input, k))
            .collect::<Result<Vec<_>, _>>()?;
        let solution = RosterSolution::from_keys(&input, &parsed, 0);

        let violations = verify_solution(&input, &options, &solution);
        for violation in &violations {
            warn!(%violation, "hard rule violated");
        }
        println!(
            "{}",
            report::metric_table(&input, &solution, &options.weights, &options.night_shift)
        );
        emit_outputs(cli, &input, &solution)?;
        return Ok(if violations.is_empty() {
            SolverStatus::Feasible
        } else {
            SolverStatus::Infeasible
        });
    }

    // No engine is linked into this binary. The model is built and validated,
    // ready for a `SolverBackend` through the library API, so the status
    // contract leaves UNKNOWN.
    let params = SolveParameters {
        max_time: Duration::from_secs(cli.max_time_secs),
        num_search_workers: cli.workers,
    };
    let stats = built.model.stats();
    info!(
        vars = built.model.num_vars(),
        constraints = stats.constraints(),
        ?params,
        "model ready; attach an engine via solver::SolverBackend to solve"
    );
    Ok(SolverStatus::Unknown)
}

fn emit_outputs(cli: &Cli, input: &ModelInput, solution: &RosterSolution) -> anyhow::Result<()> {
    let grid = report::build_grid(input, solution);
    if let Some(path) = &cli.csv_out {
        report::write_csv(&grid, path)?;
        info!(path = %path.display(), "grid written");
    }
    if let Some(path) = &cli.xlsx_out {
        report::write_xlsx(&grid, path, cli.start_date)?;
        info!(path = %path.display(), "workbook written");
    }
    if let Some(path) = &cli.json_out {
        std::fs::write(path, serde_json::to_string_pretty(&solution.to_json(input))?)?;
        info!(path = %path.display(), "json written");
    }
    Ok(())
}
