//! `mrr`: run the plan-repair MaxSAT pipeline for one planning problem.
//!
//! Encodes the domain/problem/plan triple, preprocesses and solves the
//! resulting WCNF within the time limit, and decodes the model. Progress goes
//! to stdout; the outcome lands in the result record file.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use mrr::core::budget::{Budget, SystemClock};
use mrr::core::types::{Algorithm, PipelineOutcome};
use mrr::exit_codes;
use mrr::io::config::{DEFAULT_CONFIG_FILE, PipelineConfig, load_config};
use mrr::io::executor::ProcessExecutor;
use mrr::io::workspace::{prepare_work_dir, require_file, resolve_plan_file};
use mrr::logging;
use mrr::pipeline::Pipeline;
use mrr::stages::RunInputs;

#[derive(Parser, Debug)]
#[command(
    name = "mrr",
    version,
    about = "Minimum reordering/deordering plan repair via MaxSAT"
)]
struct Cli {
    /// PDDL domain file.
    #[arg(long)]
    dfile: PathBuf,

    /// PDDL problem (instance) file.
    #[arg(long)]
    ifile: PathBuf,

    /// Plan file to optimise.
    #[arg(long)]
    pfile: PathBuf,

    /// Encoding algorithm.
    #[arg(long, value_enum)]
    encoder: Algorithm,

    /// Total time limit in minutes.
    #[arg(long, default_value_t = 30.0)]
    time: f64,

    /// Print solver output and pass --verbose to the planning engine.
    #[arg(long)]
    verbose: bool,

    /// Pipeline configuration (TOML). Defaults apply if the file is missing.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let budget = Budget::from_minutes(Box::new(SystemClock), cli.time);

    if !cli.time.is_finite() || cli.time <= 0.0 {
        bail!("time limit must be a positive number of minutes, got {}", cli.time);
    }
    require_file(&cli.dfile)?;
    require_file(&cli.ifile)?;
    let plan = resolve_plan_file(&cli.pfile)?;
    let config = load_config(&cli.config)?;

    let inputs = RunInputs {
        domain: cli.dfile,
        problem: cli.ifile,
        plan,
        algorithm: cli.encoder,
        verbose: cli.verbose,
    };
    print_settings(&inputs, &config, cli.time);

    let paths = prepare_work_dir(&config.work_dir)?;
    let executor = ProcessExecutor {
        output_limit_bytes: config.output_limit_bytes,
        logs_dir: Some(paths.logs_dir.clone()),
    };
    let mut pipeline = Pipeline::new(&config, paths, inputs, budget, &executor)?;
    let outcome = pipeline.run()?;
    info!(?outcome, "run complete");

    Ok(match outcome {
        PipelineOutcome::Done { .. } => exit_codes::OK,
        PipelineOutcome::Aborted { .. } => exit_codes::ABORTED,
    })
}

fn print_settings(inputs: &RunInputs, config: &PipelineConfig, minutes: f64) {
    println!("Domain file:  {}", inputs.domain.display());
    println!("Problem file: {}", inputs.problem.display());
    println!("Plan file:    {}", inputs.plan.display());
    println!("Results file: {}", config.results_file.display());
    println!("Temp dir:     {}", config.work_dir.display());
    println!("Optimisation alg:  {}", inputs.algorithm);
    println!("Time limit:   {}m", minutes);
    println!("Verbose:  {}", inputs.verbose);
}
