use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use si_demo::enzyme::{self, Component};
use si_demo::{DecayParams, DemoCase, DemoError, EnzymeParams, RunSummary, Trajectory, decay};
use si_init::{ElementEvent, ElementStage, InitOptions};
use si_model::VarKey;
use si_solver::NewtonAdapter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Parser)]
#[command(name = "si-cli")]
#[command(about = "seqinit CLI - sequential time-element initialization of DAE models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the linear decay model dx/dt = -k x
    Decay {
        #[command(flatten)]
        grid: GridArgs,
        /// Print the summary and trajectories as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize the enzyme CSTR
    Enzyme {
        #[command(flatten)]
        grid: GridArgs,
        /// Print the summary and trajectories as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show each element's sub-problem without solving
    Plan {
        case: CaseName,
        #[command(flatten)]
        grid: GridArgs,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Number of finite elements
    #[arg(long)]
    nfe: Option<usize>,
    /// Collocation points per element (1-5)
    #[arg(long)]
    ncp: Option<usize>,
    /// End of the time horizon
    #[arg(long)]
    horizon: Option<f64>,
    /// YAML file with `options`, `decay` and `enzyme` sections
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CaseName {
    Decay,
    Enzyme,
}

/// Contents of the optional `--config` file; every section may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    options: InitOptions,
    decay: DecayParams,
    enzyme: EnzymeParams,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{0}")]
    Demo(#[from] DemoError),

    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Serialize)]
struct Report {
    summary: RunSummary,
    trajectories: Vec<Trajectory>,
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decay { grid, json } => {
            let (config, params) = decay_params(&grid)?;
            let case = decay::build(&params)?;
            cmd_run(case, &config.options, &[decay::state()], json)
        }
        Commands::Enzyme { grid, json } => {
            let (config, params) = enzyme_params(&grid)?;
            let case = enzyme::build(&params)?;
            let mut keys: Vec<_> = Component::ALL.into_iter().map(enzyme::concentration).collect();
            keys.push(enzyme::temperature());
            cmd_run(case, &config.options, &keys, json)
        }
        Commands::Plan { case, grid } => {
            let (config, case) = match case {
                CaseName::Decay => {
                    let (config, params) = decay_params(&grid)?;
                    (config, decay::build(&params)?)
                }
                CaseName::Enzyme => {
                    let (config, params) = enzyme_params(&grid)?;
                    (config, enzyme::build(&params)?)
                }
            };
            cmd_plan(&case, &config.options)
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<Config> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&text)?)
        }
        None => Ok(Config::default()),
    }
}

fn decay_params(grid: &GridArgs) -> CliResult<(Config, DecayParams)> {
    let config = load_config(grid.config.as_deref())?;
    let mut params = config.decay.clone();
    if let Some(nfe) = grid.nfe {
        params.nfe = nfe;
    }
    if let Some(ncp) = grid.ncp {
        params.ncp = ncp;
    }
    if let Some(horizon) = grid.horizon {
        params.horizon = horizon;
    }
    Ok((config, params))
}

fn enzyme_params(grid: &GridArgs) -> CliResult<(Config, EnzymeParams)> {
    let config = load_config(grid.config.as_deref())?;
    let mut params = config.enzyme.clone();
    if let Some(nfe) = grid.nfe {
        params.nfe = nfe;
    }
    if let Some(ncp) = grid.ncp {
        params.ncp = ncp;
    }
    if let Some(horizon) = grid.horizon {
        params.horizon = horizon;
    }
    Ok((config, params))
}

fn cmd_run(
    mut case: DemoCase,
    options: &InitOptions,
    keys: &[VarKey],
    json: bool,
) -> CliResult<()> {
    if !json {
        println!(
            "Initializing {} model: {} elements x {} collocation points",
            case.name,
            case.disc.nfe(),
            case.disc.ncp()
        );
    }

    let started = Instant::now();
    let mut solver = NewtonAdapter::new();
    let mut report_progress = |event: &ElementEvent| {
        if !json {
            render_progress(event);
        }
    };
    case.initialize(&mut solver, options, Some(&mut report_progress))?;
    let elapsed = started.elapsed().as_secs_f64();
    info!(elapsed_s = elapsed, solves = solver.calls(), "initialization complete");

    let summary = case.summary();
    if json {
        let trajectories = keys
            .iter()
            .map(|key| case.trajectory(key))
            .collect::<Result<Vec<_>, _>>()?;
        let report = Report {
            summary,
            trajectories,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("✓ Initialized in {:.3}s", elapsed);
    println!("  Variables:   {}", summary.variables);
    println!("  Constraints: {}", summary.constraints);
    println!("  DOF:         {}", summary.dof);
    println!("  Max infeasibility: {:.3e}", summary.max_infeasibility);

    let horizon = case.disc.time().last();
    for key in keys {
        let value = case.value_at(key, horizon)?;
        println!("  {} at t={}: {:.4}", key, horizon, value);
    }
    Ok(())
}

fn cmd_plan(case: &DemoCase, options: &InitOptions) -> CliResult<()> {
    let plans = case.plan(options.time_tol)?;
    println!(
        "Plan for {} model ({} elements):",
        case.name,
        plans.len()
    );
    println!(
        "  {:>4}  {:>17}  {:>5}  {:>8}  {:>5}  {:>4}  {:>4}",
        "elem", "span", "vars", "released", "cons", "leak", "dof"
    );
    for p in &plans {
        let mark = if p.is_square() { "" } else { "  ✗ not square" };
        println!(
            "  {:>4}  [{:>7.3}, {:>7.3}]  {:>5}  {:>8}  {:>5}  {:>4}  {:>4}{}",
            p.index, p.t_start, p.t_end, p.variables, p.released, p.constraints, p.leaking, p.dof, mark
        );
    }
    Ok(())
}

fn render_progress(event: &ElementEvent) {
    let status = match event.stage {
        ElementStage::Started => return,
        ElementStage::Converged => "converged",
        ElementStage::Failed => "FAILED",
    };
    println!(
        "  element {:>3}/{} [{:.3}, {:.3}] {}",
        event.index + 1,
        event.count,
        event.t_start,
        event.t_end,
        status
    );
}
