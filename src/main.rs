//! `tb-reducer`: reduce the scalars of several TensorBoard runs
//!
//! ```bash
//! tb-reducer -i 'runs/seed-*' -o reduced.csv -r mean,std,min,max
//! tb-reducer -i 'runs/seed-*' -o runs/reduced -r mean --allow-uneven-steps
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tensorboard_reducer::align::AlignSummary;
use tensorboard_reducer::run::DuplicateStepPolicy;
use tensorboard_reducer::{Reducer, DEFAULT_REDUCE_OP};

/// Tag lists longer than this are left out of the summary
const MAX_LISTED_TAGS: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "tb-reducer")]
#[command(about = "Reduce the scalar metrics of multiple TensorBoard runs into one")]
#[command(
    long_about = r#"Reduce the scalar metrics of multiple TensorBoard runs into one.

The output suffix selects the format:
  .csv / .json / .parquet   one table, columns = (tag, reduce op)
  anything else             one TensorBoard run directory <outpath>-<op> per op

EXAMPLES:
  tb-reducer -i 'runs/seed-*' -o reduced.csv -r mean,std
  tb-reducer -i 'runs/seed-*' -o runs/reduced -r mean,max -f"#
)]
#[command(version)]
struct Cli {
    /// Glob matching the run directories to reduce
    #[arg(short = 'i', long = "indirs-glob", value_name = "GLOB")]
    indirs_glob: String,

    /// Output file (.csv, .json, .parquet) or event-log directory base name
    #[arg(short = 'o', long, value_name = "PATH")]
    outpath: PathBuf,

    /// Comma-separated reduce ops (mean, median, std, var, min, max, sum, prod)
    #[arg(
        short = 'r',
        long = "reduce-ops",
        value_delimiter = ',',
        default_value = DEFAULT_REDUCE_OP
    )]
    reduce_ops: Vec<String>,

    /// Replace existing outputs
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// Allow runs to log different tags (reduce each tag over the runs that have it)
    #[arg(long)]
    allow_uneven_tags: bool,

    /// Allow runs to log different steps (truncate to the shortest run)
    #[arg(long)]
    allow_uneven_steps: bool,

    /// How to handle a step logged more than once within one run
    #[arg(long, value_enum, default_value = "error")]
    handle_dup_steps: DupStepsArg,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DupStepsArg {
    Error,
    KeepFirst,
    KeepLast,
    Mean,
}

impl From<DupStepsArg> for DuplicateStepPolicy {
    fn from(arg: DupStepsArg) -> Self {
        match arg {
            DupStepsArg::Error => Self::Error,
            DupStepsArg::KeepFirst => Self::KeepFirst,
            DupStepsArg::KeepLast => Self::KeepLast,
            DupStepsArg::Mean => Self::Mean,
        }
    }
}

fn init_tracing(cli: &Cli) {
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn log_summary(summary: &AlignSummary) {
    if let Some((n_steps, n_runs)) = summary.uniform {
        info!(
            "Loaded {n_runs} runs with {} scalars and {n_steps} steps each",
            summary.n_tags
        );
    } else {
        info!("Loaded {} runs with {} scalars", summary.n_runs, summary.n_tags);
        for (tag, (n_steps, n_runs)) in &summary.shapes {
            info!("  {tag}: {n_steps} steps x {n_runs} runs");
        }
    }

    if summary.n_tags < MAX_LISTED_TAGS {
        let tags: Vec<&str> = summary.shapes.iter().map(|(tag, _)| tag.as_str()).collect();
        info!("Tags: {}", tags.join(", "));
    }
}

fn build_reducer(cli: &Cli) -> anyhow::Result<Reducer> {
    Reducer::builder()
        .reduce_ops(&cli.reduce_ops)
        .strict_tags(!cli.allow_uneven_tags)
        .strict_steps(!cli.allow_uneven_steps)
        .duplicate_steps(cli.handle_dup_steps.into())
        .overwrite(cli.overwrite)
        .build()
        .context("invalid reducer configuration")
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let reducer = build_reducer(cli)?;

    info!("Reading runs matching '{}'", cli.indirs_glob);
    let store = reducer
        .load(&cli.indirs_glob)
        .with_context(|| format!("failed to load runs matching '{}'", cli.indirs_glob))?;
    let events = reducer.align(&store).context("failed to align runs")?;
    log_summary(&events.summary());

    let reduced = reducer.reduce(&events).context("failed to reduce runs")?;
    let written = reducer
        .write(&reduced, &cli.outpath)
        .with_context(|| format!("failed to write '{}'", cli.outpath.display()))?;

    if written.len() == reduced.op_count() {
        for (op, path) in reduced.ops().zip(&written) {
            info!("Wrote '{op}' reduction to '{}'", path.display());
        }
    } else {
        let ops: Vec<&str> = reduced.ops().collect();
        for path in &written {
            info!("Wrote '{}' reduction to '{}'", ops.join(", "), path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
