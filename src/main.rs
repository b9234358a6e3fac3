use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod log;
mod model;
mod render;

use log::TraceFormat;
use model::{DEFAULT_UNIVERSE, ProcessId, Trace};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "sched-plot")]
#[command(about = "Per-process execution-time charts from xv6 scheduler traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct TraceArgs {
    /// Trace log file.
    #[arg(long)]
    log: PathBuf,

    /// Line encoding of the log; detected from content when omitted.
    #[arg(long, value_enum)]
    format: Option<TraceFormat>,

    /// Process ids tracked from the start (comma-separated).
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = DEFAULT_UNIVERSE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    universe: Vec<ProcessId>,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw the cumulative-ticks chart of one trace.
    Plot {
        #[command(flatten)]
        trace: TraceArgs,

        #[arg(short = 'o', long)]
        out: PathBuf,

        #[arg(long, default_value = "Scheduler Evaluation")]
        title: String,

        /// Smallest process id drawn (1-3 are housekeeping in the reference runs).
        #[arg(long, default_value_t = 4)]
        min_pid: ProcessId,

        #[arg(long, default_value = "Time (ticks)")]
        x_label: String,

        #[arg(long, default_value = "Execution Ticks / Process")]
        y_label: String,

        #[arg(long, default_value_t = 1024)]
        width: u32,

        #[arg(long, default_value_t = 768)]
        height: u32,
    },
    /// Print the final cumulative ticks of every process.
    Summary {
        #[command(flatten)]
        trace: TraceArgs,
    },
    /// Write the aligned trace as JSON (stdout unless --out is given).
    Dump {
        #[command(flatten)]
        trace: TraceArgs,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Render every run listed in a TOML batch file.
    Compare {
        #[arg(long)]
        config: PathBuf,
    },
}

/// Read, parse and align one log.
fn build_trace(
    path: &Path,
    format: Option<TraceFormat>,
    universe: &[ProcessId],
) -> Result<Trace> {
    let raw = log::load_trace(path, format, universe)?;
    let trace = model::align(raw)?;

    let bad = trace.monotonic_violations();
    if !bad.is_empty() {
        tracing::warn!(
            log = %path.display(),
            pids = ?bad,
            "series not starting at 0 or decreasing"
        );
    }
    tracing::info!(
        log = %path.display(),
        processes = trace.series.len(),
        ticks = trace.ticks,
        "aligned trace"
    );
    Ok(trace)
}

fn format_summary(trace: &Trace) -> String {
    let mut out = String::new();
    for total in trace.summarize() {
        let name = total.name.as_deref().unwrap_or("-");
        out.push_str(&format!("P{}\t{}\t{}\n", total.pid, name, total.ticks));
    }
    out
}

/// Process every run independently; a failing run does not stop the rest.
fn run_batch(cfg: &config::Config) -> Result<()> {
    let mut failed = 0usize;

    for run in &cfg.runs {
        let chart = cfg.chart_for(run);
        let result = build_trace(&run.log, run.format, &cfg.universe)
            .and_then(|trace| render::render_chart(&trace, &chart));

        match result {
            Ok(()) => println!("Wrote {}", chart.out.display()),
            Err(e) => {
                tracing::error!(log = %run.log.display(), "run failed: {:#}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} runs failed", failed, cfg.runs.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Plot {
            trace,
            out,
            title,
            min_pid,
            x_label,
            y_label,
            width,
            height,
        } => {
            let data = build_trace(&trace.log, trace.format, &trace.universe)?;
            let chart = config::ChartConfig {
                min_pid,
                x_label,
                y_label,
                title,
                out,
                width,
                height,
            };
            render::render_chart(&data, &chart)?;
            println!("Wrote {}", chart.out.display());
        }
        Commands::Summary { trace } => {
            let data = build_trace(&trace.log, trace.format, &trace.universe)?;
            print!("{}", format_summary(&data));
        }
        Commands::Dump { trace, out } => {
            let data = build_trace(&trace.log, trace.format, &trace.universe)?;
            let json = render::render_json(&data)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        Commands::Compare { config } => {
            let cfg = config::Config::load(&config)?;
            run_batch(&cfg)?;
        }
    }

    Ok(())
}
