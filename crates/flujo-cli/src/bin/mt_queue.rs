//! `mt_queue <cfg>`: runs the multi-producer queue stress test with
//! parameters read from a configuration file.
//!
//! The cfg may carry an `mt_queue` dict (or the parameters at the root):
//!
//! ```text
//! mt_queue: {
//!   producer_n: 8,
//!   msg_per_producer: 20000,
//!   queue_cap: 64,
//! }
//! ```
//!
//! Exits 0 when every record arrived in per-producer order, 1 otherwise.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flujo_queue::{StressParams, run_stress};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mt_queue", about = "multi-producer queue stress test")]
struct Cli {
    /// Configuration file path.
    cfg: PathBuf,
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let text = std::fs::read_to_string(&cli.cfg)
        .map_err(|e| anyhow::anyhow!("cannot read '{}': {e}", cli.cfg.display()))?;
    let root = flujo_cfg::parse(&text)?;
    let nested = root.member("mt_queue").map(std::sync::Arc::clone);
    let params_cfg = nested.unwrap_or(root);
    let params = StressParams::from_cfg(&params_cfg)?;

    let report = run_stress(&params)?;
    println!(
        "pushed: {}  retries: {}  popped: {}  fifo: {}",
        report.pushed_n,
        report.retry_n,
        report.popped_n,
        if report.fifo_ok { "ok" } else { "VIOLATED" }
    );
    Ok(report.fifo_ok && report.popped_n == report.pushed_n)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayHelp => {
            print!("{e}");
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            eprintln!("usage: mt_queue <cfg>");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            eprintln!("mt_queue: order or count check failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("mt_queue: {e}");
            ExitCode::FAILURE
        }
    }
}
