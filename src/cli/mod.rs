use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};

use crate::{input_api::MovementMode, mover::start_mover, utils::logging::enable_logging};

#[derive(Parser, Debug)]
#[command(name = "Unidle", version)]
#[command(
    about = "Keeps a workstation from appearing idle with safety-gated mouse nudges",
    long_about = None
)]
struct Args {
    #[arg(
        short = 'o',
        long,
        help = "Use the original visible nudge and fire immediately once idle, skipping re-verification"
    )]
    original: bool,
    #[arg(long, help = "Enable verbose logging")]
    log: bool,
    #[arg(long = "log-filter")]
    log_filter: Option<LevelFilter>,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    enable_logging(args.log_filter, args.log)?;

    let mode = if args.original {
        MovementMode::Original
    } else {
        MovementMode::Minimal
    };
    match mode {
        MovementMode::Original => {
            info!("Starting in ORIGINAL mode: immediate movement without verification")
        }
        MovementMode::Minimal => {
            info!("Starting in SAFE mode: idle verification before movement")
        }
    }
    info!("Press Ctrl+C to stop");

    start_mover(mode).await
}
