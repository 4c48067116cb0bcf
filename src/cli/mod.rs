pub mod command;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::{
    config::AppContext, oracle::ollama::OllamaOracle, tracker::ActivityTracker,
    utils::logging::enable_logging,
};

#[derive(Parser, Debug)]
#[command(name = "whatidid", version)]
#[command(about = "AI-assisted activity time tracker", long_about = None)]
struct Args {
    #[arg(long, help = "Enable logging to stdout")]
    log: bool,
    #[arg(
        long,
        help = "Data directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(
        trailing_var_arg = true,
        help = "A command (help, tell <question>, category <subcommand>) or free text naming an activity to start"
    )]
    words: Vec<String>,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let context = AppContext::new(args.dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&context.data_dir, logging_level, args.log)?;

    let oracle = OllamaOracle::new(context.oracle.clone());
    let mut tracker = ActivityTracker::new(&context, Box::new(oracle))?;

    command::process(&mut tracker, &args.words).await
}
