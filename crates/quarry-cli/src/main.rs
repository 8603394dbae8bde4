//! quarry CLI Application
//!
//! Command-line interface for running multi-step SQL query plans.

mod args;
mod cli;
mod corrector;
mod renderer;

use std::process::ExitCode;

use anyhow::Result;
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        json,
        engine,
        command,
    } = Args::parse();

    let cli = Cli::new(database_file, engine, json, TerminalRenderer::new(!no_color));

    info!("quarry started");

    match command {
        Run(args) => cli.run_plan(&args.file.plan, args.details).await,
        Query(args) => cli.run_query(args.into()).await,
        Validate(args) => cli.validate(&args.plan),
        Schema => cli.schema(),
    }
}
