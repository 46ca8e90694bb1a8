mod channel;
mod cli;
mod commands;
mod manifest;
mod progress;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Default state file name, resolved next to the manifest
const STATE_FILE: &str = "craftform.state.toml";

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let state_path = cli
        .state
        .unwrap_or_else(|| cli.manifest.with_file_name(STATE_FILE));

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        manifest_path: cli.manifest,
        state_path,
    };

    match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, args),
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Destroy(args) => commands::destroy::run(&ctx, args),
        Command::Import(args) => commands::import::run(&ctx, args),
        Command::Show(args) => commands::show::run(&ctx, args),
        Command::Schema { json } => commands::schema::run(json),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "craftform", &mut io::stdout());
            Ok(())
        }
    }
}
