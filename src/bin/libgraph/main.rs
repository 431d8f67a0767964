//! libgraph CLI - inspect compiled libraries and drive interop builds

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use libgraph::util::diagnostic::emit;
use libgraph::util::ColorChoice;
use libgraph::{InteropError, LoadError};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn report(error: &anyhow::Error, color: bool) {
    if let Some(load) = error.downcast_ref::<LoadError>() {
        emit(&load.to_diagnostic(), color);
    } else if let Some(interop) = error.downcast_ref::<InteropError>() {
        emit(&interop.to_diagnostic(), color);
    } else {
        eprintln!("error: {:#}", error);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("libgraph=debug")
    } else {
        EnvFilter::new("libgraph=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(args, color),
        Commands::Lookup(args) => commands::lookup::execute(args, color),
        Commands::Interop(args) => commands::interop::execute(args, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
