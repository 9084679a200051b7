// segmux-cli/src/main.rs
//
// Entry point for the segmux CLI: parses arguments, sets up logging, and
// dispatches to the subcommand implementations. Errors are printed with a
// remediation hint where one exists (the environment-unsupported case needs
// a host fix, not a retry).

use clap::Parser;
use console::style;
use segmux_core::CoreError;
use std::process;

mod cli;
mod commands;
mod logging;

fn main() {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        cli::Commands::Merge(args) => commands::merge::run_merge(args),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("error:").red().bold(), e);
        if let Some(hint) = remediation_hint(&e) {
            eprintln!("{} {}", style("hint:").yellow().bold(), hint);
        }
        process::exit(1);
    }
}

/// User-facing next step for errors that have one.
fn remediation_hint(error: &CoreError) -> Option<&'static str> {
    match error {
        CoreError::EnvironmentUnsupported(_) => Some(
            "ffmpeg is installed but your system cannot run it; \
             reinstall ffmpeg or fix the missing libraries it reports",
        ),
        CoreError::EngineUnavailable(_) => {
            Some("install ffmpeg and make sure it is on your PATH")
        }
        CoreError::NoInput => Some("pass at least one --video or --audio segment"),
        _ => None,
    }
}
