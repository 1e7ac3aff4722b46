//! gh-publish - Publish a local project to GitHub Pages.

mod cli;
mod config;
mod deploy;
mod error;
mod github;
mod interrupt;
mod logger;
mod prompt;
mod publish;
#[cfg(test)]
mod testing;
mod utils;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::{ConfigError, PublishConfig};
use error::{EXIT_FAILURE, PublishError};
use logger::{Console, Sink, Status};
use prompt::{AssumeDefaults, Interactive, Prompter};
use publish::{Flow, Session};
use std::{path::Path, process::ExitCode};
use utils::exec::SystemRunner;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(Flow::Completed | Flow::Cancelled) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

fn run(cli: &Cli) -> Result<Flow> {
    let config = load_config(cli)?;
    interrupt::install()?;

    let runner = SystemRunner::new(config.verbose);
    let sink = Console;
    let prompter: Box<dyn Prompter> = if config.assume_yes {
        Box::new(AssumeDefaults)
    } else {
        Box::new(Interactive::default())
    };
    let session = Session {
        config: &config,
        runner: &runner,
        sink: &sink,
        prompter: &*prompter,
    };

    publish::check_tools(&config, &sink)?;
    match &cli.command {
        Commands::Publish => publish::publish(&session),
        Commands::Deploy { .. } => publish::deploy_only(&session),
        Commands::Probe => publish::report(&session),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<PublishConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        PublishConfig::from_path(&config_path)?
    } else {
        PublishConfig::default()
    };
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}

/// Print an error and pick the exit code.
///
/// Known failures print their details; an interrupted prompt exits 130;
/// anything else prints the full cause chain (with a backtrace when
/// `RUST_BACKTRACE` is set).
fn report_error(err: &anyhow::Error) -> ExitCode {
    let sink = Console;

    if let Some(err) = err.downcast_ref::<PublishError>() {
        if matches!(err, PublishError::Interrupted) {
            log!("interrupt"; "{err}");
            return err.exit_code();
        }
        sink.status(Status::Error, &err.to_string(), err.details().as_deref());
        return err.exit_code();
    }

    if let Some(config_err) = err.downcast_ref::<ConfigError>() {
        let cause = err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>();
        sink.status(
            Status::Error,
            &config_err.to_string(),
            Some(&cause.join("\n")),
        );
        return ExitCode::from(EXIT_FAILURE);
    }

    sink.status(Status::Error, "Unexpected error", Some(&format!("{err:?}")));
    ExitCode::from(EXIT_FAILURE)
}
