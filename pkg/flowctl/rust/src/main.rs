// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use clap::Parser;
use flowctl::cli::{Cli, Command, DatabaseAction, DatabaseCommand, ServerCommand};
use flowctl::config::{self, Settings};
use flowctl::confirm::{ConfirmationGate, TerminalPrompt};
use flowctl::database::{CommandDatabase, MigrationTool};
use flowctl::migrate::MigrationDispatcher;
use flowctl::{Error, routes, server};
use log::{Level, debug, info};
use std::process::ExitCode;
use std::sync::Arc;

fn log_level(verbose: u8) -> Result<Level> {
    if let Ok(level) = std::env::var("FLOWCTL_LOG") {
        return level
            .parse()
            .with_context(|| format!("invalid FLOWCTL_LOG: {level}"));
    }
    Ok(match verbose {
        0 => Level::Warn,
        1 => Level::Info,
        _ => Level::Debug,
    })
}

async fn run_database(settings: &Settings, command: DatabaseCommand) -> Result<String> {
    let db = CommandDatabase::from_settings(&settings.database);
    let action = command.into_action();
    if matches!(action, DatabaseAction::Reset { .. }) {
        db.check_lifecycle_commands()?;
    }

    let mut dispatcher = MigrationDispatcher::new(
        Arc::new(MigrationTool::from_settings(&settings.database)),
        Arc::new(db),
        ConfirmationGate::new(TerminalPrompt::stdio()),
        std::io::stdout(),
    );
    let message = match action {
        DatabaseAction::Reset { skip_confirm } => dispatcher.reset(skip_confirm).await?,
        DatabaseAction::Migrate {
            request,
            skip_confirm,
        } => dispatcher.dispatch(request, skip_confirm).await?,
    };
    Ok(message)
}

async fn run(cli: Cli) -> Result<String> {
    let count = routes::verify_route_set().context("route table is malformed")?;
    debug!("route table verified ({count} routes)");

    let path = config::settings_path();
    let mut settings = config::load_settings(&path)?;

    match cli.command {
        Command::Server(ServerCommand::Start(args)) => {
            args.apply(&mut settings.server);
            info!(
                "starting server on {}:{}",
                settings.server.host, settings.server.port
            );
            let mut out = tokio::io::stdout();
            Ok(server::start(&settings.server, &mut out).await?)
        }
        Command::Server(ServerCommand::Database(command)) | Command::Database(command) => {
            run_database(&settings, command).await
        }
    }
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match log_level(cli.verbose) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("Error: failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<Error>() {
                Some(err) if err.is_abort() => eprintln!("{err}"),
                _ => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
