// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::ServerSettings;
use crate::migrate::MigrationRequest;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "flowctl", version)]
#[command(about = "Start the orchestration server and manage its database", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Commands for interacting with the orchestration backend
    #[command(subcommand)]
    Server(ServerCommand),
    /// Commands for interacting with the database
    #[command(subcommand)]
    Database(DatabaseCommand),
}

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Start the orchestration server
    Start(StartArgs),
    /// Commands for interacting with the database
    #[command(subcommand)]
    Database(DatabaseCommand),
}

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub keep_alive_timeout: Option<u64>,
    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(long, overrides_with = "no_scheduler")]
    pub scheduler: bool,
    #[arg(long, overrides_with = "scheduler")]
    pub no_scheduler: bool,

    #[arg(long, overrides_with = "analytics_off")]
    pub analytics_on: bool,
    #[arg(long, overrides_with = "analytics_on")]
    pub analytics_off: bool,

    #[arg(long, overrides_with = "no_late_runs")]
    pub late_runs: bool,
    #[arg(long, overrides_with = "late_runs")]
    pub no_late_runs: bool,

    #[arg(long, overrides_with = "no_ui")]
    pub ui: bool,
    #[arg(long, overrides_with = "ui")]
    pub no_ui: bool,
}

fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl StartArgs {
    /// Flags given on the command line win over every other settings source.
    pub fn apply(&self, settings: &mut ServerSettings) {
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(timeout) = self.keep_alive_timeout {
            settings.keep_alive_timeout = timeout;
        }
        if let Some(ref level) = self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(v) = toggle(self.scheduler, self.no_scheduler) {
            settings.scheduler = v;
        }
        if let Some(v) = toggle(self.analytics_on, self.analytics_off) {
            settings.analytics = v;
        }
        if let Some(v) = toggle(self.late_runs, self.no_late_runs) {
            settings.late_runs = v;
        }
        if let Some(v) = toggle(self.ui, self.no_ui) {
            settings.ui = v;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum DatabaseCommand {
    /// Drop and recreate all database tables
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
    /// Upgrade the database
    Upgrade {
        #[arg(short, long)]
        yes: bool,
        /// The revision to upgrade to. Runs all migrations when omitted.
        #[arg(short = 'r', long)]
        revision: Option<String>,
        /// Show the SQL that would run without applying it
        #[arg(long)]
        dry_run: bool,
    },
    /// Downgrade the database
    Downgrade {
        #[arg(short, long)]
        yes: bool,
        /// The revision to downgrade to. Reverts all migrations when omitted.
        #[arg(short = 'r', long)]
        revision: Option<String>,
        /// Show the SQL that would run without applying it
        #[arg(long)]
        dry_run: bool,
    },
    /// Create a new migration script
    Revision {
        /// A message describing the migration
        #[arg(short, long)]
        message: Option<String>,
        /// Diff the current schema against the models
        #[arg(long)]
        autogenerate: bool,
    },
    /// Stamp the revision table with the given revision without running migrations
    Stamp {
        revision: String,
        #[arg(short, long)]
        yes: bool,
    },
}

/// What a database subcommand asks the dispatcher to do.
#[derive(Debug, PartialEq, Eq)]
pub enum DatabaseAction {
    Reset { skip_confirm: bool },
    Migrate { request: MigrationRequest, skip_confirm: bool },
}

impl DatabaseCommand {
    pub fn into_action(self) -> DatabaseAction {
        match self {
            DatabaseCommand::Reset { yes } => DatabaseAction::Reset { skip_confirm: yes },
            DatabaseCommand::Upgrade {
                yes,
                revision,
                dry_run,
            } => DatabaseAction::Migrate {
                request: MigrationRequest::upgrade(revision, dry_run),
                skip_confirm: yes,
            },
            DatabaseCommand::Downgrade {
                yes,
                revision,
                dry_run,
            } => DatabaseAction::Migrate {
                request: MigrationRequest::downgrade(revision, dry_run),
                skip_confirm: yes,
            },
            DatabaseCommand::Revision {
                message,
                autogenerate,
            } => DatabaseAction::Migrate {
                request: MigrationRequest::create_revision(message, autogenerate),
                skip_confirm: false,
            },
            DatabaseCommand::Stamp { revision, yes } => DatabaseAction::Migrate {
                request: MigrationRequest::stamp(revision),
                skip_confirm: yes,
            },
        }
    }
}
