// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Ports to the external migration engine and database provider, plus the
//! command-line adapters the `flowctl` binary wires in.

use crate::config::DatabaseSettings;
use crate::error::{Error, Result, ToolError};
use log::{debug, info};
use std::process::Command;

/// Environment variable through which external tools receive the target database.
pub const CONNECTION_URL_ENV: &str = "FLOWCTL_API_DATABASE_CONNECTION_URL";

/// Blocking entry points of the schema-migration engine.
pub trait MigrationEngine: Send + Sync {
    fn upgrade(&self, revision: &str, dry_run: bool) -> Result<(), ToolError>;
    fn downgrade(&self, revision: &str, dry_run: bool) -> Result<(), ToolError>;
    fn stamp(&self, revision: &str) -> Result<(), ToolError>;
    fn create_revision(&self, message: Option<&str>, autogenerate: bool) -> Result<(), ToolError>;
}

/// Provider of the database target and its table lifecycle.
pub trait DatabaseInterface: Send + Sync {
    /// Connection descriptor of the target database.
    fn connection_url(&self) -> Result<String>;
    fn drop_all(&self) -> Result<(), ToolError>;
    fn create_all(&self) -> Result<(), ToolError>;
}

/// Runs a migration executable (alembic-compatible command line).
pub struct MigrationTool {
    program: String,
    args: Vec<String>,
    connection_url: Option<String>,
}

impl MigrationTool {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            connection_url: None,
        }
    }

    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        let mut tool = Self::new(
            settings.migration_tool.clone(),
            settings.migration_tool_args.clone(),
        );
        tool.connection_url = settings.connection_url.clone();
        tool
    }

    fn run(&self, subcommand: &[&str]) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(subcommand);
        if let Some(ref url) = self.connection_url {
            cmd.env(CONNECTION_URL_ENV, url);
        }
        debug!("running migration tool: {cmd:?}");
        run_to_completion(&self.program, cmd)
    }
}

impl MigrationEngine for MigrationTool {
    fn upgrade(&self, revision: &str, dry_run: bool) -> Result<(), ToolError> {
        let mut args = vec!["upgrade", revision];
        if dry_run {
            args.push("--sql");
        }
        self.run(&args)
    }

    fn downgrade(&self, revision: &str, dry_run: bool) -> Result<(), ToolError> {
        let mut args = vec!["downgrade", revision];
        if dry_run {
            args.push("--sql");
        }
        self.run(&args)
    }

    fn stamp(&self, revision: &str) -> Result<(), ToolError> {
        self.run(&["stamp", revision])
    }

    fn create_revision(&self, message: Option<&str>, autogenerate: bool) -> Result<(), ToolError> {
        let mut args = vec!["revision"];
        if let Some(message) = message {
            args.extend(["-m", message]);
        }
        if autogenerate {
            args.push("--autogenerate");
        }
        self.run(&args)
    }
}

/// Database provider whose drop/create steps are configured commands.
pub struct CommandDatabase {
    connection_url: Option<String>,
    drop_all: Vec<String>,
    create_all: Vec<String>,
}

impl CommandDatabase {
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self {
            connection_url: settings.connection_url.clone(),
            drop_all: settings.drop_all.clone(),
            create_all: settings.create_all.clone(),
        }
    }

    /// Fails unless both lifecycle commands are configured.
    pub fn check_lifecycle_commands(&self) -> Result<()> {
        if self.drop_all.is_empty() || self.create_all.is_empty() {
            return Err(Error::Config(
                "database.drop_all and database.create_all must both be set to reset the database"
                    .into(),
            ));
        }
        Ok(())
    }

    fn run(&self, argv: &[String]) -> Result<(), ToolError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(ToolError::Other("no command configured".into()));
        };
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(ref url) = self.connection_url {
            cmd.env(CONNECTION_URL_ENV, url);
        }
        run_to_completion(program, cmd)
    }
}

impl DatabaseInterface for CommandDatabase {
    fn connection_url(&self) -> Result<String> {
        self.connection_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::Config("database.connection_url is not set".into()))
    }

    fn drop_all(&self) -> Result<(), ToolError> {
        self.run(&self.drop_all)
    }

    fn create_all(&self) -> Result<(), ToolError> {
        self.run(&self.create_all)
    }
}

fn run_to_completion(program: &str, mut cmd: Command) -> Result<(), ToolError> {
    let status = cmd.status().map_err(|source| ToolError::Launch {
        program: program.to_string(),
        source,
    })?;
    if !status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            status,
        });
    }
    info!("`{program}` completed");
    Ok(())
}

/// Render a connection URL with its password masked.
///
/// The user name ends at the first `:`. The password runs to the last `@`
/// of the authority, so a password holding `/` or `@` is never shown.
pub fn obfuscate_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((user, credentials)) = rest.split_once(':') else {
        return url.to_string();
    };
    if user.contains(['/', '@']) {
        return url.to_string();
    }
    let Some(first_at) = credentials.find('@') else {
        return url.to_string();
    };
    let tail = credentials.split_at(first_at).1;
    let authority_len = tail.find('/').unwrap_or(tail.len());
    let (authority_tail, path) = tail.split_at(authority_len);
    let host = authority_tail
        .rsplit_once('@')
        .map_or(authority_tail, |(_, host)| host);
    format!("{scheme}://{user}:***@{host}{path}")
}
