// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Dispatch of database migration commands: confirmation, then the blocking
//! engine call on a worker thread.

use crate::confirm::{ConfirmationGate, Prompt};
use crate::database::{DatabaseInterface, MigrationEngine, obfuscate_url};
use crate::error::{Error, Result};
use crate::offload::run_blocking;
use log::info;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

pub const DEFAULT_UPGRADE_REVISION: &str = "head";
pub const DEFAULT_DOWNGRADE_REVISION: &str = "base";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    Upgrade,
    Downgrade,
    Stamp,
    RevisionCreate,
}

impl MigrationKind {
    /// Whether the operation changes the database and must be confirmed.
    pub fn is_destructive(self) -> bool {
        self != MigrationKind::RevisionCreate
    }
}

impl fmt::Display for MigrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationKind::Upgrade => write!(f, "upgrade"),
            MigrationKind::Downgrade => write!(f, "downgrade"),
            MigrationKind::Stamp => write!(f, "stamp"),
            MigrationKind::RevisionCreate => write!(f, "revision"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRequest {
    kind: MigrationKind,
    revision: Option<String>,
    dry_run: bool,
    message: Option<String>,
    autogenerate: bool,
}

impl MigrationRequest {
    pub fn upgrade(revision: Option<String>, dry_run: bool) -> Self {
        Self {
            kind: MigrationKind::Upgrade,
            revision: Some(revision.unwrap_or_else(|| DEFAULT_UPGRADE_REVISION.to_string())),
            dry_run,
            message: None,
            autogenerate: false,
        }
    }

    pub fn downgrade(revision: Option<String>, dry_run: bool) -> Self {
        Self {
            kind: MigrationKind::Downgrade,
            revision: Some(revision.unwrap_or_else(|| DEFAULT_DOWNGRADE_REVISION.to_string())),
            dry_run,
            message: None,
            autogenerate: false,
        }
    }

    pub fn stamp(revision: impl Into<String>) -> Self {
        Self {
            kind: MigrationKind::Stamp,
            revision: Some(revision.into()),
            dry_run: false,
            message: None,
            autogenerate: false,
        }
    }

    pub fn create_revision(message: Option<String>, autogenerate: bool) -> Self {
        Self {
            kind: MigrationKind::RevisionCreate,
            revision: None,
            dry_run: false,
            message,
            autogenerate,
        }
    }

    pub fn kind(&self) -> MigrationKind {
        self.kind
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn autogenerate(&self) -> bool {
        self.autogenerate
    }

    /// Reject revision identifiers the engine cannot possibly resolve.
    pub fn validate(&self) -> Result<()> {
        if let Some(rev) = self.revision.as_deref()
            && (rev.is_empty() || rev.chars().any(|c| c.is_whitespace() || c.is_control()))
        {
            return Err(Error::Config(format!("invalid revision identifier: {rev:?}")));
        }
        Ok(())
    }
}

/// Runs migration operations against the external engine.
pub struct MigrationDispatcher<P, W> {
    engine: Arc<dyn MigrationEngine>,
    database: Arc<dyn DatabaseInterface>,
    gate: ConfirmationGate<P>,
    console: W,
}

impl<P: Prompt, W: Write> MigrationDispatcher<P, W> {
    pub fn new(
        engine: Arc<dyn MigrationEngine>,
        database: Arc<dyn DatabaseInterface>,
        gate: ConfirmationGate<P>,
        console: W,
    ) -> Self {
        Self {
            engine,
            database,
            gate,
            console,
        }
    }

    /// Run one migration request. Returns the success message for the operator.
    pub async fn dispatch(&mut self, request: MigrationRequest, skip_confirm: bool) -> Result<String> {
        request.validate()?;
        let target = obfuscate_url(&self.database.connection_url()?);
        let kind = request.kind();

        if kind.is_destructive() {
            let prompt = match kind {
                MigrationKind::Stamp => format!(
                    "Are you sure you want to stamp the database at {target} with revision {}? \
                     No migrations will run.",
                    request.revision().unwrap_or_default()
                ),
                _ => format!("Are you sure you want to {kind} the database at {target}?"),
            };
            if !self.gate.confirm(&prompt, skip_confirm).proceeds() {
                return Err(Error::Aborted(format!("Database {kind}")));
            }
        }

        let progress = match kind {
            MigrationKind::Upgrade => "Running upgrade migrations ...",
            MigrationKind::Downgrade => "Running downgrade migrations ...",
            MigrationKind::Stamp => "Stamping database with revision ...",
            MigrationKind::RevisionCreate => "Running migration file creation ...",
        };
        writeln!(self.console, "{progress}")?;
        info!("dispatching {kind} (dry_run={}) against {target}", request.dry_run());

        let engine = Arc::clone(&self.engine);
        run_blocking(move || {
            let revision = request.revision().unwrap_or_default();
            let outcome = match request.kind() {
                MigrationKind::Upgrade => engine.upgrade(revision, request.dry_run()),
                MigrationKind::Downgrade => engine.downgrade(revision, request.dry_run()),
                MigrationKind::Stamp => engine.stamp(revision),
                MigrationKind::RevisionCreate => {
                    engine.create_revision(request.message(), request.autogenerate())
                }
            };
            outcome.map_err(Error::Migration)
        })
        .await?;

        Ok(match kind {
            MigrationKind::Upgrade => {
                writeln!(self.console, "Migrations succeeded!")?;
                format!("Database at {target} upgraded!")
            }
            MigrationKind::Downgrade => {
                writeln!(self.console, "Migrations succeeded!")?;
                format!("Database at {target} downgraded!")
            }
            MigrationKind::Stamp => format!("Stamping database at {target} with revision succeeded!"),
            MigrationKind::RevisionCreate => "Creating new migration file succeeded!".to_string(),
        })
    }

    /// Drop and recreate every table. No migrations are involved.
    pub async fn reset(&mut self, skip_confirm: bool) -> Result<String> {
        let target = obfuscate_url(&self.database.connection_url()?);
        let prompt = format!(
            "Are you sure you want to reset the database located at \"{target}\"? \
             This will drop and recreate all tables."
        );
        if !self.gate.confirm(&prompt, skip_confirm).proceeds() {
            return Err(Error::Aborted("Database reset".into()));
        }

        writeln!(self.console, "Dropping database...")?;
        let database = Arc::clone(&self.database);
        run_blocking(move || database.drop_all().map_err(Error::Database)).await?;

        writeln!(self.console, "Creating database...")?;
        let database = Arc::clone(&self.database);
        run_blocking(move || database.create_all().map_err(Error::Database)).await?;

        Ok(format!("Database \"{target}\" reset!"))
    }
}
