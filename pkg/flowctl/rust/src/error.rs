// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::process::ExitStatus;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure reported by an external tool (migration engine, database hooks).
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to run `{program}`")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum Error {
    /// The operator declined a confirmation prompt.
    #[error("{0} aborted!")]
    Aborted(String),
    #[error("migration failed")]
    Migration(#[source] ToolError),
    #[error("database operation failed")]
    Database(#[source] ToolError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to launch `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server exited with {0}")]
    ServerExit(ExitStatus),
    #[error("blocking task did not complete: {0}")]
    Offload(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted(_))
    }
}
