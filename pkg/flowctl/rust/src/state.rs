// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Nothing launched yet.
    NotStarted,
    /// Spawn requested, pid not yet known.
    Launching,
    /// Child is alive and its output is being streamed.
    Running,
    /// A stop signal was forwarded; waiting for the child to exit.
    ShuttingDown,
    /// Child exit status observed.
    Exited,
}

impl SupervisorState {
    pub fn is_alive(self) -> bool {
        matches!(self, SupervisorState::Running | SupervisorState::ShuttingDown)
    }

    pub(crate) fn can_transition_to(self, next: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, next),
            (NotStarted, Launching)
                | (Launching, Running)
                | (Launching, Exited)
                | (Running, ShuttingDown)
                | (Running, Exited)
                | (ShuttingDown, Exited)
        )
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::NotStarted => write!(f, "not started"),
            SupervisorState::Launching => write!(f, "launching"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::ShuttingDown => write!(f, "shutting down"),
            SupervisorState::Exited => write!(f, "exited"),
        }
    }
}
