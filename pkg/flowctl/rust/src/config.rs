// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_PATH: &str = "/etc/flowctl/settings.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub keep_alive_timeout: u64,
    pub log_level: String,
    pub scheduler: bool,
    pub analytics: bool,
    pub late_runs: bool,
    pub ui: bool,
    /// Executable serving the API (an ASGI server such as uvicorn).
    pub executable: String,
    pub app_dir: PathBuf,
    pub factory: String,
    /// Location of the built dashboard assets.
    pub ui_static_path: Option<PathBuf>,
    /// Seconds to wait after a forwarded signal before SIGKILL. Unset waits forever.
    pub shutdown_timeout: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4200,
            keep_alive_timeout: 5,
            log_level: "WARNING".to_string(),
            scheduler: true,
            analytics: true,
            late_runs: true,
            ui: true,
            executable: "uvicorn".to_string(),
            app_dir: PathBuf::from("."),
            factory: "orchestration.server.api.server:create_app".to_string(),
            ui_static_path: None,
            shutdown_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub connection_url: Option<String>,
    pub migration_tool: String,
    /// Arguments placed before every migration subcommand, e.g. `["-c", "alembic.ini"]`.
    pub migration_tool_args: Vec<String>,
    pub drop_all: Vec<String>,
    pub create_all: Vec<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection_url: None,
            migration_tool: "alembic".to_string(),
            migration_tool_args: Vec::new(),
            drop_all: Vec::new(),
            create_all: Vec::new(),
        }
    }
}

pub fn settings_path() -> PathBuf {
    std::env::var("FLOWCTL_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH))
}

/// Load settings from `path` (defaults when missing), then apply `FLOWCTL_*` overrides.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str::<Option<Settings>>(&contents)
            .with_context(|| format!("parsing {}", path.display()))?
            .unwrap_or_default()
    } else {
        warn!(
            "settings file not found at {}, using defaults",
            path.display()
        );
        Settings::default()
    };
    apply_env_overrides(&mut settings)?;
    debug!("resolved settings: {settings:?}");
    Ok(settings)
}

fn apply_env_overrides(settings: &mut Settings) -> Result<()> {
    let server = &mut settings.server;
    if let Some(host) = env_var("FLOWCTL_SERVER_API_HOST") {
        server.host = host;
    }
    if let Some(port) = env_var("FLOWCTL_SERVER_API_PORT") {
        server.port = port
            .parse()
            .with_context(|| format!("invalid FLOWCTL_SERVER_API_PORT: {port}"))?;
    }
    if let Some(timeout) = env_var("FLOWCTL_SERVER_API_KEEPALIVE_TIMEOUT") {
        server.keep_alive_timeout = timeout
            .parse()
            .with_context(|| format!("invalid FLOWCTL_SERVER_API_KEEPALIVE_TIMEOUT: {timeout}"))?;
    }
    if let Some(level) = env_var("FLOWCTL_LOGGING_SERVER_LEVEL") {
        server.log_level = level;
    }
    for (name, field) in [
        ("FLOWCTL_API_SERVICES_SCHEDULER_ENABLED", &mut server.scheduler),
        ("FLOWCTL_SERVER_ANALYTICS_ENABLED", &mut server.analytics),
        ("FLOWCTL_API_SERVICES_LATE_RUNS_ENABLED", &mut server.late_runs),
        ("FLOWCTL_UI_ENABLED", &mut server.ui),
    ] {
        if let Some(value) = env_var(name) {
            *field = parse_bool(&value).with_context(|| format!("invalid {name}"))?;
        }
    }
    if let Some(url) = env_var("FLOWCTL_API_DATABASE_CONNECTION_URL") {
        settings.database.connection_url = Some(url);
    }
    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
