// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::config::ServerSettings;
use crate::error::{Error, Result};
use crate::supervisor::{LaunchCommand, OsSignals, ProcessSupervisor};
use log::info;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Duration;

const SERVER_NAME: &str = "the orchestration server";

const BANNER: &str = r"
  __ _                        _   _
 / _| | _____      _____| |_| |
| |_| |/ _ \ \ /\ / / __| __| |
|  _| | (_) \ V  V / (__| |_| |
|_| |_|\___/ \_/\_/ \___|\__|_|
";

/// Python-style boolean the server's settings loader expects.
fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Argument vector and environment overlay for the API server process.
pub fn launch_command(settings: &ServerSettings) -> LaunchCommand {
    LaunchCommand::new(settings.executable.clone())
        .arg("--app-dir")
        .arg(settings.app_dir.display().to_string())
        .arg("--factory")
        .arg(settings.factory.clone())
        .arg("--host")
        .arg(settings.host.clone())
        .arg("--port")
        .arg(settings.port.to_string())
        .arg("--timeout-keep-alive")
        .arg(settings.keep_alive_timeout.to_string())
        .env("FLOWCTL_API_SERVICES_SCHEDULER_ENABLED", py_bool(settings.scheduler))
        .env("FLOWCTL_SERVER_ANALYTICS_ENABLED", py_bool(settings.analytics))
        .env("FLOWCTL_API_SERVICES_LATE_RUNS_ENABLED", py_bool(settings.late_runs))
        .env("FLOWCTL_UI_ENABLED", py_bool(settings.ui))
        .env("FLOWCTL_LOGGING_SERVER_LEVEL", settings.log_level.clone())
}

pub fn welcome_blurb(settings: &ServerSettings) -> String {
    let base_url = format!("http://{}:{}", settings.host, settings.port);
    let mut blurb = format!(
        "{BANNER}
Configure clients to communicate with the server with:

    export FLOWCTL_API_URL={base_url}/api

View the API reference documentation at {base_url}/docs
"
    );

    let dashboard_built = settings
        .ui_static_path
        .as_ref()
        .is_none_or(|path| path.exists());
    if !dashboard_built {
        blurb.push_str(
            "\nThe dashboard is not built. It looks like you're on a development version.\n",
        );
    } else if !settings.ui {
        blurb.push_str("\nThe dashboard is disabled. Set `FLOWCTL_UI_ENABLED=1` to re-enable it.\n");
    } else {
        blurb.push_str(&format!("\nCheck out the dashboard at {base_url}\n"));
    }
    blurb
}

/// Run the API server in the foreground until it exits or is stopped by a signal.
pub async fn start<W>(settings: &ServerSettings, out: &mut W) -> Result<String>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(welcome_blurb(settings).as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;

    let mut supervisor = ProcessSupervisor::new(SERVER_NAME, launch_command(settings))
        .with_shutdown_timeout(settings.shutdown_timeout.map(Duration::from_secs));
    let outcome = supervisor.run(OsSignals::install, out).await?;

    if let Some(sig) = outcome.forwarded {
        info!("server stopped after {sig} with {}", outcome.status);
        return Ok("Server stopped!".to_string());
    }
    if !outcome.status.success() {
        return Err(Error::ServerExit(outcome.status));
    }
    Ok("Server stopped!".to_string())
}
