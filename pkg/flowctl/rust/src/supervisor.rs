// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Supervision of a single foreground child process.
//!
//! The child's stdout and stderr share one pipe so the operator sees its
//! output in the order it was written. Interrupt and terminate signals
//! received by `flowctl` are forwarded to the child as the same signal, and
//! the supervisor only returns once the child's exit status is known.

use crate::error::{Error, Result};
use crate::state::SupervisorState;
use log::{debug, info, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io;
use std::os::fd::OwnedFd;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep_until, timeout};

/// How long output is still drained after the child exits. Grandchildren may
/// keep the pipe open indefinitely.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Executable, ordered arguments and environment overlay of the child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Merged over the parent's environment.
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Delivers the stop requests addressed to this process.
pub trait SignalSource {
    /// Next received signal, `None` once no more can arrive. Must be cancel safe.
    fn recv(&mut self) -> impl Future<Output = Option<Signal>>;
}

/// SIGINT and SIGTERM as delivered by the operating system.
pub struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

impl OsSignals {
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            r = self.interrupt.recv() => r.map(|_| Signal::SIGINT),
            r = self.terminate.recv() => r.map(|_| Signal::SIGTERM),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOutcome {
    pub status: ExitStatus,
    /// First signal forwarded to the child, if the stop was operator-driven.
    pub forwarded: Option<Signal>,
}

pub struct ProcessSupervisor {
    name: String,
    command: LaunchCommand,
    shutdown_timeout: Option<Duration>,
    state: SupervisorState,
    pid: Option<u32>,
}

impl ProcessSupervisor {
    pub fn new(name: impl Into<String>, command: LaunchCommand) -> Self {
        Self {
            name: name.into(),
            command,
            shutdown_timeout: None,
            state: SupervisorState::NotStarted,
            pid: None,
        }
    }

    /// Escalate to SIGKILL when the child outlives a forwarded signal by `limit`.
    pub fn with_shutdown_timeout(mut self, limit: Option<Duration>) -> Self {
        self.shutdown_timeout = limit;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn transition(&mut self, next: SupervisorState) {
        if !self.state.can_transition_to(next) {
            warn!("[{}] unexpected transition {} -> {next}", self.name, self.state);
        }
        debug!("[{}] {} -> {next}", self.name, self.state);
        self.state = next;
    }

    fn spawn(&mut self) -> Result<(Child, pipe::Receiver)> {
        self.transition(SupervisorState::Launching);
        let spawned = spawn_with_output_pipe(&self.command);
        let (child, output) = match spawned {
            Ok(spawned) => spawned,
            Err(source) => {
                self.transition(SupervisorState::Exited);
                return Err(Error::Spawn {
                    program: self.command.program.clone(),
                    source,
                });
            }
        };

        self.pid = child.id();
        info!(
            "[{}] spawned (pid={}, cmd={})",
            self.name,
            self.pid.unwrap_or(0),
            self.command.program
        );
        self.transition(SupervisorState::Running);
        Ok((child, output))
    }

    /// Launch the child and block until it has exited.
    ///
    /// `install_signals` runs once the child's pid is known. A signal arriving
    /// before that point gets the default disposition.
    pub async fn run<S, F, W>(&mut self, install_signals: F, out: &mut W) -> Result<SupervisorOutcome>
    where
        S: SignalSource,
        F: FnOnce() -> io::Result<S>,
        W: AsyncWrite + Unpin,
    {
        let (mut child, output) = self.spawn()?;
        let pid = self.pid;

        let mut signals = match install_signals() {
            Ok(signals) => signals,
            Err(e) => {
                warn!("[{}] failed to install signal handlers, stopping child: {e}", self.name);
                let _ = child.kill().await;
                self.transition(SupervisorState::Exited);
                return Err(e.into());
            }
        };

        let name = self.name.clone();
        let (notices_tx, mut notices_rx) = mpsc::unbounded_channel::<String>();

        let exited = {
            let stream = forward_output(&name, output, &mut notices_rx, out);
            let control = async {
                let notices = notices_tx;
                let mut forwarded = None;
                let mut kill_at: Option<Instant> = None;
                loop {
                    let escalation = async move {
                        match kill_at {
                            Some(at) => sleep_until(at).await,
                            None => std::future::pending().await,
                        }
                    };
                    tokio::select! {
                        status = child.wait() => return status.map(|s| (s, forwarded)),
                        Some(sig) = signals.recv() => {
                            let _ = notices.send(format!(
                                "Received {sig}. Sending {sig} to {} (PID {})...",
                                self.name,
                                pid.unwrap_or(0)
                            ));
                            forward_signal(&self.name, pid, sig);
                            if self.state == SupervisorState::Running {
                                self.transition(SupervisorState::ShuttingDown);
                            }
                            if forwarded.is_none() {
                                forwarded = Some(sig);
                            }
                            if kill_at.is_none()
                                && let Some(limit) = self.shutdown_timeout
                            {
                                kill_at = Some(Instant::now() + limit);
                            }
                        }
                        _ = escalation => {
                            warn!(
                                "[{}] still running {}s after {}, sending SIGKILL",
                                self.name,
                                self.shutdown_timeout.unwrap_or_default().as_secs(),
                                forwarded.unwrap_or(Signal::SIGTERM)
                            );
                            forward_signal(&self.name, pid, Signal::SIGKILL);
                            kill_at = None;
                        }
                    }
                }
            };
            tokio::pin!(stream);
            tokio::pin!(control);

            let mut stream_done = false;
            let exited = loop {
                tokio::select! {
                    () = &mut stream, if !stream_done => stream_done = true,
                    res = &mut control => break res,
                }
            };
            if !stream_done && timeout(OUTPUT_DRAIN_TIMEOUT, &mut stream).await.is_err() {
                debug!("[{name}] output still open after exit, no longer streaming it");
            }
            exited
        };

        // Notices sent after the child closed its output never reached the stream.
        let mut writable = true;
        while let Ok(notice) = notices_rx.try_recv() {
            write_chunk(&name, out, format!("{notice}\n").as_bytes(), &mut writable).await;
        }
        let (status, forwarded) = exited?;

        info!("[{}] exited with {status}", self.name);
        self.transition(SupervisorState::Exited);
        Ok(SupervisorOutcome { status, forwarded })
    }
}

fn output_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    let fds = nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC);
    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    let fds = nix::unistd::pipe();
    fds.map_err(io::Error::from)
}

fn spawn_with_output_pipe(launch: &LaunchCommand) -> io::Result<(Child, pipe::Receiver)> {
    let (read_end, write_end) = output_pipe()?;
    let stderr_end = write_end.try_clone()?;

    // `cmd` owns the parent's copies of the write end; dropping it right after
    // the spawn lets the reader see EOF once the child is gone.
    let child = {
        let mut cmd = Command::new(&launch.program);
        // Own process group: a terminal Ctrl-C reaches the child only through
        // the forwarded signal.
        cmd.args(&launch.args)
            .envs(launch.env.iter().cloned())
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::from(write_end))
            .stderr(Stdio::from(stderr_end))
            .kill_on_drop(true);
        cmd.spawn()?
    };

    let output = pipe::Receiver::from_owned_fd(read_end)?;
    Ok((child, output))
}

fn forward_signal(name: &str, pid: Option<u32>, sig: Signal) {
    let Some(pid) = pid else {
        warn!("[{name}] no pid known, cannot send {sig}");
        return;
    };
    info!("[{name}] sending {sig} to pid {pid}");
    if let Err(e) = signal::kill(Pid::from_raw(pid as i32), sig) {
        warn!("[{name}] failed to send {sig}: {e}");
    }
}

/// Copy the child's output to `out` line by line, interleaving supervisor
/// notices between whole lines. Returns when the pipe reaches EOF.
async fn forward_output<W>(
    name: &str,
    output: pipe::Receiver,
    notices: &mut mpsc::UnboundedReceiver<String>,
    out: &mut W,
) where
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(output);
    let mut line = Vec::new();
    let mut writable = true;

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut line) => match read {
                Ok(0) => break,
                Ok(_) => {
                    if !line.ends_with(b"\n") {
                        line.push(b'\n');
                    }
                    write_chunk(name, out, &line, &mut writable).await;
                    line.clear();
                }
                Err(e) => {
                    warn!("[{name}] failed to read output: {e}");
                    break;
                }
            },
            Some(notice) = notices.recv() => {
                write_chunk(name, out, format!("{notice}\n").as_bytes(), &mut writable).await;
            }
        }
    }
}

/// Keeps draining the pipe after the console fails so the child never blocks.
async fn write_chunk<W>(name: &str, out: &mut W, chunk: &[u8], writable: &mut bool)
where
    W: AsyncWrite + Unpin,
{
    if !*writable {
        return;
    }
    let res = async {
        out.write_all(chunk).await?;
        out.flush().await
    }
    .await;
    if let Err(e) = res {
        warn!("[{name}] console write failed, discarding further output: {e}");
        *writable = false;
    }
}
