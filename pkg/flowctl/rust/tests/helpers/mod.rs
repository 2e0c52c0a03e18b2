// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type Lines = Arc<Mutex<Vec<String>>>;

/// Handle to a running `flowctl` invocation.
pub struct CliHandle {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines,
    stderr: Lines,
    readers: Vec<std::thread::JoinHandle<()>>,
}

fn spawn_reader<R: Read + Send + 'static>(
    source: R,
    tag: &'static str,
    lines: Lines,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let reader = BufReader::new(source);
        for line in reader.lines() {
            match line {
                Ok(l) => {
                    eprintln!("[flowctl:{tag}] {l}");
                    lines.lock().unwrap().push(l);
                }
                Err(_) => break,
            }
        }
    })
}

impl CliHandle {
    /// Run `flowctl <args>` with `FLOWCTL_SETTINGS` pointing at `settings`.
    pub fn start(settings: &Path, args: &[&str]) -> Self {
        Self::start_with_env(settings, args, &[])
    }

    pub fn start_with_env(settings: &Path, args: &[&str], env: &[(&str, &str)]) -> Self {
        Self::spawn(Command::new(env!("CARGO_BIN_EXE_flowctl")), settings, args, env)
    }

    /// Run `flowctl` as the leader of its own process group, the way a shell
    /// starts a foreground job, so `interrupt_job` reaches the whole job.
    pub fn start_as_job(settings: &Path, args: &[&str]) -> Self {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_flowctl"));
        cmd.process_group(0);
        Self::spawn(cmd, settings, args, &[])
    }

    fn spawn(mut cmd: Command, settings: &Path, args: &[&str], env: &[(&str, &str)]) -> Self {
        cmd.args(args)
            .env("FLOWCTL_SETTINGS", settings)
            .env("FLOWCTL_LOG", "info")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, _) in std::env::vars() {
            if key.starts_with("FLOWCTL_") && key != "FLOWCTL_SETTINGS" && key != "FLOWCTL_LOG" {
                cmd.env_remove(key);
            }
        }
        cmd.envs(env.iter().copied());
        let mut child = cmd.spawn().expect("failed to start flowctl");

        let stdin = child.stdin.take();
        let stdout_pipe = child.stdout.take().expect("failed to capture stdout");
        let stderr_pipe = child.stderr.take().expect("failed to capture stderr");
        let stdout = Lines::default();
        let stderr = Lines::default();

        // Console output goes to stdout, log records to stderr.
        let readers = vec![
            spawn_reader(stdout_pipe, "out", Arc::clone(&stdout)),
            spawn_reader(stderr_pipe, "err", Arc::clone(&stderr)),
        ];

        Self {
            child,
            stdin,
            stdout,
            stderr,
            readers,
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Write `input` to the process's stdin, then close it.
    pub fn answer(&mut self, input: &str) {
        let mut stdin = self.stdin.take().expect("stdin already closed");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to flowctl stdin");
    }

    /// Close stdin without writing anything.
    pub fn close_stdin(&mut self) {
        self.stdin.take();
    }

    pub fn send_signal(&self, sig: Signal) {
        let pid = self.child.id() as i32;
        signal::kill(Pid::from_raw(pid), sig).expect("failed to send signal to flowctl");
    }

    /// Send `sig` to every process in the job's group, like a terminal Ctrl-C.
    pub fn interrupt_job(&self, sig: Signal) {
        let pgid = self.child.id() as i32;
        signal::killpg(Pid::from_raw(pgid), sig).expect("failed to signal flowctl's group");
    }

    /// Wait until a stdout line containing `pattern` appears, or timeout.
    pub fn wait_for_output(&self, pattern: &str, timeout: Duration) -> bool {
        wait_for_line(&self.stdout, pattern, timeout)
    }

    pub fn wait_for_output_default(&self, pattern: &str) -> bool {
        self.wait_for_output(pattern, DEFAULT_TIMEOUT)
    }

    pub fn stdout_lines(&self) -> Vec<String> {
        self.stdout.lock().unwrap().clone()
    }

    pub fn stderr_lines(&self) -> Vec<String> {
        self.stderr.lock().unwrap().clone()
    }

    pub fn stdout_contains(&self, pattern: &str) -> bool {
        self.stdout_lines().iter().any(|l| l.contains(pattern))
    }

    pub fn stderr_contains(&self, pattern: &str) -> bool {
        self.stderr_lines().iter().any(|l| l.contains(pattern))
    }

    /// Wait for the process to exit, then for its output to be fully read.
    pub fn wait_with_timeout(&mut self, timeout: Duration) -> ExitStatus {
        self.stdin.take();
        let deadline = Instant::now() + timeout;
        let status = loop {
            match self
                .child
                .try_wait()
                .expect("failed to check flowctl status")
            {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        self.child.kill().ok();
                        break self.child.wait().expect("failed to wait on killed flowctl");
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        };
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        status
    }

    pub fn wait(&mut self) -> ExitStatus {
        self.wait_with_timeout(DEFAULT_TIMEOUT)
    }
}

impl Drop for CliHandle {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn wait_for_line(lines: &Lines, pattern: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        {
            let lines = lines.lock().unwrap();
            if lines.iter().any(|l| l.contains(pattern)) {
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Write `settings.yaml` into `dir` and return its path.
pub fn write_settings(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("settings.yaml");
    std::fs::write(&path, yaml)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    path
}

/// Write an executable shell script into `dir` and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}"))
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .unwrap_or_else(|e| panic!("failed to chmod {}: {e}", path.display()));
    path
}

/// Script that appends its arguments, one invocation per line, to `log`.
pub fn recording_script(dir: &Path, name: &str, log: &Path) -> PathBuf {
    write_script(
        dir,
        name,
        &format!(
            "echo \"$* url=$FLOWCTL_API_DATABASE_CONNECTION_URL\" >> '{}'\n",
            log.display()
        ),
    )
}

/// Lines recorded by a `recording_script`, empty when it never ran.
pub fn recorded(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn pid_is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}
