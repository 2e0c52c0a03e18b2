// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use tokio::task::JoinError;

/// Run `f` on the blocking thread pool and await its result.
///
/// The caller's runtime keeps polling other tasks (signal handlers
/// included) while `f` runs. The callee's `Result` is returned as is; a
/// panic inside `f` resumes unwinding on the calling task.
pub async fn run_blocking<F, T, E>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(E::from(e)),
    }
}
