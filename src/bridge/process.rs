// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Adapter subprocess spawning and supervision

use crate::error::{AdapterError, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::collections::BTreeMap;
use std::io::Read;
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const DRAIN_WAIT: Duration = Duration::from_millis(500);

/// Starts adapter subprocesses.
///
/// `argv[0]` is the program; the environment replaces the parent's entirely.
pub trait Spawner: Send + Sync {
    fn spawn(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<AdapterProcess>;
}

/// Spawns real OS processes with stdout and stderr captured
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<AdapterProcess> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| AdapterError::Configuration("empty command line".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AdapterError::subprocess(format!("cannot start {}: {}", program, e)))?;

        log::debug!("Started adapter process {} ({:?})", child.id(), argv);
        let stdout = child.stdout.take().map(drain::<ChildStdout>);
        let stderr = child.stderr.take().map(drain::<ChildStderr>);

        Ok(AdapterProcess {
            child,
            stdout,
            stderr,
            reaped: None,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        // partial output is still useful for diagnostics
        let _ = stream.read_to_end(&mut buf);
        buf
    })
}

fn collect_stream(handle: Option<JoinHandle<Vec<u8>>>, deadline: Instant) -> Option<String> {
    let handle = handle?;
    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    if !handle.is_finished() {
        log::debug!("Adapter output stream still open; not waiting for it");
        return None;
    }
    handle
        .join()
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Diagnostic output of a finished subprocess
#[derive(Debug, Default, Clone)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A running adapter subprocess.
///
/// Dropping an unreaped process kills and reaps it.
#[derive(Debug)]
pub struct AdapterProcess {
    child: Child,
    stdout: Option<JoinHandle<Vec<u8>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    reaped: Option<ExitStatus>,
}

impl AdapterProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Exit status if the process has exited, without blocking
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if let Some(status) = self.reaped {
            return Ok(Some(status));
        }
        let status = self.child.try_wait()?;
        self.reaped = status;
        Ok(status)
    }

    /// Poll for exit for at most `timeout`
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Send SIGKILL and reap
    pub fn terminate(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.reaped {
            return Ok(status);
        }
        match kill(Pid::from_raw(self.child.id() as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => return Err(e.into()),
        }
        let status = self.child.wait()?;
        log::debug!("Killed adapter process {} ({})", self.child.id(), status);
        self.reaped = Some(status);
        Ok(status)
    }

    /// Collect stdout and stderr once the process has exited.
    ///
    /// Streams still held open by a grandchild are abandoned after a short
    /// wait.
    pub fn finish(&mut self) -> CapturedOutput {
        let deadline = Instant::now() + DRAIN_WAIT;
        let output = CapturedOutput {
            stdout: collect_stream(self.stdout.take(), deadline).unwrap_or_default(),
            stderr: collect_stream(self.stderr.take(), deadline).unwrap_or_default(),
        };
        if !output.stdout.trim().is_empty() {
            log::debug!("Adapter stdout:\n{}", output.stdout.trim_end());
        }
        if !output.stderr.trim().is_empty() {
            log::warn!("Adapter stderr:\n{}", output.stderr.trim_end());
        }
        output
    }
}

impl Drop for AdapterProcess {
    fn drop(&mut self) {
        if self.reaped.is_none() {
            if let Err(e) = self.terminate() {
                log::error!("Failed to kill adapter process {}: {}", self.child.id(), e);
            }
        }
    }
}
