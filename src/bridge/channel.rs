// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Per-invocation result channel: a private temp directory holding a named pipe
//!
//! The directory (and the pipe in it) is removed when the channel is dropped,
//! on every exit path.

use crate::error::{AdapterError, Result};
use nix::sys::stat::Mode;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;
use tempfile::TempDir;

const PIPE_NAME: &str = "output_pipe";

/// Temp directory + named pipe for one adapter invocation
#[derive(Debug)]
pub struct ResultChannel {
    dir: TempDir,
    pipe: PathBuf,
}

impl ResultChannel {
    /// Create a uniquely named directory under `parent` (or the system temp
    /// dir) with a named pipe inside it.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("adapter-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| AdapterError::Transport(format!("cannot create temp directory: {}", e)))?;

        let pipe = dir.path().join(PIPE_NAME);
        nix::unistd::mkfifo(&pipe, Mode::S_IRUSR | Mode::S_IWUSR).map_err(|e| {
            AdapterError::Transport(format!("cannot create pipe {}: {}", pipe.display(), e))
        })?;
        log::debug!("Created result pipe {}", pipe.display());

        Ok(Self { dir, pipe })
    }

    pub fn pipe_path(&self) -> &Path {
        &self.pipe
    }

    pub fn dir_path(&self) -> &Path {
        self.dir.path()
    }

    /// Start a thread that opens the pipe and reads it to EOF
    pub fn spawn_reader(&self) -> Result<PipeReader> {
        let (tx, rx) = mpsc::channel();
        let path = self.pipe.clone();
        let handle = std::thread::Builder::new()
            .name("result-pipe-reader".into())
            .spawn(move || {
                let outcome = File::open(&path).and_then(|mut file| {
                    let mut buf = Vec::new();
                    file.read_to_end(&mut buf).map(|_| buf)
                });
                // receiver may be gone after a timeout
                let _ = tx.send(outcome);
            })
            .map_err(|e| AdapterError::Transport(format!("cannot start pipe reader: {}", e)))?;
        Ok(PipeReader {
            rx,
            handle: Some(handle),
        })
    }

    /// Open and immediately close the write end so a reader blocked in
    /// `open` sees EOF. Returns false if no reader had the pipe open.
    pub fn unblock_reader(&self) -> bool {
        OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.pipe)
            .is_ok()
    }

    /// Remove the pipe and directory, reporting failures
    pub fn close(self) -> Result<()> {
        let dir = self.dir.path().to_path_buf();
        self.dir.close()?;
        log::debug!("Removed result channel {}", dir.display());
        Ok(())
    }
}

/// Outcome of one poll of the reader thread
#[derive(Debug)]
pub enum ReadPoll {
    /// Reader finished: the bytes up to EOF, or the I/O error it hit
    Done(io::Result<Vec<u8>>),
    Pending,
}

/// Handle to the thread reading the result pipe
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<io::Result<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl PipeReader {
    pub fn poll(&mut self, wait: Duration) -> ReadPoll {
        match self.rx.recv_timeout(wait) {
            Ok(outcome) => {
                self.join();
                ReadPoll::Done(outcome)
            }
            Err(RecvTimeoutError::Timeout) => ReadPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => {
                self.join();
                ReadPoll::Done(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "pipe reader exited without a result",
                )))
            }
        }
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Result pipe reader panicked");
            }
        }
    }
}
