// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Adapter side of the result channel
//!
//! The bridge always passes the path of the result pipe as the last
//! command-line argument. The adapter writes exactly one JSON document to it
//! and closes it.

use crate::error::{AdapterError, Result};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Path of the result pipe taken from the process arguments
pub fn output_pipe_from_args() -> Result<PathBuf> {
    last_arg(std::env::args().skip(1))
}

fn last_arg(args: impl IntoIterator<Item = String>) -> Result<PathBuf> {
    args.into_iter()
        .last()
        .map(PathBuf::from)
        .ok_or_else(|| AdapterError::ClientInput("missing result pipe argument".to_string()))
}

/// Write one JSON document to `path`.
///
/// Opening a named pipe for writing blocks until the reader has opened it.
pub fn write_to_pipe<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    log::debug!("Output pipe: {}", path.display());
    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush()?;
    log::debug!("Finished writing results to output pipe");
    Ok(())
}

/// Read one JSON document from `path` until EOF
pub fn read_from_pipe(path: &Path) -> Result<serde_json::Value> {
    log::debug!("Input pipe: {}", path.display());
    let mut buf = Vec::new();
    File::open(path)?.read_to_end(&mut buf)?;
    Ok(serde_json::from_slice(&buf)?)
}

/// Output channel of one adapter invocation; accepts a single document
#[derive(Debug)]
pub struct OutputPipe {
    path: PathBuf,
    sent: bool,
}

impl OutputPipe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sent: false,
        }
    }

    /// Pipe named by the last process argument
    pub fn from_args() -> Result<Self> {
        output_pipe_from_args().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Write `value`; any later call fails with [`AdapterError::AlreadySent`].
    pub fn send<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if self.sent {
            return Err(AdapterError::AlreadySent);
        }
        self.sent = true;
        write_to_pipe(&self.path, value)
    }
}
