// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Error types for the adapter bridge

use std::io;
use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Message returned to callers when a subprocess fault must not leak details
pub const GENERIC_SERVER_ERROR: &str = "Unknown server error";

/// Message returned when the adapter exited without writing a result
pub const NO_RESULT_FROM_ADAPTER: &str = "No result from adapter";

/// Main error type for the adapter bridge
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Malformed or missing request body
    #[error("Invalid request: {0}")]
    ClientInput(String),

    /// Unknown operation or unusable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Result channel (temp dir / named pipe) could not be set up
    #[error("Error initializing adapter communication: {0}")]
    Transport(String),

    /// Adapter subprocess failed, produced no result, or produced malformed output
    #[error("Adapter subprocess error: {detail}")]
    Subprocess {
        /// Message safe to hand back to the caller
        public: &'static str,
        /// Full cause, for the log only
        detail: String,
    },

    /// Adapter did not deliver a result within the configured wait
    #[error("Adapter did not respond within {secs}s")]
    Timeout { secs: u64 },

    /// Identifiers with the same key disagree on `is_part_of_uniqueness`
    #[error("Identifier '{0}' has an inconsistent uniqueness attribute")]
    IdentifierUniqueness(String),

    /// A different object already occupies this identity in the result
    #[error("A different object with key {0} already exists")]
    DuplicateIdentity(String),

    /// Result was already written to its channel
    #[error("Result already sent")]
    AlreadySent,

    /// Invalid value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nix error (Unix)
    #[cfg(unix)]
    #[error("Nix error: {0}")]
    Nix(#[from] nix::Error),
}

impl AdapterError {
    /// Subprocess fault with the generic public message
    pub fn subprocess(detail: impl Into<String>) -> Self {
        AdapterError::Subprocess {
            public: GENERIC_SERVER_ERROR,
            detail: detail.into(),
        }
    }

    /// Subprocess exited without writing anything to the result channel
    pub fn no_result(detail: impl Into<String>) -> Self {
        AdapterError::Subprocess {
            public: NO_RESULT_FROM_ADAPTER,
            detail: detail.into(),
        }
    }

    /// HTTP status the front end answers with for this fault
    pub fn status_code(&self) -> u16 {
        match self {
            AdapterError::ClientInput(_) => 400,
            _ => 500,
        }
    }

    /// Plain-text message that may be returned to the caller
    pub fn public_message(&self) -> String {
        match self {
            AdapterError::ClientInput(msg) => msg.clone(),
            AdapterError::Transport(_) => "Error initializing adapter communication".to_string(),
            AdapterError::Subprocess { public, .. } => (*public).to_string(),
            AdapterError::Timeout { .. } => NO_RESULT_FROM_ADAPTER.to_string(),
            _ => GENERIC_SERVER_ERROR.to_string(),
        }
    }

    /// True if the adapter ran but produced nothing on the result channel
    pub fn is_no_result(&self) -> bool {
        matches!(
            self,
            AdapterError::Subprocess {
                public: NO_RESULT_FROM_ADAPTER,
                ..
            }
        )
    }
}
