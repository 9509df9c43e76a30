// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Identifiers: key/value pairs that identify an object

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A piece of data that identifies an object.
///
/// When `is_part_of_uniqueness` is false the value may change over time
/// without creating a new object; such identifiers are carried for display
/// but take no part in identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub key: String,
    pub value: String,
    #[serde(default = "default_uniqueness")]
    pub is_part_of_uniqueness: bool,
}

fn default_uniqueness() -> bool {
    true
}

/// Hashable projection of an identifier.
///
/// `(key, true, value)` for unique identifiers, `(key, false)` otherwise, so
/// a non-unique identifier never collides with a unique one whose value
/// happens to be "false".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentifierKey {
    Unique { key: String, value: String },
    NonUnique { key: String },
}

impl Identifier {
    /// Create an identifier that is part of the object's uniqueness
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_uniqueness(key, value, true)
    }

    /// Create an identifier with an explicit uniqueness flag
    pub fn with_uniqueness(
        key: impl Into<String>,
        value: impl Into<String>,
        is_part_of_uniqueness: bool,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            is_part_of_uniqueness,
        }
    }

    /// Create an identifier that does not take part in identity
    pub fn non_unique(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_uniqueness(key, value, false)
    }

    pub fn identity_key(&self) -> IdentifierKey {
        if self.is_part_of_uniqueness {
            IdentifierKey::Unique {
                key: self.key.clone(),
                value: self.value.clone(),
            }
        } else {
            IdentifierKey::NonUnique {
                key: self.key.clone(),
            }
        }
    }

    /// Compare two identifiers.
    ///
    /// Fails with [`AdapterError::IdentifierUniqueness`] when both carry the
    /// same key but disagree on `is_part_of_uniqueness`.
    pub fn try_eq(&self, other: &Identifier) -> Result<bool> {
        if self.key == other.key && self.is_part_of_uniqueness != other.is_part_of_uniqueness {
            return Err(AdapterError::IdentifierUniqueness(self.key.clone()));
        }
        Ok(self.identity_key() == other.identity_key())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_part_of_uniqueness { "*" } else { "" };
        write!(f, "{}{}:{}", self.key, marker, self.value)
    }
}
