// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Events raised against monitored objects

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::num::NonZeroU32;

/// Event criticality, serialized as its numeric level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Criticality {
    #[default]
    None = 0,
    Info = 1,
    Warning = 2,
    Immediate = 3,
    Critical = 4,
    Automatic = 5,
}

impl Criticality {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Criticality::None),
            1 => Some(Criticality::Info),
            2 => Some(Criticality::Warning),
            3 => Some(Criticality::Immediate),
            4 => Some(Criticality::Critical),
            5 => Some(Criticality::Automatic),
            _ => None,
        }
    }
}

impl Serialize for Criticality {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Criticality {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let level = u8::deserialize(deserializer)?;
        Criticality::from_level(level)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid criticality {}", level)))
    }
}

fn one_cycle() -> NonZeroU32 {
    NonZeroU32::MIN
}

fn three_cycles() -> NonZeroU32 {
    NonZeroU32::new(3).unwrap_or(NonZeroU32::MIN)
}

/// An event on a monitored object.
///
/// Only `message` is required. Dates are milliseconds since the epoch and are
/// omitted from the wire format when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub message: String,
    #[serde(default)]
    pub criticality: Criticality,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fault_key: Option<String>,
    #[serde(default = "default_auto_cancel")]
    pub auto_cancel: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub update_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cancel_date: Option<i64>,
    /// Collections the event must be present in before it is surfaced
    #[serde(default = "one_cycle")]
    pub watch_wait_cycle: NonZeroU32,
    /// Collections the event must be absent from before it is removed
    #[serde(default = "three_cycles")]
    pub cancel_wait_cycle: NonZeroU32,
}

fn default_auto_cancel() -> bool {
    true
}

impl Event {
    pub fn new(message: impl Into<String>, criticality: Criticality) -> Self {
        Self {
            message: message.into(),
            criticality,
            fault_key: None,
            auto_cancel: true,
            start_date: None,
            update_date: None,
            cancel_date: None,
            watch_wait_cycle: one_cycle(),
            cancel_wait_cycle: three_cycles(),
        }
    }

    pub fn fault_key(mut self, fault_key: impl Into<String>) -> Self {
        self.fault_key = Some(fault_key.into());
        self
    }

    pub fn auto_cancel(mut self, auto_cancel: bool) -> Self {
        self.auto_cancel = auto_cancel;
        self
    }

    pub fn start_date(mut self, millis: i64) -> Self {
        self.start_date = Some(millis);
        self
    }

    pub fn update_date(mut self, millis: i64) -> Self {
        self.update_date = Some(millis);
        self
    }

    pub fn cancel_date(mut self, millis: i64) -> Self {
        self.cancel_date = Some(millis);
        self
    }

    pub fn watch_wait_cycle(mut self, cycles: NonZeroU32) -> Self {
        self.watch_wait_cycle = cycles;
        self
    }

    pub fn cancel_wait_cycle(mut self, cycles: NonZeroU32) -> Self {
        self.cancel_wait_cycle = cycles;
        self
    }

    /// Set both wait cycles from plain integers; both must be at least 1
    pub fn with_wait_cycles(self, watch: u32, cancel: u32) -> Result<Self> {
        let watch = NonZeroU32::new(watch)
            .ok_or_else(|| AdapterError::InvalidValue("watch_wait_cycle must be >= 1".into()))?;
        let cancel = NonZeroU32::new(cancel)
            .ok_or_else(|| AdapterError::InvalidValue("cancel_wait_cycle must be >= 1".into()))?;
        Ok(self.watch_wait_cycle(watch).cancel_wait_cycle(cancel))
    }
}
