// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Metric data points and property values

use serde::{Deserialize, Serialize};

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A numeric data point at a point in time, stored as time series data.
///
/// Examples: CPU utilization, disk capacity, session count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub key: String,
    #[serde(rename = "numberValue")]
    pub value: f64,
    /// Milliseconds since the epoch
    pub timestamp: i64,
}

impl Metric {
    /// Metric stamped with the current time
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self::at(key, value, now_millis())
    }

    pub fn at(key: impl Into<String>, value: f64, timestamp: i64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp,
        }
    }
}

/// Property value, string or numeric, chosen at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "numberValue")]
    Number(f64),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::String(_) => None,
            PropertyValue::Number(n) => Some(*n),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value as f64)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Number(value as f64)
    }
}

/// A value that changes infrequently; only the latest value matters.
///
/// Examples: IP address, software version, core count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    #[serde(flatten)]
    pub value: PropertyValue,
    /// Milliseconds since the epoch
    pub timestamp: i64,
}

impl Property {
    /// Property stamped with the current time
    pub fn new(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::at(key, value, now_millis())
    }

    pub fn at(key: impl Into<String>, value: impl Into<PropertyValue>, timestamp: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            timestamp,
        }
    }
}
