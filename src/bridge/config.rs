// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Front-end configuration
//!
//! Loaded once at startup from TOML and shared read-only afterwards.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Operations the front end knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Collect,
    Test,
    EndpointUrls,
    AdapterDefinition,
}

impl Operation {
    /// Name of the operation in the `[commands]` table
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Collect => "collect",
            Operation::Test => "test",
            Operation::EndpointUrls => "endpoint_urls",
            Operation::AdapterDefinition => "adapter_definition",
        }
    }

    /// Status answered when the adapter delivers a result
    pub fn success_status(self) -> u16 {
        match self {
            Operation::Collect | Operation::Test => 202,
            Operation::EndpointUrls | Operation::AdapterDefinition => 200,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Largest accepted request body in bytes
    pub max_body_size: usize,
    pub request_logging: bool,
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 8080,
            max_body_size: 1024 * 1024,
            request_logging: true,
            log_level: LogLevel::Info,
        }
    }
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Adapter version reported by `/version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    pub major: u32,
    pub minor: u32,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self { major: 1, minor: 0 }
    }
}

/// Subprocess supervision settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Longest wait for the adapter's result; 0 waits forever
    pub read_timeout_secs: u64,
    /// How long a subprocess may linger after delivering its result
    pub exit_grace_ms: u64,
    /// Parent directory for per-invocation channel directories
    pub temp_dir: Option<PathBuf>,
    /// Front-end environment variables passed through to the adapter
    pub inherit_env: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: 300,
            exit_grace_ms: 2000,
            temp_dir: None,
            inherit_env: vec!["PATH".into()],
        }
    }
}

impl BridgeConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }

    pub fn exit_grace(&self) -> Duration {
        Duration::from_millis(self.exit_grace_ms)
    }
}

/// Complete front-end configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    /// Operation name -> command line
    pub commands: BTreeMap<String, String>,
    pub version: VersionConfig,
    pub bridge: BridgeConfig,
}

impl ServiceConfig {
    /// Load from TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AdapterError::Configuration(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((name, _)) = self.commands.iter().find(|(_, cmd)| cmd.trim().is_empty()) {
            return Err(AdapterError::Configuration(format!(
                "command for operation '{}' is empty",
                name
            )));
        }
        if self.server.max_body_size == 0 {
            return Err(AdapterError::Configuration(
                "max_body_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Command line configured for `operation`, split on whitespace
    pub fn command_for(&self, operation: &str) -> Result<Vec<String>> {
        let command = self.commands.get(operation).ok_or_else(|| {
            AdapterError::Configuration(format!("no command configured for operation '{}'", operation))
        })?;
        let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            return Err(AdapterError::Configuration(format!(
                "command for operation '{}' is empty",
                operation
            )));
        }
        Ok(argv)
    }

    /// `"major.minor"` as reported by `/version`
    pub fn version_string(&self) -> String {
        format!("{}.{}", self.version.major, self.version.minor)
    }

    /// Generate sample config
    pub fn sample_toml() -> String {
        r#"# Adapter bridge configuration

[server]
bind_address = "0.0.0.0"
port = 8080
max_body_size = 1048576
request_logging = true
log_level = "Info"

# Command line per operation; the result pipe path is appended as the last argument
[commands]
collect = "python3 app/adapter.py collect"
test = "python3 app/adapter.py test"
endpoint_urls = "python3 app/adapter.py endpoint_urls"
adapter_definition = "python3 app/adapter.py adapter_definition"

[version]
major = 1
minor = 0

[bridge]
# 0 waits for the adapter forever
read_timeout_secs = 300
exit_grace_ms = 2000
# temp_dir = "/var/tmp/adapter"
inherit_env = ["PATH"]
"#
        .into()
    }
}
