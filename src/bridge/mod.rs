// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Execution bridge: runs one adapter operation as an isolated subprocess
//!
//! # Protocol
//!
//! 1. Resolve the operation to its configured command line
//! 2. Build the subprocess environment from the request
//! 3. Create a private temp directory with a named pipe in it
//! 4. Spawn `<command> <args...> <pipe-path>` with stdout/stderr captured
//! 5. Read one JSON document from the pipe until EOF
//! 6. Decode it, or kill the subprocess on any read or decode fault
//! 7. Remove the pipe and directory
//!
//! Nothing is spawned when steps 1 to 3 fail. The temp directory is removed
//! on every path.

pub mod config;
pub mod environment;

#[cfg(unix)]
pub mod channel;
#[cfg(unix)]
pub mod process;

pub use config::{BridgeConfig, LogLevel, Operation, ServerConfig, ServiceConfig, VersionConfig};
pub use environment::build_environment;

#[cfg(unix)]
pub use channel::ResultChannel;
#[cfg(unix)]
pub use process::{AdapterProcess, CapturedOutput, Spawner, SystemSpawner};

#[cfg(unix)]
use crate::error::{AdapterError, Result};
#[cfg(unix)]
use crate::request::AdapterConfig;
#[cfg(unix)]
use channel::{PipeReader, ReadPoll};
#[cfg(unix)]
use std::io;
#[cfg(unix)]
use std::sync::Arc;
#[cfg(unix)]
use std::time::{Duration, Instant};

#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(50);
#[cfg(unix)]
const UNBLOCK_INTERVAL: Duration = Duration::from_millis(25);
#[cfg(unix)]
const UNBLOCK_ATTEMPTS: usize = 200;

/// Decoded adapter output and the status to answer with
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    pub body: serde_json::Value,
    pub status: u16,
}

#[cfg(unix)]
enum Outcome {
    /// Reader finished while the subprocess may still be running
    Read(io::Result<Vec<u8>>),
    /// Subprocess exited; whatever the reader got before EOF
    Exited(std::process::ExitStatus, io::Result<Vec<u8>>),
}

/// Runs adapter operations; cheap to share across request workers
#[cfg(unix)]
#[derive(Clone)]
pub struct ExecutionBridge {
    config: Arc<ServiceConfig>,
    spawner: Arc<dyn Spawner>,
}

#[cfg(unix)]
impl ExecutionBridge {
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self::with_spawner(config, Arc::new(SystemSpawner))
    }

    pub fn with_spawner(config: Arc<ServiceConfig>, spawner: Arc<dyn Spawner>) -> Self {
        Self { config, spawner }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run a routed operation
    pub fn execute(
        &self,
        operation: Operation,
        request: Option<&AdapterConfig>,
    ) -> Result<BridgeResponse> {
        self.run(operation.as_str(), &[], request, operation.success_status())
    }

    /// Run any configured operation.
    ///
    /// `args` go between the configured command line and the pipe path.
    pub fn run(
        &self,
        operation: &str,
        args: &[String],
        request: Option<&AdapterConfig>,
        success_status: u16,
    ) -> Result<BridgeResponse> {
        log::info!("Running operation '{}'", operation);
        if let Some(request) = request {
            log::debug!("Request: {}", request.redacted());
        }

        let mut argv = self.config.command_for(operation)?;
        let env = build_environment(std::env::vars_os(), &self.config.bridge.inherit_env, request);

        let channel = ResultChannel::create(self.config.bridge.temp_dir.as_deref())?;
        argv.extend(args.iter().cloned());
        argv.push(channel.pipe_path().to_string_lossy().into_owned());

        let mut reader = channel.spawn_reader()?;
        let mut process = match self.spawner.spawn(&argv, &env) {
            Ok(process) => process,
            Err(e) => {
                release_reader(&channel, &mut reader);
                close_channel(channel);
                return Err(e);
            }
        };

        let result = self.collect(&channel, &mut reader, &mut process, success_status);
        process.finish();
        close_channel(channel);

        match &result {
            Ok(response) => log::info!("Operation '{}' returned {}", operation, response.status),
            Err(e) => log::warn!("Operation '{}' failed: {}", operation, e),
        }
        result
    }

    fn collect(
        &self,
        channel: &ResultChannel,
        reader: &mut PipeReader,
        process: &mut AdapterProcess,
        success_status: u16,
    ) -> Result<BridgeResponse> {
        let outcome = match self.await_output(channel, reader, process) {
            Ok(outcome) => outcome,
            Err(e) => {
                kill(process);
                release_reader(channel, reader);
                return Err(e);
            }
        };

        let bytes = match outcome {
            Outcome::Exited(status, Ok(bytes)) if bytes.iter().all(u8::is_ascii_whitespace) => {
                return Err(AdapterError::no_result(format!(
                    "adapter exited ({}) without writing a result",
                    status
                )));
            }
            Outcome::Exited(_, Ok(bytes)) | Outcome::Read(Ok(bytes)) => bytes,
            Outcome::Exited(_, Err(e)) | Outcome::Read(Err(e)) => {
                kill(process);
                return Err(AdapterError::subprocess(format!(
                    "error reading results: {}",
                    e
                )));
            }
        };

        let body: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(e) => {
                kill(process);
                return Err(AdapterError::subprocess(format!(
                    "adapter wrote invalid JSON: {}",
                    e
                )));
            }
        };

        let grace = self.config.bridge.exit_grace();
        if process.wait_timeout(grace)?.is_none() {
            log::warn!(
                "Adapter process {} still running {}ms after its result, killing it",
                process.id(),
                grace.as_millis()
            );
            kill(process);
        }

        Ok(BridgeResponse {
            body,
            status: success_status,
        })
    }

    fn await_output(
        &self,
        channel: &ResultChannel,
        reader: &mut PipeReader,
        process: &mut AdapterProcess,
    ) -> Result<Outcome> {
        let started = Instant::now();
        let timeout = self.config.bridge.read_timeout();
        loop {
            if let ReadPoll::Done(outcome) = reader.poll(POLL_INTERVAL) {
                return Ok(Outcome::Read(outcome));
            }
            if let Some(status) = process.try_wait()? {
                log::debug!("Adapter process {} exited ({})", process.id(), status);
                return Ok(Outcome::Exited(status, release_reader(channel, reader)));
            }
            if let Some(timeout) = timeout {
                if started.elapsed() >= timeout {
                    return Err(AdapterError::Timeout {
                        secs: timeout.as_secs(),
                    });
                }
            }
        }
    }
}

/// Let a reader blocked on the pipe finish, returning what it read
#[cfg(unix)]
fn release_reader(channel: &ResultChannel, reader: &mut PipeReader) -> io::Result<Vec<u8>> {
    for _ in 0..UNBLOCK_ATTEMPTS {
        channel.unblock_reader();
        if let ReadPoll::Done(outcome) = reader.poll(UNBLOCK_INTERVAL) {
            return outcome;
        }
    }
    log::error!("Result pipe reader did not finish; abandoning it");
    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        "result pipe reader did not finish",
    ))
}

#[cfg(unix)]
fn kill(process: &mut AdapterProcess) {
    if let Err(e) = process.terminate() {
        log::error!("Failed to kill adapter process {}: {}", process.id(), e);
    }
}

#[cfg(unix)]
fn close_channel(channel: ResultChannel) {
    let dir = channel.dir_path().to_path_buf();
    if let Err(e) = channel.close() {
        log::warn!("Failed to remove {}: {}", dir.display(), e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Spawner that counts calls and delegates to the system
    struct CountingSpawner {
        count: AtomicUsize,
    }

    impl Spawner for CountingSpawner {
        fn spawn(
            &self,
            argv: &[String],
            env: &BTreeMap<String, String>,
        ) -> Result<AdapterProcess> {
            self.count.fetch_add(1, Ordering::SeqCst);
            SystemSpawner.spawn(argv, env)
        }
    }

    struct Fixture {
        work: TempDir,
        channels: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                work: tempfile::tempdir().unwrap(),
                channels: tempfile::tempdir().unwrap(),
            }
        }

        /// Write `script` and configure it as the `collect` command
        fn bridge(&self, script: &str, timeout_secs: u64) -> (ExecutionBridge, Arc<CountingSpawner>) {
            let script_path = self.work.path().join("adapter.sh");
            std::fs::write(&script_path, script).unwrap();

            let mut config = ServiceConfig::default();
            config.commands.insert(
                "collect".into(),
                format!("/bin/sh {}", script_path.display()),
            );
            config.bridge.read_timeout_secs = timeout_secs;
            config.bridge.exit_grace_ms = 200;
            config.bridge.temp_dir = Some(self.channels.path().to_path_buf());

            let spawner = Arc::new(CountingSpawner {
                count: AtomicUsize::new(0),
            });
            let bridge = ExecutionBridge::with_spawner(Arc::new(config), spawner.clone());
            (bridge, spawner)
        }

        fn channels_left(&self) -> usize {
            std::fs::read_dir(self.channels.path()).unwrap().count()
        }

        fn pid_file(&self) -> String {
            self.work.path().join("pid").display().to_string()
        }
    }

    fn request() -> AdapterConfig {
        AdapterConfig::from_body(
            br#"{"adapterKey": {"adapterKind": "X", "objectKind": "X_instance",
                 "identifiers": [{"key": "host", "value": "h1"}]}}"#,
        )
        .unwrap()
    }

    fn process_gone(pid_file: &str) -> bool {
        let pid: i32 = std::fs::read_to_string(pid_file).unwrap().trim().parse().unwrap();
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None) == Err(nix::errno::Errno::ESRCH)
    }

    #[test]
    fn test_successful_collect() {
        let fixture = Fixture::new();
        let (bridge, spawner) = fixture.bridge(
            r#"printf '{"result":[],"kind":"%s","host":"%s"}' "$ADAPTER_KIND" "$HOST" > "$1""#,
            10,
        );
        let response = bridge.execute(Operation::Collect, Some(&request())).unwrap();
        assert_eq!(response.status, 202);
        assert_eq!(response.body["kind"], "X");
        assert_eq!(response.body["host"], "h1");
        assert_eq!(spawner.count.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.channels_left(), 0);
    }

    #[test]
    fn test_unknown_operation_spawns_nothing() {
        let fixture = Fixture::new();
        let (bridge, spawner) = fixture.bridge("exit 0", 10);
        let err = bridge.run("scan", &[], Some(&request()), 200).unwrap_err();
        assert!(matches!(err, AdapterError::Configuration(_)));
        assert_eq!(spawner.count.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.channels_left(), 0);
    }

    #[test]
    fn test_channel_failure_spawns_nothing() {
        let mut config = ServiceConfig::default();
        config.commands.insert("collect".into(), "/bin/true".into());
        config.bridge.temp_dir = Some(Path::new("/nonexistent/adapter/root").to_path_buf());
        let spawner = Arc::new(CountingSpawner {
            count: AtomicUsize::new(0),
        });
        let bridge = ExecutionBridge::with_spawner(Arc::new(config), spawner.clone());
        let err = bridge.execute(Operation::Collect, None).unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
        assert_eq!(err.public_message(), "Error initializing adapter communication");
        assert_eq!(spawner.count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_json_kills_adapter_and_cleans_up() {
        let fixture = Fixture::new();
        let script = format!(
            "echo $$ > {}\nprintf 'not json' > \"$1\"\nexec sleep 30\n",
            fixture.pid_file()
        );
        let (bridge, _) = fixture.bridge(&script, 10);
        let started = Instant::now();
        let err = bridge.execute(Operation::Collect, Some(&request())).unwrap_err();
        assert!(matches!(err, AdapterError::Subprocess { .. }));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), crate::error::GENERIC_SERVER_ERROR);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(process_gone(&fixture.pid_file()));
        assert_eq!(fixture.channels_left(), 0);
    }

    #[test]
    fn test_exit_without_result() {
        let fixture = Fixture::new();
        let (bridge, _) = fixture.bridge("echo failing >&2\nexit 3\n", 10);
        let err = bridge.execute(Operation::Collect, Some(&request())).unwrap_err();
        assert!(err.is_no_result());
        assert_eq!(err.public_message(), crate::error::NO_RESULT_FROM_ADAPTER);
        assert_eq!(fixture.channels_left(), 0);
    }

    #[test]
    fn test_stdout_is_not_the_result_channel() {
        let fixture = Fixture::new();
        let (bridge, _) = fixture.bridge("printf '{\"result\":[]}'\nexit 0\n", 10);
        let err = bridge.execute(Operation::Collect, Some(&request())).unwrap_err();
        assert!(err.is_no_result());
        assert_eq!(fixture.channels_left(), 0);
    }

    #[test]
    fn test_silent_adapter_times_out() {
        let fixture = Fixture::new();
        let script = format!("echo $$ > {}\nexec sleep 30\n", fixture.pid_file());
        let (bridge, _) = fixture.bridge(&script, 1);
        let started = Instant::now();
        let err = bridge.execute(Operation::Collect, Some(&request())).unwrap_err();
        assert!(matches!(err, AdapterError::Timeout { secs: 1 }));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(process_gone(&fixture.pid_file()));
        assert_eq!(fixture.channels_left(), 0);
    }

    #[test]
    fn test_lingering_adapter_killed_after_grace() {
        let fixture = Fixture::new();
        let script = format!(
            "echo $$ > {}\nprintf '{{}}' > \"$1\"\nexec sleep 30\n",
            fixture.pid_file()
        );
        let (bridge, _) = fixture.bridge(&script, 10);
        let response = bridge.execute(Operation::Collect, Some(&request())).unwrap();
        assert_eq!(response.body, serde_json::json!({}));
        assert!(process_gone(&fixture.pid_file()));
    }

    #[test]
    fn test_extra_args_precede_pipe() {
        let fixture = Fixture::new();
        let (bridge, _) = fixture.bridge(r#"printf '{"arg":"%s"}' "$1" > "$2""#, 10);
        let response = bridge
            .run("collect", &["--verbose".to_string()], None, 200)
            .unwrap();
        assert_eq!(response.body["arg"], "--verbose");
        assert_eq!(response.status, 200);
    }
}
