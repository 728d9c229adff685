//! Engine process invocation

use crate::error::{EngineError, Result};
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// One engine command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to run
    pub program: String,
    /// Arguments after the program
    pub args: Vec<String>,
    /// Kill the process if it runs longer than this
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command line as a single string, for logs and errors
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` if the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut combined = self.stdout_lossy();
        combined.push_str(&String::from_utf8_lossy(&self.stderr));
        combined
    }
}

/// Runs engine command lines.
///
/// Implementations return `Ok` for any process that ran, whatever its exit
/// code, [`EngineError::Launch`] if it could not be started, and
/// [`EngineError::Timeout`] if it overran [`Invocation::timeout`].
pub trait CommandRunner: Send + Sync + 'static {
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<ProcessOutput>> + Send;
}

/// [`CommandRunner`] spawning real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match invocation.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| EngineError::Timeout {
                    command: invocation.command_line(),
                    timeout: limit,
                })?,
            None => command.output().await,
        }
        .map_err(|source| EngineError::Launch {
            command: invocation.command_line(),
            source,
        })?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
