//! Error types for ctharness

use std::time::Duration;
use thiserror::Error;

/// Result type for ctharness operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while driving a container engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {}: {stderr}", exit_label(*.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to create container {name}:\n{stderr}")]
    CreateFailed { name: String, stderr: String },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("wait result was dropped before it was delivered")]
    WaitAborted,

    #[error("Harness error: {0}")]
    Harness(String),
}

impl EngineError {
    /// Exit code of the engine process, when it ran and reported one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            EngineError::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "termination by signal".to_string(),
    }
}
