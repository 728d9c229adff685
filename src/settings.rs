//! Engine settings
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! the environment. The file is read from `CTHARNESS_CONFIG` when set, and
//! from `<config dir>/ctharness/config.yaml` otherwise. A missing file is not
//! an error.
//!
//! ```yaml
//! tool: docker
//! log_commands: true
//! create_retry_delay_secs: 5
//! ```

use crate::engine::ContainerTool;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable selecting the engine binary
pub const ENV_TOOL: &str = "COMMAND";
/// Environment variable enabling command logging
pub const ENV_LOG_COMMANDS: &str = "TEST_LOG_CONTAINER_COMMANDS";
/// Environment variable pointing at a settings file
pub const ENV_CONFIG_PATH: &str = "CTHARNESS_CONFIG";

/// Version reported when the engine version cannot be detected
pub const DEFAULT_VERSION_FALLBACK: &str = "0.0.0";
/// Delay before the single `create` retry
pub const DEFAULT_CREATE_RETRY_DELAY_SECS: u64 = 5;

/// Settings for a [`ContainerClient`](crate::engine::ContainerClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Engine binary to drive
    pub tool: ContainerTool,
    /// Log every engine invocation at info level
    pub log_commands: bool,
    /// Seconds to wait before retrying a failed `create`
    pub create_retry_delay_secs: u64,
    /// Version string used when detection fails
    pub version_fallback: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tool: ContainerTool::Podman,
            log_commands: false,
            create_retry_delay_secs: DEFAULT_CREATE_RETRY_DELAY_SECS,
            version_fallback: DEFAULT_VERSION_FALLBACK.to_string(),
        }
    }
}

impl EngineSettings {
    /// Load settings from the settings file (if any) and the process environment
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();

        let mut settings = match settings_path(&lookup) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_env(lookup)?;
        Ok(settings)
    }

    /// Defaults overlaid with variables resolved through `lookup`
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        settings.apply_env(lookup)?;
        Ok(settings)
    }

    /// Parse a YAML settings file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML settings
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| EngineError::Yaml(e.to_string()))
    }

    /// Overlay environment variables resolved through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tool) = lookup(ENV_TOOL) {
            self.tool = tool.parse()?;
        }
        if let Some(flag) = lookup(ENV_LOG_COMMANDS) {
            self.log_commands = flag.trim().eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    /// Delay before the `create` retry
    pub fn create_retry_delay(&self) -> Duration {
        Duration::from_secs(self.create_retry_delay_secs)
    }
}

fn settings_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("ctharness").join("config.yaml"))
}
