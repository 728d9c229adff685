//! Container engine client
//!
//! Drives the `docker` or `podman` command-line tool. Every operation is one
//! invocation of the engine binary:
//!
//! ```text
//! config ──► args (argv) ──► process (spawn) ──► parse (typed result)
//! ```
//!
//! [`ContainerClient`] composes the three stages and implements
//! [`ContainerInterface`], which the [`harness`](crate::harness) helpers are
//! written against.

pub mod args;
pub mod client;
pub mod parse;
pub mod process;
pub mod vocab;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{detect_tool_version, ContainerClient, ExecOutput};
pub use process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
pub use vocab::{CONTAINER_STATE_NOT_RUNNING, CONTAINER_STATE_STOPPED};
pub use wait::WaitHandle;

use crate::container::{
    ContainerConfig, ContainerDetails, ContainerHostConfig, ContainerLogsOptions,
    ContainerNetworkSettings, ContainerRemoveOptions, ContainerStartOptions, ImageRemoveOptions,
    NetworkCreateOptions, VolumeCreateOptions,
};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Container engine command-line tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerTool {
    Docker,
    #[default]
    Podman,
}

impl ContainerTool {
    /// Name of the binary on `PATH`
    pub fn binary(self) -> &'static str {
        match self {
            ContainerTool::Docker => "docker",
            ContainerTool::Podman => "podman",
        }
    }
}

impl std::fmt::Display for ContainerTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

impl FromStr for ContainerTool {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(ContainerTool::Docker),
            "podman" => Ok(ContainerTool::Podman),
            other => Err(EngineError::InvalidConfig(format!(
                "unsupported container tool '{}', expected docker or podman",
                other
            ))),
        }
    }
}

/// Operations on containers, images, networks and volumes.
///
/// Timeouts bound the engine invocation; on expiry the engine process is
/// killed and [`EngineError::Timeout`] is returned.
pub trait ContainerInterface: Send + Sync {
    /// Create a container and return its ID.
    fn container_create(
        &self,
        config: &ContainerConfig,
        host_config: &ContainerHostConfig,
        networking_config: &ContainerNetworkSettings,
        container_name: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn container_stop(
        &self,
        container: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn container_kill(
        &self,
        container: &str,
        signal: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove a container. Removing a container that is already gone succeeds.
    fn container_remove(
        &self,
        container: &str,
        options: ContainerRemoveOptions,
    ) -> impl Future<Output = Result<()>> + Send;

    fn container_start(
        &self,
        container: &str,
        options: ContainerStartOptions,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Wait for a container to reach `condition`.
    ///
    /// The engine's `wait` has completed by the time the handle is returned;
    /// the handle yields its exit code, or the error, exactly once.
    fn container_wait(
        &self,
        container: &str,
        condition: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = WaitHandle> + Send;

    fn get_container_logs(
        &self,
        container: &str,
        options: ContainerLogsOptions,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Read one file out of a container.
    fn copy_from_container(
        &self,
        container: &str,
        src_path: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Copy a directory out of a container into `dest_dir`; the copy lands
    /// at `dest_dir/<last component of src_dir>`.
    fn copy_dir_from_container(
        &self,
        container: &str,
        src_dir: &str,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Host port that `port` of the container is published on.
    fn get_container_port(
        &self,
        id: &str,
        port: u16,
    ) -> impl Future<Output = Result<String>> + Send;

    fn get_container_ip_address(&self, id: &str) -> impl Future<Output = Result<String>> + Send;

    fn container_inspect_with_format(
        &self,
        format: &str,
        id: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Run a command in a running container.
    ///
    /// A command that ran and exited non-zero is `Ok` with that exit code.
    fn exec_container(
        &self,
        id: &str,
        user: Option<&str>,
        cmd: &[String],
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<ExecOutput>> + Send;

    /// Value of the image's `version` label.
    fn get_mq_version(&self, image: &str) -> impl Future<Output = Result<String>> + Send;

    fn container_inspect(&self, id: &str)
        -> impl Future<Output = Result<ContainerDetails>> + Send;

    fn network_create(
        &self,
        name: &str,
        options: NetworkCreateOptions,
    ) -> impl Future<Output = Result<String>> + Send;

    fn network_remove(&self, network: &str) -> impl Future<Output = Result<()>> + Send;

    fn volume_create(
        &self,
        options: &VolumeCreateOptions,
    ) -> impl Future<Output = Result<String>> + Send;

    fn volume_remove(&self, volume_id: &str, force: bool)
        -> impl Future<Output = Result<()>> + Send;

    /// Build an image from a Dockerfile and return the image ID.
    fn image_build(
        &self,
        dockerfile: &Path,
        tag: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;

    fn image_remove(
        &self,
        image: &str,
        options: ImageRemoveOptions,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn image_inspect_with_format(
        &self,
        format: &str,
        id: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_from_str() {
        assert_eq!("docker".parse::<ContainerTool>().unwrap(), ContainerTool::Docker);
        assert_eq!(" Podman\n".parse::<ContainerTool>().unwrap(), ContainerTool::Podman);
        assert!("runc".parse::<ContainerTool>().is_err());
    }

    #[test]
    fn test_tool_binary() {
        assert_eq!(ContainerTool::Docker.to_string(), "docker");
        assert_eq!(ContainerTool::default().binary(), "podman");
    }
}
