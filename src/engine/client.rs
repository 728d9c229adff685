//! Container engine client

use super::process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
use super::wait::WaitHandle;
use super::{args, parse, ContainerInterface, ContainerTool};
use crate::container::{
    ContainerConfig, ContainerDetails, ContainerHostConfig, ContainerLogsOptions,
    ContainerNetworkSettings, ContainerRemoveOptions, ContainerStartOptions, ImageRemoveOptions,
    NetworkCreateOptions, VolumeCreateOptions,
};
use crate::error::{EngineError, Result};
use crate::settings::{EngineSettings, DEFAULT_VERSION_FALLBACK};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Exit status with which the engine reports that a container is already gone
pub const ALREADY_REMOVED_EXIT_CODE: i32 = 125;

/// Exit code reported for an exec'd process that was terminated by a signal
pub const SIGNALLED_EXIT_CODE: i32 = -1;

const IP_ADDRESS_FORMAT: &str = "{{.NetworkSettings.IPAddress}}";
const VERSION_LABEL_FORMAT: &str = "{{.Config.Labels.version}}";

/// Result of running a command inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    /// Stdout followed by stderr
    pub output: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Client for the `docker` or `podman` command-line tool
pub struct ContainerClient<R = SystemRunner> {
    tool: ContainerTool,
    version: String,
    runner: Arc<R>,
    log_commands: bool,
    create_retry_delay: Duration,
}

impl<R> Clone for ContainerClient<R> {
    fn clone(&self) -> Self {
        Self {
            tool: self.tool,
            version: self.version.clone(),
            runner: Arc::clone(&self.runner),
            log_commands: self.log_commands,
            create_retry_delay: self.create_retry_delay,
        }
    }
}

impl<R> std::fmt::Debug for ContainerClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerClient")
            .field("tool", &self.tool)
            .field("version", &self.version)
            .field("log_commands", &self.log_commands)
            .field("create_retry_delay", &self.create_retry_delay)
            .finish()
    }
}

impl ContainerClient<SystemRunner> {
    /// Client configured from the settings file and environment.
    ///
    /// `COMMAND` selects the tool and defaults to `podman`.
    pub async fn new() -> Result<Self> {
        let settings = EngineSettings::load()?;
        Ok(Self::from_settings(&settings).await)
    }

    pub async fn from_settings(settings: &EngineSettings) -> Self {
        Self::connect(settings, SystemRunner).await
    }
}

impl<R: CommandRunner> ContainerClient<R> {
    /// Client using `runner`, with the tool version detected through it
    pub async fn connect(settings: &EngineSettings, runner: R) -> Self {
        let version = detect_tool_version(&runner, settings.tool, &settings.version_fallback).await;
        debug!(tool = %settings.tool, version = %version, "Container client ready");

        Self {
            tool: settings.tool,
            version,
            runner: Arc::new(runner),
            log_commands: settings.log_commands,
            create_retry_delay: settings.create_retry_delay(),
        }
    }

    /// Client using `runner`, without version detection
    pub fn with_runner(tool: ContainerTool, runner: R) -> Self {
        let settings = EngineSettings::default();
        Self {
            tool,
            version: DEFAULT_VERSION_FALLBACK.to_string(),
            runner: Arc::new(runner),
            log_commands: settings.log_commands,
            create_retry_delay: settings.create_retry_delay(),
        }
    }

    /// Log every engine invocation at info level
    pub fn with_command_logging(mut self, enabled: bool) -> Self {
        self.log_commands = enabled;
        self
    }

    /// Delay before the single `create` retry
    pub fn with_create_retry_delay(mut self, delay: Duration) -> Self {
        self.create_retry_delay = delay;
        self
    }

    pub fn tool(&self) -> ContainerTool {
        self.tool
    }

    /// Engine version detected at construction
    pub fn version(&self) -> &str {
        &self.version
    }

    fn invocation(&self, args: Vec<String>, timeout: Option<Duration>) -> Invocation {
        Invocation::new(self.tool.binary(), args).timeout(timeout)
    }

    async fn execute(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        if self.log_commands {
            info!(command = %invocation.command_line(), "Running container command");
        } else {
            debug!(command = %invocation.command_line(), "Running container command");
        }
        self.runner.run(invocation).await
    }

    /// Run and treat a non-zero exit as [`EngineError::CommandFailed`]
    async fn run_checked(&self, args: Vec<String>, timeout: Option<Duration>) -> Result<ProcessOutput> {
        let invocation = self.invocation(args, timeout);
        let output = self.execute(&invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(command_failed(&invocation, &output))
        }
    }
}

fn command_failed(invocation: &Invocation, output: &ProcessOutput) -> EngineError {
    EngineError::CommandFailed {
        command: invocation.command_line(),
        code: output.code,
        stderr: output.stderr_lossy().trim_end().to_string(),
    }
}

/// Version of `tool` as reported by `<tool> version`, or `fallback`
pub async fn detect_tool_version<R: CommandRunner>(
    runner: &R,
    tool: ContainerTool,
    fallback: &str,
) -> String {
    let invocation = Invocation::new(tool.binary(), args::version_args(tool));
    match runner.run(&invocation).await {
        Ok(output) if output.success() => {
            let version = parse::clean_version(&output.stdout_lossy());
            if version.is_empty() {
                fallback.to_string()
            } else {
                version
            }
        }
        Ok(output) => {
            debug!(tool = %tool, code = ?output.code, "Version query failed");
            fallback.to_string()
        }
        Err(err) => {
            debug!(tool = %tool, error = %err, "Version query failed");
            fallback.to_string()
        }
    }
}

impl<R: CommandRunner> ContainerInterface for ContainerClient<R> {
    async fn container_create(
        &self,
        config: &ContainerConfig,
        host_config: &ContainerHostConfig,
        networking_config: &ContainerNetworkSettings,
        container_name: &str,
    ) -> Result<String> {
        let args = args::create_args(self.tool, config, host_config, networking_config, container_name);

        match self.run_checked(args.clone(), None).await {
            Ok(output) => return Ok(parse::first_line(&output.stdout_lossy())),
            Err(err) => warn!(
                container = container_name,
                error = %err,
                delay = ?self.create_retry_delay,
                "Container create failed, retrying once"
            ),
        }
        tokio::time::sleep(self.create_retry_delay).await;

        let invocation = self.invocation(args, None);
        let output = self.execute(&invocation).await?;
        if output.success() {
            return Ok(parse::first_line(&output.stdout_lossy()));
        }
        let stderr = output.stderr_lossy();
        Err(EngineError::CreateFailed {
            name: container_name.to_string(),
            stderr: parse::lines(stderr.trim_end()).join("\n"),
        })
    }

    async fn container_stop(&self, container: &str, timeout: Option<Duration>) -> Result<()> {
        self.run_checked(args::stop_args(container), timeout).await?;
        Ok(())
    }

    async fn container_kill(&self, container: &str, signal: Option<&str>) -> Result<()> {
        self.run_checked(args::kill_args(container, signal), None).await?;
        Ok(())
    }

    async fn container_remove(&self, container: &str, options: ContainerRemoveOptions) -> Result<()> {
        match self.run_checked(args::remove_args(container, options), None).await {
            Ok(_) => Ok(()),
            Err(err) if err.exit_code() == Some(ALREADY_REMOVED_EXIT_CODE) => {
                debug!(container = container, error = %err, "Container already removed");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    async fn container_start(&self, container: &str, _options: ContainerStartOptions) -> Result<()> {
        self.run_checked(args::start_args(container), None).await?;
        Ok(())
    }

    async fn container_wait(
        &self,
        container: &str,
        condition: &str,
        timeout: Option<Duration>,
    ) -> WaitHandle {
        let invocation = self.invocation(args::wait_args(self.tool, container, condition), timeout);
        match self.execute(&invocation).await {
            Ok(output) if output.success() => WaitHandle::parse_in_background(output.stdout_lossy()),
            Ok(output) => WaitHandle::ready(Err(command_failed(&invocation, &output))),
            Err(err) => WaitHandle::ready(Err(err)),
        }
    }

    async fn get_container_logs(
        &self,
        container: &str,
        _options: ContainerLogsOptions,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let output = self.run_checked(args::logs_args(container), timeout).await?;
        Ok(output.combined())
    }

    async fn copy_from_container(&self, container: &str, src_path: &str) -> Result<Vec<u8>> {
        let file_name = Path::new(src_path)
            .file_name()
            .ok_or_else(|| EngineError::Parse(format!("'{}' does not name a file", src_path)))?
            .to_owned();

        let scratch = tempfile::Builder::new().prefix("ctharness-cp-").tempdir()?;
        self.run_checked(args::copy_args(container, src_path, scratch.path()), None)
            .await?;

        let copied = scratch.path().join(file_name);
        let data = tokio::fs::read(&copied).await?;
        tokio::fs::remove_file(&copied).await?;
        Ok(data)
    }

    async fn copy_dir_from_container(&self, container: &str, src_dir: &str, dest_dir: &Path) -> Result<()> {
        self.run_checked(args::copy_dir_args(container, src_dir, dest_dir), None)
            .await?;
        Ok(())
    }

    async fn get_container_port(&self, id: &str, port: u16) -> Result<String> {
        let output = self.run_checked(args::port_args(id, port), None).await?;
        parse::parse_host_port(&output.stdout_lossy())
    }

    async fn get_container_ip_address(&self, id: &str) -> Result<String> {
        self.container_inspect_with_format(IP_ADDRESS_FORMAT, id).await
    }

    async fn container_inspect_with_format(&self, format: &str, id: &str) -> Result<String> {
        let output = self.run_checked(args::inspect_args(id, format), None).await?;
        Ok(parse::trim_line(&output.stdout_lossy()).to_string())
    }

    async fn exec_container(
        &self,
        id: &str,
        user: Option<&str>,
        cmd: &[String],
        timeout: Option<Duration>,
    ) -> Result<ExecOutput> {
        let invocation = self.invocation(args::exec_args(id, user, cmd), timeout);
        let output = self.execute(&invocation).await?;
        Ok(ExecOutput {
            exit_code: output.code.unwrap_or(SIGNALLED_EXIT_CODE),
            output: output.combined(),
        })
    }

    async fn get_mq_version(&self, image: &str) -> Result<String> {
        self.image_inspect_with_format(VERSION_LABEL_FORMAT, image).await
    }

    async fn container_inspect(&self, id: &str) -> Result<ContainerDetails> {
        let output = self.run_checked(args::inspect_args(id, ""), None).await?;
        parse::parse_container_details(&output.stdout)
    }

    async fn network_create(&self, name: &str, _options: NetworkCreateOptions) -> Result<String> {
        let output = self.run_checked(args::network_create_args(name), None).await?;
        Ok(parse::sanitize_string(&output.stdout_lossy()))
    }

    async fn network_remove(&self, network: &str) -> Result<()> {
        self.run_checked(args::network_remove_args(network), None).await?;
        Ok(())
    }

    async fn volume_create(&self, options: &VolumeCreateOptions) -> Result<String> {
        let output = self.run_checked(args::volume_create_args(options), None).await?;
        Ok(parse::sanitize_string(&output.stdout_lossy()))
    }

    async fn volume_remove(&self, volume_id: &str, force: bool) -> Result<()> {
        self.run_checked(args::volume_remove_args(volume_id, force), None).await?;
        Ok(())
    }

    async fn image_build(&self, dockerfile: &Path, tag: Option<&str>) -> Result<String> {
        let output = self
            .run_checked(args::image_build_args(self.tool, dockerfile, tag), None)
            .await?;
        Ok(parse::sanitize_string(&output.stdout_lossy()))
    }

    async fn image_remove(&self, image: &str, options: ImageRemoveOptions) -> Result<bool> {
        self.run_checked(args::image_remove_args(image, options), None).await?;
        Ok(true)
    }

    async fn image_inspect_with_format(&self, format: &str, id: &str) -> Result<String> {
        let output = self.run_checked(args::image_inspect_args(id, format), None).await?;
        Ok(parse::trim_line(&output.stdout_lossy()).to_string())
    }
}
