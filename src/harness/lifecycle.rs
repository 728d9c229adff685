//! Throwaway containers and post-test cleanup

use super::fdc::fdc_summaries;
use super::logs::{read_logs, summarize_json_logs};
use super::readiness::wait_for_container;
use crate::container::{
    ContainerConfig, ContainerDetailsLogging, ContainerHostConfig, ContainerNetworkSettings,
    ContainerRemoveOptions, ContainerStartOptions, PortBinding,
};
use crate::engine::ContainerInterface;
use crate::error::{EngineError, Result};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Where the queue manager image writes its exit reason
pub const TERMINATION_LOG: &str = "/run/termination-log";
/// How long the engine waits after SIGTERM before it kills the container
pub const ENGINE_STOP_GRACE: Duration = Duration::from_secs(10);
/// Bound on the cleanup `stop` invocation; must outlast [`ENGINE_STOP_GRACE`]
pub const CLEANUP_STOP_TIMEOUT: Duration = Duration::from_secs(30);
pub const ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(20);

/// Environment variable naming the image under test
pub const ENV_TEST_IMAGE: &str = "TEST_IMAGE";
pub const DEFAULT_TEST_IMAGE: &str = "mq-devserver:latest-x86-64";

const REMOVE_ALL: ContainerRemoveOptions = ContainerRemoveOptions {
    force: true,
    remove_volumes: true,
};

/// Image under test: `TEST_IMAGE`, else [`DEFAULT_TEST_IMAGE`]
pub fn image_name() -> String {
    image_name_with(|key| std::env::var(key).ok())
}

/// [`image_name`] with an explicit environment lookup
pub fn image_name_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_TEST_IMAGE)
        .filter(|image| !image.is_empty())
        .unwrap_or_else(|| DEFAULT_TEST_IMAGE.to_string())
}

/// A random non-root four digit user ID
pub fn random_uid() -> String {
    rand::thread_rng().gen_range(1000..9999).to_string()
}

/// Host config for test containers: every capability dropped, nothing published
pub fn default_host_config() -> ContainerHostConfig {
    ContainerHostConfig {
        cap_drop: vec!["ALL".to_string()],
        ..Default::default()
    }
}

/// Create and start a container and return its ID.
///
/// An empty image becomes [`image_name`]; an empty user becomes [`random_uid`].
pub async fn run_container_with_all_config<C: ContainerInterface>(
    cli: &C,
    config: &ContainerConfig,
    host_config: &ContainerHostConfig,
    networking_config: &ContainerNetworkSettings,
    name: &str,
) -> Result<String> {
    let mut config = config.clone();
    if config.image.is_empty() {
        config.image = image_name();
    }
    if config.user.is_empty() {
        config.user = random_uid();
    }
    info!(image = %config.image, user = %config.user, name = name, "Running container");

    let id = cli
        .container_create(&config, host_config, networking_config, name)
        .await?;
    cli.container_start(&id, ContainerStartOptions::default()).await?;
    Ok(id)
}

pub async fn run_container_with_host_config<C: ContainerInterface>(
    cli: &C,
    config: &ContainerConfig,
    host_config: &ContainerHostConfig,
    name: &str,
) -> Result<String> {
    run_container_with_all_config(cli, config, host_config, &ContainerNetworkSettings::default(), name)
        .await
}

/// Run with [`default_host_config`], publishing each TCP port on `0.0.0.0`
/// at an engine-chosen host port
pub async fn run_container_with_ports<C: ContainerInterface>(
    cli: &C,
    config: &ContainerConfig,
    ports: &[u16],
    name: &str,
) -> Result<String> {
    let host_config = ports
        .iter()
        .fold(default_host_config(), |host, port| host.publish(PortBinding::tcp(*port)));
    run_container_with_host_config(cli, config, &host_config, name).await
}

pub async fn run_container<C: ContainerInterface>(
    cli: &C,
    config: &ContainerConfig,
    name: &str,
) -> Result<String> {
    run_container_with_ports(cli, config, &[], name).await
}

/// Contents of the termination log, or an empty string if it cannot be read
pub async fn termination_message<C: ContainerInterface>(cli: &C, id: &str) -> String {
    match cli.copy_from_container(id, TERMINATION_LOG).await {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(err) => {
            debug!(container = id, error = %err, "No termination message");
            String::new()
        }
    }
}

/// Termination message of a container that must have written one
pub async fn expect_termination_message<C: ContainerInterface>(cli: &C, id: &str) -> Result<String> {
    let message = termination_message(cli, id).await;
    if message.is_empty() {
        return Err(EngineError::Harness(format!(
            "expected termination message to be set for container {}",
            id
        )));
    }
    Ok(message)
}

/// Log a selection of the container's inspect details
pub async fn log_container_details<C: ContainerInterface>(cli: &C, id: &str) {
    match cli.container_inspect(id).await {
        Ok(details) => {
            let summary = ContainerDetailsLogging::from_details(id, &details);
            info!(container = id, details = ?summary, "Container details");
        }
        Err(err) => debug!(container = id, error = %err, "Could not inspect container"),
    }
}

/// Stop and remove a container without collecting diagnostics
pub async fn clean_container_quiet<C: ContainerInterface>(cli: &C, id: &str) -> Result<()> {
    if let Err(err) = cli.container_stop(id, Some(CLEANUP_STOP_TIMEOUT)).await {
        warn!(container = id, error = %err, "Failed to stop container");
    }
    cli.container_remove(id, REMOVE_ALL).await
}

/// Stop and remove a container, logging its details, console output and
/// termination message on the way.
///
/// Unless `ignore_fdcs` is set, the queue manager's FDC summaries are
/// collected before the stop, logged and returned; callers treat a non-empty
/// list as a test failure. A failed FDC scan or stop is logged and cleanup
/// carries on; a failed remove is returned.
pub async fn clean_container<C: ContainerInterface>(
    cli: &C,
    id: &str,
    ignore_fdcs: bool,
) -> Result<Vec<String>> {
    log_container_details(cli, id).await;

    let mut summaries = Vec::new();
    if !ignore_fdcs {
        match fdc_summaries(cli, id).await {
            Ok(found) if found.is_empty() => info!(container = id, "No FDCs found in the queue manager"),
            Ok(found) => {
                error!(container = id, count = found.len(), "{} FDC(s) found in the queue manager!", found.len());
                for summary in &found {
                    error!(container = id, "\n{}", summary);
                }
                summaries = found;
            }
            Err(err) => warn!(container = id, error = %err, "Not checking for FDCs: failed to get FDC summaries"),
        }
    }

    info!(container = id, "Stopping container");
    match cli.container_stop(id, Some(CLEANUP_STOP_TIMEOUT)).await {
        Ok(()) => info!(container = id, "Container stopped"),
        Err(err) => warn!(container = id, error = %err, "Failed to stop container"),
    }

    match read_logs(cli, id).await {
        Ok(logs) => info!(container = id, "Console log from container:\n{}", summarize_json_logs(&logs)),
        Err(err) => warn!(container = id, error = %err, "Failed to read console log"),
    }

    let message = termination_message(cli, id).await;
    if !message.is_empty() {
        info!(container = id, "Termination message: {}", message);
    }

    info!(container = id, "Removing container");
    cli.container_remove(id, REMOVE_ALL).await?;
    Ok(summaries)
}

/// Run `command` as root in a fresh container of `image` and wait for it.
///
/// Returns the exit code and console output. The container is removed
/// whether or not the run succeeded.
pub async fn run_container_one_shot<C: ContainerInterface>(
    cli: &C,
    image: &str,
    name: &str,
    command: &[String],
) -> Result<(i64, String)> {
    let config = ContainerConfig {
        entrypoint: command.to_vec(),
        user: "root".to_string(),
        ..ContainerConfig::new(image)
    };
    info!(image = image, command = ?command, "Running one shot container");

    let id = cli
        .container_create(
            &config,
            &ContainerHostConfig::default(),
            &ContainerNetworkSettings::default(),
            name,
        )
        .await?;

    let outcome = async {
        cli.container_start(&id, ContainerStartOptions::default()).await?;
        let code = wait_for_container(cli, &id, ONE_SHOT_TIMEOUT).await?;
        let output = read_logs(cli, &id).await?;
        Ok::<_, EngineError>((code, output))
    }
    .await;
    let cleaned = clean_container_quiet(cli, &id).await;

    let (code, output) = outcome?;
    cleaned?;
    info!(container = %id, code = code, output = %output, "One shot container finished");
    Ok((code, output))
}
