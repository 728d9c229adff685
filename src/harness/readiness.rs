//! Readiness and exit polling

use crate::engine::{ContainerInterface, CONTAINER_STATE_NOT_RUNNING};
use crate::error::{EngineError, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Readiness check shipped in the queue manager image
pub const READY_CHECK: &str = "chkmqready";
/// Health check shipped in the queue manager image
pub const HEALTH_CHECK: &str = "chkmqhealthy";
/// Web console status command
pub const WEB_CONSOLE_CHECK: &str = "dspmqweb";

pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(4 * 60);

/// Role of a queue manager that passed the readiness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Standby,
    Replica,
}

impl Readiness {
    /// Map a `chkmqready` exit code; `None` means not ready yet
    pub fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Readiness::Ready),
            10 => Some(Readiness::Standby),
            20 => Some(Readiness::Replica),
            _ => None,
        }
    }
}

/// Run `check` once per second until `accept` maps its exit code to a value
async fn poll_check<C, T, F>(cli: &C, id: &str, check: &str, timeout: Duration, accept: F) -> Option<T>
where
    C: ContainerInterface,
    F: Fn(i32) -> Option<T>,
{
    let command = vec![check.to_string()];
    let poll = async {
        loop {
            tokio::time::sleep(READY_POLL_INTERVAL).await;
            match cli.exec_container(id, None, &command, None).await {
                Ok(result) => {
                    debug!(container = id, check = check, code = result.exit_code, output = %result.output, "Check ran");
                    if let Some(value) = accept(result.exit_code) {
                        return value;
                    }
                }
                Err(err) => debug!(container = id, check = check, error = %err, "Check failed"),
            }
        }
    };
    tokio::time::timeout(timeout, poll).await.ok()
}

/// Run the readiness check once per second until it passes or `timeout` elapses
pub async fn wait_for_ready<C: ContainerInterface>(
    cli: &C,
    id: &str,
    timeout: Duration,
) -> Result<Readiness> {
    let readiness = poll_check(cli, id, READY_CHECK, timeout, Readiness::from_exit_code)
        .await
        .ok_or_else(|| EngineError::Timeout {
            command: READY_CHECK.to_string(),
            timeout,
        })?;
    info!(container = id, readiness = ?readiness, "Queue manager ready");
    Ok(readiness)
}

/// Poll the web console status once per second until it reports running.
///
/// On timeout the status is queried once more and logged before the error.
pub async fn wait_for_web_console_ready<C: ContainerInterface>(
    cli: &C,
    id: &str,
    timeout: Duration,
) -> Result<()> {
    let ready = poll_check(cli, id, WEB_CONSOLE_CHECK, timeout, |code| (code == 0).then_some(()))
        .await;
    if ready.is_some() {
        info!(container = id, "Web console ready");
        return Ok(());
    }

    match cli
        .exec_container(id, None, &[WEB_CONSOLE_CHECK.to_string()], None)
        .await
    {
        Ok(result) => warn!(container = id, code = result.exit_code, output = %result.output, "Web console not ready"),
        Err(err) => warn!(container = id, error = %err, "Web console not ready"),
    }
    Err(EngineError::Timeout {
        command: WEB_CONSOLE_CHECK.to_string(),
        timeout,
    })
}

/// Whether the health check exits zero
pub async fn is_healthy<C: ContainerInterface>(cli: &C, id: &str) -> Result<bool> {
    let result = cli
        .exec_container(id, None, &[HEALTH_CHECK.to_string()], None)
        .await?;
    Ok(result.success())
}

/// Wait for the container to exit and return its exit code
pub async fn wait_for_container<C: ContainerInterface>(
    cli: &C,
    id: &str,
    timeout: Duration,
) -> Result<i64> {
    info!(container = id, timeout = ?timeout, "Waiting for container");
    cli.container_wait(id, CONTAINER_STATE_NOT_RUNNING, Some(timeout))
        .await
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedRunner;
    use crate::engine::{ContainerClient, ContainerTool};
    use tokio::time::Instant;

    #[test]
    fn test_readiness_codes() {
        assert_eq!(Readiness::from_exit_code(0), Some(Readiness::Ready));
        assert_eq!(Readiness::from_exit_code(10), Some(Readiness::Standby));
        assert_eq!(Readiness::from_exit_code(20), Some(Readiness::Replica));
        assert_eq!(Readiness::from_exit_code(1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_ready_polls_until_role_known() {
        let runner = ScriptedRunner::new()
            .exit(1, "not ready", "")
            .launch_failure()
            .exit(10, "", "");
        let cli = ContainerClient::with_runner(ContainerTool::Podman, runner.clone());

        let started = Instant::now();
        let readiness = wait_for_ready(&cli, "qm", DEFAULT_READY_TIMEOUT).await.unwrap();

        assert_eq!(readiness, Readiness::Standby);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(runner.calls().len(), 3);
        assert_eq!(runner.args()[0], vec!["exec", "qm", "chkmqready"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_ready_times_out() {
        let runner = (0..10).fold(ScriptedRunner::new(), |runner, _| runner.exit(1, "", ""));
        let cli = ContainerClient::with_runner(ContainerTool::Docker, runner);

        let err = wait_for_ready(&cli, "qm", Duration::from_secs(3)).await.unwrap_err();
        match err {
            EngineError::Timeout { command, timeout } => {
                assert_eq!(command, READY_CHECK);
                assert_eq!(timeout, Duration::from_secs(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_web_console_ready() {
        let runner = ScriptedRunner::new()
            .exit(1, "MQWB1125I: Server 'mqweb' is not running.\n", "")
            .ok("MQWB1124I: Server 'mqweb' is running.\n");
        let cli = ContainerClient::with_runner(ContainerTool::Podman, runner.clone());

        let started = Instant::now();
        wait_for_web_console_ready(&cli, "qm", DEFAULT_READY_TIMEOUT).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(runner.args(), vec![vec!["exec", "qm", "dspmqweb"]; 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_web_console_timeout_queries_once_more() {
        let runner = (0..4).fold(ScriptedRunner::new(), |runner, _| runner.exit(1, "", ""));
        let cli = ContainerClient::with_runner(ContainerTool::Docker, runner.clone());

        let err = wait_for_web_console_ready(&cli, "qm", Duration::from_millis(2500))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { ref command, .. } if command == WEB_CONSOLE_CHECK));
        // two polls inside the deadline plus the final status query
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_is_healthy() {
        let runner = ScriptedRunner::new().ok("").exit(1, "", "");
        let cli = ContainerClient::with_runner(ContainerTool::Podman, runner.clone());
        assert!(is_healthy(&cli, "qm").await.unwrap());
        assert!(!is_healthy(&cli, "qm").await.unwrap());
        assert_eq!(runner.args()[0], vec!["exec", "qm", "chkmqhealthy"]);
    }

    #[tokio::test]
    async fn test_wait_for_container_returns_exit_code() {
        let runner = ScriptedRunner::new().ok("2\n");
        let cli = ContainerClient::with_runner(ContainerTool::Podman, runner.clone());
        let code = wait_for_container(&cli, "qm", Duration::from_secs(20)).await.unwrap();
        assert_eq!(code, 2);
        assert_eq!(runner.calls()[0].timeout, Some(Duration::from_secs(20)));
    }
}
