//! Console log polling and summaries

use crate::container::ContainerLogsOptions;
use crate::engine::ContainerInterface;
use crate::error::{EngineError, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Bound on a single `logs` invocation
pub const LOG_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LOG_WAIT_TIMEOUT: Duration = Duration::from_secs(120);
pub const LOG_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Console output of a container
pub async fn read_logs<C: ContainerInterface>(cli: &C, id: &str) -> Result<String> {
    cli.get_container_logs(id, ContainerLogsOptions::default(), Some(LOG_READ_TIMEOUT))
        .await
}

/// Poll the logs until `matches` accepts them; `None` once `timeout` has passed
async fn poll_logs<C, F>(cli: &C, id: &str, timeout: Duration, matches: F) -> Result<Option<String>>
where
    C: ContainerInterface,
    F: Fn(&str) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let logs = read_logs(cli, id).await?;
        if matches(&logs) {
            return Ok(Some(logs));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(LOG_POLL_INTERVAL).await;
    }
}

/// Wait until `message` appears in the logs and return them
pub async fn wait_for_message_in_log<C: ContainerInterface>(
    cli: &C,
    id: &str,
    message: &str,
    timeout: Duration,
) -> Result<String> {
    poll_logs(cli, id, timeout, |logs| logs.contains(message))
        .await?
        .ok_or_else(|| {
            EngineError::Harness(format!(
                "timeout waiting for expected message ID {:?} to be logged",
                message
            ))
        })
}

/// Wait until `message` appears exactly `count` times in the logs
pub async fn wait_for_message_count_in_log<C: ContainerInterface>(
    cli: &C,
    id: &str,
    message: &str,
    count: usize,
    timeout: Duration,
) -> Result<String> {
    poll_logs(cli, id, timeout, |logs| logs.matches(message).count() == count)
        .await?
        .ok_or_else(|| {
            EngineError::Harness(format!(
                "timeout waiting for expected message ID {:?} to be logged {} times",
                message, count
            ))
        })
}

fn json_field(entry: Option<&serde_json::Value>, key: &str) -> String {
    match entry.and_then(|e| e.get(key)) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "<nil>".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Replace each JSON log line with its timestamp and message.
///
/// ```
/// let logs = "plain\n{\"ibm_datetime\": \"2024-01-01T00:00:00Z\", \"message\": \"hi\", \"x\": 1}\n";
/// assert_eq!(
///     ctharness::harness::summarize_json_logs(logs),
///     "plain\n{\"ibm_datetime\": \"2024-01-01T00:00:00Z\", \"message\": \"hi\", ...}\n"
/// );
/// ```
pub fn summarize_json_logs(logs: &str) -> String {
    let mut summary = String::with_capacity(logs.len());
    for line in logs.lines() {
        if line.starts_with('{') {
            let entry = serde_json::from_str::<serde_json::Value>(line).ok();
            summary.push_str(&format!(
                "{{\"ibm_datetime\": \"{}\", \"message\": \"{}\", ...}}\n",
                json_field(entry.as_ref(), "ibm_datetime"),
                json_field(entry.as_ref(), "message"),
            ));
        } else {
            summary.push_str(line);
            summary.push('\n');
        }
    }
    summary
}
