//! First-failure data capture (FDC) scanning
//!
//! The queue manager writes an `.FDC` file to its errors directory for every
//! internal failure. Each file opens with a summary block framed by lines
//! containing `--+`.

use crate::engine::ContainerInterface;
use crate::error::{EngineError, Result};
use std::path::PathBuf;

/// Errors directory inside the queue manager container
pub const ERRORS_DIR: &str = "/var/mqm/errors/";

const SUMMARY_MARKER: &str = "--+";

/// Leading summary block of an FDC file, up to and including the closing marker
pub fn fdc_summary(content: &str) -> String {
    let mut summary = String::new();
    let mut opened = false;
    for line in content.lines() {
        summary.push_str(line);
        summary.push('\n');
        if line.contains(SUMMARY_MARKER) {
            if opened {
                break;
            }
            opened = true;
        }
    }
    summary
}

/// Summary blocks of every FDC file in the container's errors directory
pub async fn fdc_summaries<C: ContainerInterface>(cli: &C, id: &str) -> Result<Vec<String>> {
    let prefix: String = id.chars().take(8).collect();
    let scratch = tempfile::Builder::new()
        .prefix(&format!("tmp-{}-", prefix))
        .tempdir()?;

    cli.copy_dir_from_container(id, ERRORS_DIR, scratch.path())
        .await
        .map_err(|e| {
            EngineError::Harness(format!(
                "failed to copy errors directory from the container: {}",
                e
            ))
        })?;

    let errors_dir = scratch.path().join("errors");
    let mut entries = tokio::fs::read_dir(&errors_dir)
        .await
        .map_err(|e| EngineError::Harness(format!("failed to list errors directory: {}", e)))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "FDC") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut summaries = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read(&path).await.map_err(|e| {
            EngineError::Harness(format!(
                "failed to get FDC summary for {}: {}",
                path.display(),
                e
            ))
        })?;
        summaries.push(fdc_summary(&String::from_utf8_lossy(&content)));
    }
    Ok(summaries)
}
