//! One-shot result of a container wait

use crate::error::{EngineError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Resolves to the exit code of a waited-on container, exactly once
#[derive(Debug)]
pub struct WaitHandle {
    rx: oneshot::Receiver<Result<i64>>,
}

impl WaitHandle {
    /// Handle that parses `output` on a background task
    pub(crate) fn parse_in_background(output: String) -> Self {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(super::parse::parse_exit_code(&output));
        });
        Self { rx }
    }

    /// Handle that is already resolved
    pub(crate) fn ready(result: Result<i64>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl Future for WaitHandle {
    type Output = Result<i64>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(EngineError::WaitAborted)),
            Poll::Pending => Poll::Pending,
        }
    }
}
