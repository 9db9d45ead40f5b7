//! SSE (Server-Sent Events) transport for A2A streaming.
//!
//! A streaming call answers with a `text/event-stream` body. Only `data:`
//! lines carry payload; each payload is one [`StreamResponse`] JSON object.
//! The body is read on a background task and handed to the caller as a
//! [`TaskStream`], a single stream of `Result` items whose end (or single
//! error item) is the terminal event.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, TryStreamExt};
use pin_project_lite::pin_project;
use reqwest::Response;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{A2AError, A2AResult};
use crate::task::StreamResponse;

/// Prefix of payload-carrying SSE lines.
pub const DATA_PREFIX: &str = "data:";

/// Sentinel some agents send instead of a `done` event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Events buffered between the reader task and the consumer.
pub(crate) const STREAM_BUFFER: usize = 32;

pin_project! {
    /// A stream of task events received via SSE.
    ///
    /// Yields events in network order. The stream ends when the server closes
    /// the connection or sends a terminal event; a transport, HTTP or decode
    /// failure is delivered as one final `Err` item. Cancelling the token the
    /// stream was opened with (or calling [`TaskStream::cancel`]) closes the
    /// connection and yields exactly one [`A2AError::Cancelled`]. Dropping the
    /// stream closes the connection as well.
    pub struct TaskStream {
        #[pin]
        inner: ReceiverStream<A2AResult<StreamResponse>>,
        cancel: CancellationToken,
        finished: bool,
        _guard: DropGuard,
    }
}

impl TaskStream {
    pub(crate) fn new(rx: mpsc::Receiver<A2AResult<StreamResponse>>, cancel: CancellationToken) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            _guard: cancel.clone().drop_guard(),
            cancel,
            finished: false,
        }
    }

    /// Stop the stream; the next poll yields [`A2AError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the stream was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for TaskStream {
    type Item = A2AResult<StreamResponse>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }
        if this.cancel.is_cancelled() {
            *this.finished = true;
            return Poll::Ready(Some(Err(A2AError::Cancelled)));
        }
        match this.inner.poll_next(cx) {
            Poll::Ready(None) => {
                *this.finished = true;
                // The reader exits on cancellation without sending anything.
                if this.cancel.is_cancelled() {
                    Poll::Ready(Some(Err(A2AError::Cancelled)))
                } else {
                    Poll::Ready(None)
                }
            }
            Poll::Ready(Some(Err(e))) => {
                *this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

/// One classified line of an SSE body.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// A decoded `data:` payload.
    Event(StreamResponse),
    /// The `[DONE]` sentinel.
    Done,
    /// Comments, `event:`/`id:` fields, blank lines and empty payloads.
    Ignored,
}

/// Classify one SSE line. A `data:` payload that is not a valid
/// [`StreamResponse`] is a decode error.
pub fn parse_sse_line(line: &str) -> A2AResult<SseLine> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(SseLine::Ignored);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(SseLine::Ignored);
    }
    if payload == DONE_SENTINEL {
        return Ok(SseLine::Done);
    }
    serde_json::from_str(payload)
        .map(SseLine::Event)
        .map_err(|e| A2AError::Decode(format!("malformed stream event: {e}")))
}

/// Send one item to the consumer unless the stream is cancelled or dropped.
pub(crate) async fn deliver(
    tx: &mpsc::Sender<A2AResult<StreamResponse>>,
    cancel: &CancellationToken,
    item: A2AResult<StreamResponse>,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}

/// Read an SSE response body line by line and forward decoded events.
///
/// Returns when the connection closes, a terminal event arrives, an error is
/// delivered, the consumer goes away, or `cancel` fires. Returning drops the
/// response, which closes the connection.
pub(crate) async fn pump(
    response: Response,
    tx: mpsc::Sender<A2AResult<StreamResponse>>,
    cancel: CancellationToken,
) {
    let body = response.bytes_stream().map_err(io::Error::other);
    let mut lines = StreamReader::new(Box::pin(body)).lines();
    let mut delivered = 0usize;

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(delivered, "Stream cancelled");
                return;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!(delivered, "Stream closed by server");
                return;
            }
            Err(e) => {
                deliver(&tx, &cancel, Err(read_error(e))).await;
                return;
            }
        };

        match parse_sse_line(&line) {
            Ok(SseLine::Event(event)) => {
                let done = event.done;
                if !deliver(&tx, &cancel, Ok(event)).await {
                    return;
                }
                delivered += 1;
                if done {
                    tracing::debug!(delivered, "Stream finished with terminal event");
                    return;
                }
            }
            Ok(SseLine::Done) => return,
            Ok(SseLine::Ignored) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Malformed stream event, closing stream");
                deliver(&tx, &cancel, Err(e)).await;
                return;
            }
        }
    }
}

fn read_error(e: io::Error) -> A2AError {
    if e.kind() == io::ErrorKind::InvalidData {
        return A2AError::Decode(format!("stream is not valid UTF-8: {e}"));
    }
    match e.into_inner() {
        Some(inner) => match inner.downcast::<reqwest::Error>() {
            Ok(reqwest_err) => A2AError::Transport(*reqwest_err),
            Err(other) => A2AError::Decode(format!("stream read error: {other}")),
        },
        None => A2AError::Decode("stream read error".into()),
    }
}

/// SSE event type constants.
pub mod event_types {
    /// Task status change.
    pub const STATUS: &str = "status";
    /// Progress update.
    pub const PROGRESS: &str = "progress";
    /// New message from the agent.
    pub const MESSAGE: &str = "message";
    /// Artifact produced by the task.
    pub const ARTIFACT: &str = "artifact";
    /// Agent-side failure.
    pub const ERROR: &str = "error";
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_parse_sse_line() {
        let line = r#"data: {"id":"task-1","type":"progress","data":{"pct":10}}"#;
        match parse_sse_line(line).unwrap() {
            SseLine::Event(event) => {
                assert_eq!(event.id, "task-1");
                assert_eq!(event.kind, event_types::PROGRESS);
            }
            other => panic!("expected event, got {other:?}"),
        }

        assert_eq!(parse_sse_line(": keep-alive").unwrap(), SseLine::Ignored);
        assert_eq!(parse_sse_line("event: update").unwrap(), SseLine::Ignored);
        assert_eq!(parse_sse_line("data:   ").unwrap(), SseLine::Ignored);
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), SseLine::Done);
        assert!(matches!(
            parse_sse_line("data: {\"id\":"),
            Err(A2AError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_task_stream_reports_cancellation_once() {
        let (tx, rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let mut stream = TaskStream::new(rx, token.clone());

        tx.send(Ok(StreamResponse {
            id: "t".into(),
            timestamp: None,
            kind: event_types::STATUS.into(),
            data: serde_json::Value::Null,
            done: false,
        }))
        .await
        .unwrap();
        assert!(stream.next().await.unwrap().is_ok());

        token.cancel();
        assert!(matches!(stream.next().await, Some(Err(A2AError::Cancelled))));
        assert!(stream.next().await.is_none());
        drop(tx);
    }

    #[tokio::test]
    async fn test_task_stream_ends_after_error_item() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = TaskStream::new(rx, CancellationToken::new());
        tx.send(Err(A2AError::Decode("bad".into()))).await.unwrap();
        tx.send(Err(A2AError::Decode("ignored".into()))).await.unwrap();

        assert!(matches!(stream.next().await, Some(Err(A2AError::Decode(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_reader() {
        let (_tx, rx) = mpsc::channel::<A2AResult<StreamResponse>>(1);
        let token = CancellationToken::new();
        let stream = TaskStream::new(rx, token.clone());
        drop(stream);
        assert!(token.is_cancelled());
    }
}
