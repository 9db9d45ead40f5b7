//! Task: the unit of work sent to a remote agent.
//!
//! The envelope types here are transient: built per call and handed back to
//! the caller. A task moves through the usual lifecycle:
//!
//! ```text
//! SUBMITTED → WORKING → COMPLETED (terminal)
//!                     → FAILED (terminal)
//!                     → CANCELED (terminal)
//!                     → REJECTED (terminal)
//!                     → INPUT_REQUIRED (interrupted)
//!                     → AUTH_REQUIRED (interrupted)
//! ```
//!
//! Agents report the state as a free-form string, so the wire types keep the
//! raw string and [`TaskState::parse`] interprets it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;

/// A task submitted to an agent (`tasks/send`, `tasks/sendSubscribe`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskRequest {
    /// Caller-chosen task id.
    pub id: String,

    pub message: Message,
}

impl TaskRequest {
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            message,
        }
    }

    /// Create a task request with a generated id.
    pub fn with_random_id(message: Message) -> Self {
        Self::new(Uuid::new_v4().to_string(), message)
    }
}

/// The result of `tasks/send` or `message/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskResponse {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResponse {
    /// Interpret the status string.
    pub fn state(&self) -> Option<TaskState> {
        TaskState::parse(&self.status)
    }
}

/// The result of `tasks/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskStatus {
    pub id: String,

    #[serde(default)]
    pub status: String,

    /// Completion fraction in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    pub fn state(&self) -> Option<TaskState> {
        TaskState::parse(&self.status)
    }

    /// Progress clamped into `[0, 1]`; agents occasionally overshoot.
    pub fn progress_fraction(&self) -> Option<f64> {
        self.progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
    }
}

/// One event of a streamed task (`data:` line of an SSE response).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StreamResponse {
    /// Task id the event belongs to.
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Event type, see [`crate::transport::sse::event_types`].
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Opaque event payload.
    #[serde(default)]
    pub data: serde_json::Value,

    /// Set on the terminal event of a stream.
    #[serde(default)]
    pub done: bool,
}

/// The state of a task in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Task has been submitted but not yet started.
    Submitted,

    /// Task is actively being worked on.
    Working,

    /// Task completed successfully (terminal).
    Completed,

    /// Task failed (terminal).
    Failed,

    /// Task was canceled by the client (terminal).
    Canceled,

    /// Task was rejected by the remote agent (terminal).
    Rejected,

    /// Task is paused, waiting for additional input from the client.
    InputRequired,

    /// Task is paused, waiting for authentication/authorization.
    AuthRequired,
}

impl TaskState {
    /// Parse a status string in any of the casings agents use
    /// (`completed`, `COMPLETED`, `input-required`, `input_required`, ...).
    pub fn parse(status: &str) -> Option<Self> {
        let normalized: String = status
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "submitted" | "pending" => Some(TaskState::Submitted),
            "working" | "running" => Some(TaskState::Working),
            "completed" | "done" => Some(TaskState::Completed),
            "failed" => Some(TaskState::Failed),
            "canceled" | "cancelled" => Some(TaskState::Canceled),
            "rejected" => Some(TaskState::Rejected),
            "inputrequired" => Some(TaskState::InputRequired),
            "authrequired" => Some(TaskState::AuthRequired),
            _ => None,
        }
    }

    /// Check if the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled | TaskState::Rejected
        )
    }

    /// Check if the state is interrupted (needs input or auth).
    pub fn is_interrupted(&self) -> bool {
        matches!(self, TaskState::InputRequired | TaskState::AuthRequired)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Submitted => write!(f, "submitted"),
            TaskState::Working => write!(f, "working"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Canceled => write!(f, "canceled"),
            TaskState::Rejected => write!(f, "rejected"),
            TaskState::InputRequired => write!(f, "input-required"),
            TaskState::AuthRequired => write!(f, "auth-required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parsing() {
        assert_eq!(TaskState::parse("COMPLETED"), Some(TaskState::Completed));
        assert_eq!(TaskState::parse("input-required"), Some(TaskState::InputRequired));
        assert_eq!(TaskState::parse("INPUT_REQUIRED"), Some(TaskState::InputRequired));
        assert_eq!(TaskState::parse("cancelled"), Some(TaskState::Canceled));
        assert_eq!(TaskState::parse("mystery"), None);
        assert!(TaskState::Rejected.is_terminal());
        assert!(!TaskState::Working.is_terminal());
        assert!(TaskState::AuthRequired.is_interrupted());
    }

    #[test]
    fn test_task_status_decoding() {
        let status: TaskStatus = serde_json::from_value(serde_json::json!({
            "id": "task-1",
            "status": "working",
            "progress": 1.4,
            "started_at": "2025-01-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(status.state(), Some(TaskState::Working));
        assert_eq!(status.progress_fraction(), Some(1.0));
        assert!(status.started_at.is_some());
        assert!(status.completed_at.is_none());
    }

    #[test]
    fn test_stream_response_decoding() {
        let event: StreamResponse = serde_json::from_str(
            r#"{"id":"task-1","timestamp":"2025-01-01T10:00:00Z","type":"progress","data":{"pct":50}}"#,
        )
        .unwrap();
        assert_eq!(event.kind, "progress");
        assert_eq!(event.data["pct"], 50);
        assert!(!event.done);
    }
}
