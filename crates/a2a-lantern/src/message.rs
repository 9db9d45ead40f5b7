//! Message: communication units between agents in A2A.
//!
//! A Message carries an ordered sequence of Parts (text, file, or structured
//! data) and a role telling whether it comes from the user (client agent) or
//! from the remote agent.

use base64::Engine;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A message exchanged between agents during a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    /// Role of the sender.
    pub role: MessageRole,

    /// Content parts of the message, in order.
    #[serde(default)]
    pub parts: Vec<Part>,

    /// Optional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Message {
    /// Create a message from the user (client agent).
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: MessageRole::User,
            parts,
            metadata: None,
        }
    }

    /// Convenience: create a user message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    /// Extract all text content from this message.
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The client agent (sender).
    User,
    /// The remote agent (responder).
    Agent,
}

/// A part of a message, tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    /// Plain text content.
    Text { text: String },

    /// File content (inline or by reference).
    File { file: FilePart },

    /// Structured data (any JSON value).
    Data { data: serde_json::Value },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a file part from inline bytes.
    pub fn file_inline(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: &[u8],
    ) -> Self {
        Self::File {
            file: FilePart {
                name: name.into(),
                mime_type: mime_type.into(),
                size: content.len() as u64,
                url: None,
                content: Some(base64::engine::general_purpose::STANDARD.encode(content)),
            },
        }
    }

    /// Create a file part from a URL reference.
    pub fn file_url(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::File {
            file: FilePart {
                name: name.into(),
                mime_type: mime_type.into(),
                size: 0,
                url: Some(url.into()),
                content: None,
            },
        }
    }

    /// Create a structured data part.
    pub fn data(value: serde_json::Value) -> Self {
        Self::Data { data: value }
    }
}

/// A file attachment, either inline (base64) or by URL reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilePart {
    pub name: String,

    pub mime_type: String,

    /// Size in bytes (0 when unknown).
    #[serde(default)]
    pub size: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Base64-encoded inline content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FilePart {
    /// Decode the inline content, if any.
    pub fn decode_content(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        self.content
            .as_deref()
            .map(|c| base64::engine::general_purpose::STANDARD.decode(c))
    }
}
