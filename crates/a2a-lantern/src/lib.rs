//! # a2a-lantern
//!
//! Client side of the Agent-to-Agent (A2A) protocol: find an agent through
//! its Agent Card, then talk to it over JSON-RPC 2.0, optionally streaming
//! task events back as Server-Sent Events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a2a_lantern::{A2AClient, AgentAddress, AgentCard, Message, TaskRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Discover a remote agent
//!     let card = AgentCard::discover("agent.example.com").await?;
//!     println!("Found: {}", card.qualified_name());
//!
//!     // Send it a task
//!     let client = A2AClient::default();
//!     let addr = AgentAddress::parse("http://agent.example.com/api/a2a")?.with_agent("helper");
//!     let request = TaskRequest::with_random_id(Message::user_text("Summarize Q4 report"));
//!     let response = client.send_task(&addr, &request).await?;
//!     println!("Task state: {}", response.status);
//!     Ok(())
//! }
//! ```

pub mod agent_card;
pub mod client;
pub mod discovery;
pub mod error;
pub mod message;
pub mod task;
pub mod transport;

// Re-export primary types
pub use agent_card::{
    AgentAuthentication, AgentCapabilities, AgentCard, AgentSkill, Endpoint, EndpointKind,
};
pub use client::{A2AClient, AgentAddress, ClientOptions};
pub use discovery::{build_discovery_url, Discoverer};
pub use error::{A2AError, A2AResult, ErrorKind};
pub use message::{FilePart, Message, MessageRole, Part};
pub use task::{StreamResponse, TaskRequest, TaskResponse, TaskState, TaskStatus};
pub use transport::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use transport::sse::TaskStream;
