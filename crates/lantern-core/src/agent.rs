//! Agent: a discovered remote agent as tracked by the registry.
//!
//! An `Agent` pairs the URL it was discovered at with its validated
//! [`AgentCard`]. Cards are immutable after discovery and shared through an
//! `Arc`, so cloning an agent out of the registry is cheap.

use std::sync::Arc;

use a2a_lantern::{A2AResult, AgentAddress, AgentCard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reachability of a registered agent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Registered, not yet confirmed reachable.
    #[default]
    Discovering,
    /// The card endpoint answered with a valid card.
    Online,
    /// The agent could not be reached.
    Offline,
    /// The agent answered, but with something unusable.
    Error,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Discovering => write!(f, "discovering"),
            AgentStatus::Online => write!(f, "online"),
            AgentStatus::Offline => write!(f, "offline"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// A remote agent known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier (registry key).
    pub id: String,

    /// Human-readable name, taken from the card.
    pub name: String,

    /// The URL the agent was discovered at.
    pub url: String,

    /// The validated agent card.
    pub card: Arc<AgentCard>,

    pub status: AgentStatus,

    /// When the agent was first registered.
    pub discovered_at: DateTime<Utc>,

    /// Last time the agent was confirmed reachable or its status was written.
    pub last_seen: DateTime<Utc>,
}

impl Agent {
    /// Build a registry record from a freshly discovered card. The id
    /// defaults to `name@version`.
    pub fn from_card(url: impl Into<String>, card: AgentCard) -> Self {
        let now = Utc::now();
        Self {
            id: card.qualified_name(),
            name: card.name.clone(),
            url: url.into(),
            card: Arc::new(card),
            status: AgentStatus::Online,
            discovered_at: now,
            last_seen: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    /// Check whether the card declares `capability`.
    pub fn supports(&self, capability: &str) -> bool {
        self.card.supports(capability)
    }

    /// The JSON-RPC address of the agent: the card's service URL when it
    /// declares one, otherwise the discovery URL.
    pub fn address(&self) -> A2AResult<AgentAddress> {
        AgentAddress::parse(self.card.url.as_deref().unwrap_or(&self.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(url: Option<&str>) -> AgentCard {
        AgentCard {
            name: "k8s-agent".into(),
            version: "1.2.0".into(),
            url: url.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_card() {
        let agent = Agent::from_card("http://gw:8083", card(None));
        assert_eq!(agent.id, "k8s-agent@1.2.0");
        assert_eq!(agent.status, AgentStatus::Online);
        assert_eq!(agent.discovered_at, agent.last_seen);
        assert_eq!(agent.address().unwrap().endpoint().as_str(), "http://gw:8083/");

        let agent = agent.with_id("kagent/k8s-agent");
        assert_eq!(agent.id, "kagent/k8s-agent");
        assert_eq!(agent.name, "k8s-agent");
    }

    #[test]
    fn test_address_prefers_card_url() {
        let agent = Agent::from_card("http://gw:8083", card(Some("http://gw:8083/api/a2a/k8s")));
        assert_eq!(
            agent.address().unwrap().endpoint().as_str(),
            "http://gw:8083/api/a2a/k8s"
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&AgentStatus::Offline).unwrap(), "\"offline\"");
        assert_eq!(AgentStatus::default(), AgentStatus::Discovering);
    }
}
