//! Agent Card: the self-describing metadata document for agent discovery.
//!
//! Every A2A-compatible agent publishes an Agent Card at:
//!   `/.well-known/agent.json`
//!
//! The card describes the agent's identity, capability flags, endpoints,
//! authentication requirements and skills. A card is immutable once it has
//! been fetched and validated.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::{A2AError, A2AResult};
use crate::transport::jsonrpc::methods;

/// An A2A Agent Card: metadata describing an agent's capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Human-readable name of the agent. Required.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Description of what the agent does.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Primary URL of the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Version of the agent. Required.
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,

    /// Capabilities declared by this agent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: AgentCapabilities,

    /// Authentication requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AgentAuthentication>,

    /// Default input content types accepted.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub default_input_modes: Vec<String>,

    /// Default output content types produced.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub default_output_modes: Vec<String>,

    /// Skills (specific abilities) of this agent.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub skills: Vec<AgentSkill>,

    /// Endpoints exposed by this agent.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub endpoints: Vec<Endpoint>,

    /// Opaque metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AgentCard {
    /// Discover an agent by fetching its Agent Card with default settings.
    ///
    /// Fetches `{base_url}/.well-known/agent.json` with the default retry
    /// policy. Use [`crate::Discoverer`] for control over timeouts, retries,
    /// headers and cancellation.
    pub async fn discover(base_url: &str) -> A2AResult<Self> {
        crate::discovery::Discoverer::default()
            .discover(&tokio_util::sync::CancellationToken::new(), base_url)
            .await
    }

    /// Validate required fields and every declared endpoint.
    ///
    /// The error names the offending field, e.g. `endpoints[1].url`.
    pub fn validate(&self) -> A2AResult<()> {
        if self.name.trim().is_empty() {
            return Err(A2AError::invalid_card("name", "agent name is required"));
        }
        if self.version.trim().is_empty() {
            return Err(A2AError::invalid_card("version", "agent version is required"));
        }
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            endpoint.validate().map_err(|e| match e {
                A2AError::InvalidAgentCard { field, reason } => A2AError::InvalidAgentCard {
                    field: format!("endpoints[{i}].{field}"),
                    reason,
                },
                other => other,
            })?;
        }
        Ok(())
    }

    /// Check if this agent supports streaming.
    pub fn supports_streaming(&self) -> bool {
        self.capabilities.streaming
    }

    /// Check if this agent supports push notifications.
    pub fn supports_push_notifications(&self) -> bool {
        self.capabilities.push_notifications
    }

    /// Check a capability flag by name; unknown names are `false`.
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.supports(capability)
    }

    /// Find a skill by ID.
    pub fn find_skill(&self, skill_id: &str) -> Option<&AgentSkill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    /// First endpoint of the given kind.
    pub fn endpoint(&self, kind: &EndpointKind) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| &e.kind == kind)
    }

    /// `name@version`, the default registry identity of the agent.
    pub fn qualified_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Capability flags declared by the agent.
///
/// The well-known flags are fields; anything else lands in `extra`. On the
/// wire the flags arrive either as an object of booleans or as a list of
/// capability names, and both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", from = "CapabilitiesRepr")]
pub struct AgentCapabilities {
    /// Whether the agent supports SSE streaming.
    pub streaming: bool,

    /// Whether the agent supports push notifications (webhooks).
    pub push_notifications: bool,

    /// Whether the agent keeps task state transition history.
    pub state_transition_history: bool,

    /// Flags outside the well-known set.
    #[serde(flatten)]
    pub extra: BTreeMap<String, bool>,
}

impl AgentCapabilities {
    /// Look a flag up by name.
    ///
    /// Matching ignores case, `-` and `_`, so `push-notifications` and
    /// `pushNotifications` are the same flag.
    pub fn supports(&self, capability: &str) -> bool {
        let wanted = normalize_capability(capability);
        match wanted.as_str() {
            "streaming" => self.streaming,
            "pushnotifications" => self.push_notifications,
            "statetransitionhistory" => self.state_transition_history,
            _ => self
                .extra
                .iter()
                .any(|(name, on)| *on && normalize_capability(name) == wanted),
        }
    }

    /// Names of all enabled flags.
    pub fn enabled(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.streaming {
            names.push("streaming".to_string());
        }
        if self.push_notifications {
            names.push("pushNotifications".to_string());
        }
        if self.state_transition_history {
            names.push("stateTransitionHistory".to_string());
        }
        names.extend(
            self.extra
                .iter()
                .filter(|(_, on)| **on)
                .map(|(name, _)| name.clone()),
        );
        names
    }

    fn set(&mut self, name: &str, on: bool) {
        match normalize_capability(name).as_str() {
            "streaming" => self.streaming = on,
            "pushnotifications" => self.push_notifications = on,
            "statetransitionhistory" => self.state_transition_history = on,
            _ => {
                self.extra.insert(name.to_string(), on);
            }
        }
    }
}

fn normalize_capability(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CapabilitiesRepr {
    Null,
    Flags(BTreeMap<String, serde_json::Value>),
    List(Vec<String>),
}

impl From<CapabilitiesRepr> for AgentCapabilities {
    fn from(repr: CapabilitiesRepr) -> Self {
        let mut caps = AgentCapabilities::default();
        match repr {
            CapabilitiesRepr::Null => {}
            CapabilitiesRepr::Flags(flags) => {
                // Non-boolean entries (e.g. extension lists) carry no flag.
                for (name, value) in flags {
                    if let Some(on) = value.as_bool() {
                        caps.set(&name, on);
                    }
                }
            }
            CapabilitiesRepr::List(names) => {
                for name in names {
                    caps.set(&name, true);
                }
            }
        }
        caps
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Kind of an endpoint. Unrecognized kinds are kept so validation can name them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// JSON-RPC task endpoint.
    A2a,
    /// SSE streaming endpoint.
    Streaming,
    /// Push-notification webhook.
    Webhook,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::A2a => f.write_str("a2a"),
            EndpointKind::Streaming => f.write_str("streaming"),
            EndpointKind::Webhook => f.write_str("webhook"),
            EndpointKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// An endpoint exposed by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Endpoint {
    #[serde(rename = "type")]
    pub kind: EndpointKind,

    pub url: String,

    /// JSON-RPC methods served at this endpoint.
    #[serde(default)]
    pub methods: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Extra headers to send to this endpoint.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Endpoint {
    /// Validate URL, kind and declared methods.
    pub fn validate(&self) -> A2AResult<()> {
        if self.url.trim().is_empty() {
            return Err(A2AError::invalid_card("url", "endpoint URL is required"));
        }
        let parsed = Url::parse(&self.url)
            .map_err(|e| A2AError::invalid_card("url", format!("invalid endpoint URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(A2AError::invalid_card(
                "url",
                format!("scheme must be http or https, got {}", parsed.scheme()),
            ));
        }

        if let EndpointKind::Other(kind) = &self.kind {
            return Err(A2AError::invalid_card(
                "type",
                format!("unsupported endpoint type {kind:?} (supported: a2a, streaming, webhook)"),
            ));
        }

        if self.kind == EndpointKind::A2a {
            if let Some((i, method)) = self
                .methods
                .iter()
                .enumerate()
                .find(|(_, m)| !methods::is_standard(m))
            {
                return Err(A2AError::invalid_card(
                    format!("methods[{i}]"),
                    format!("invalid A2A method {method:?}"),
                ));
            }
        }
        Ok(())
    }
}

/// Authentication requirements advertised by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgentAuthentication {
    /// Scheme names, e.g. `["bearer"]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// A specific skill/ability of the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Unique identifier for this skill.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Tags for categorization and search.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Example prompts that demonstrate this skill.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn a2a_endpoint(url: &str) -> Endpoint {
        Endpoint {
            kind: EndpointKind::A2a,
            url: url.into(),
            methods: vec!["tasks/send".into(), "tasks/sendSubscribe".into()],
            description: None,
            headers: BTreeMap::new(),
        }
    }

    fn valid_card() -> AgentCard {
        AgentCard {
            name: "k8s-agent".into(),
            description: "Answers questions about a Kubernetes cluster".into(),
            url: Some("https://agent.example.com".into()),
            version: "1.2.0".into(),
            capabilities: AgentCapabilities {
                streaming: true,
                ..Default::default()
            },
            endpoints: vec![
                a2a_endpoint("https://agent.example.com/a2a"),
                Endpoint {
                    kind: EndpointKind::Streaming,
                    url: "http://agent.example.com/stream".into(),
                    methods: vec![],
                    description: Some("SSE".into()),
                    headers: BTreeMap::new(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_agent_card() {
        let card: AgentCard = serde_json::from_value(serde_json::json!({
            "name": "summarizer",
            "description": "Summarizes documents",
            "url": "https://agent.example.com",
            "version": "1.0.0",
            "capabilities": {"streaming": true, "pushNotifications": false, "x-vision": true},
            "defaultInputModes": ["text/plain"],
            "skills": [{"id": "summarize", "name": "Summarize"}],
            "endpoints": [{"type": "a2a", "url": "https://agent.example.com/a2a", "methods": ["tasks/send"]}]
        }))
        .unwrap();

        assert_eq!(card.name, "summarizer");
        assert!(card.supports_streaming());
        assert!(card.supports("x-vision"));
        assert!(!card.supports("push-notifications"));
        assert_eq!(card.default_input_modes, vec!["text/plain".to_string()]);
        assert!(card.find_skill("summarize").is_some());
        assert!(card.validate().is_ok());
    }

    #[test]
    fn test_capabilities_as_name_list() {
        let caps: AgentCapabilities =
            serde_json::from_value(serde_json::json!(["streaming", "state-transition-history"]))
                .unwrap();
        assert!(caps.streaming);
        assert!(caps.state_transition_history);
        assert!(caps.supports("stateTransitionHistory"));
        assert!(!caps.supports("unknown-capability"));
    }

    #[test]
    fn test_null_optional_fields_read_as_empty() {
        let card: AgentCard = serde_json::from_value(serde_json::json!({
            "name": "x",
            "version": "1",
            "description": null,
            "capabilities": null,
            "endpoints": null,
            "skills": null,
            "defaultInputModes": null
        }))
        .unwrap();

        assert_eq!(card.description, "");
        assert_eq!(card.capabilities, AgentCapabilities::default());
        assert!(card.endpoints.is_empty());
        assert!(card.skills.is_empty());
        assert!(card.validate().is_ok());

        let caps: AgentCapabilities = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert!(caps.enabled().is_empty());

        let nameless: AgentCard =
            serde_json::from_value(serde_json::json!({"name": null, "version": "1"})).unwrap();
        assert!(matches!(
            nameless.validate(),
            Err(A2AError::InvalidAgentCard { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_validate_requires_name_and_version() {
        let mut card = valid_card();
        card.name = String::new();
        assert!(matches!(
            card.validate(),
            Err(A2AError::InvalidAgentCard { ref field, .. }) if field == "name"
        ));

        let mut card = valid_card();
        card.version = "  ".into();
        assert!(matches!(
            card.validate(),
            Err(A2AError::InvalidAgentCard { ref field, .. }) if field == "version"
        ));

        let missing: AgentCard = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_validate_names_offending_endpoint() {
        let mut card = valid_card();
        card.endpoints[1].url = "ftp://agent.example.com/stream".into();
        match card.validate() {
            Err(A2AError::InvalidAgentCard { field, .. }) => assert_eq!(field, "endpoints[1].url"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let mut card = valid_card();
        card.endpoints[0].methods.push("tasks/explode".into());
        match card.validate() {
            Err(A2AError::InvalidAgentCard { field, .. }) => {
                assert_eq!(field, "endpoints[0].methods[2]")
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let mut card = valid_card();
        card.endpoints[0].url = "/relative/path".into();
        assert!(card.validate().is_err());
    }

    #[test]
    fn test_unknown_endpoint_type_fails_validation_not_parsing() {
        let endpoint: Endpoint = serde_json::from_value(serde_json::json!({
            "type": "grpc",
            "url": "https://agent.example.com/grpc"
        }))
        .unwrap();
        assert_eq!(endpoint.kind, EndpointKind::Other("grpc".into()));
        assert!(matches!(
            endpoint.validate(),
            Err(A2AError::InvalidAgentCard { ref field, .. }) if field == "type"
        ));
    }

    #[test]
    fn test_non_a2a_endpoints_skip_method_checks() {
        let endpoint = Endpoint {
            kind: EndpointKind::Webhook,
            url: "https://hooks.example.com/in".into(),
            methods: vec!["POST".into()],
            description: None,
            headers: BTreeMap::new(),
        };
        assert!(endpoint.validate().is_ok());
    }

    #[test]
    fn test_valid_card_passes() {
        let card = valid_card();
        assert!(card.validate().is_ok());
        assert_eq!(card.qualified_name(), "k8s-agent@1.2.0");
        assert_eq!(
            card.endpoint(&EndpointKind::Streaming).map(|e| e.url.as_str()),
            Some("http://agent.example.com/stream")
        );
    }
}
