//! Configuration for the Lantern SDK and CLI.
//!
//! Stored as TOML, by default at `<config dir>/lantern/config.toml`. Every
//! field has a default, so an empty or missing file is a valid configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use a2a_lantern::{ClientOptions, Discoverer};
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::error::{LanternError, LanternResult};
use crate::registry::RegistryConfig;

/// Overrides every request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "LANTERN_TIMEOUT_SECS";

/// Supplies a bearer token, replacing the `[auth]` section.
pub const ENV_BEARER_TOKEN: &str = "LANTERN_BEARER_TOKEN";

/// Lantern configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LanternConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Credentials applied to discovery and task calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credentials>,
}

impl LanternConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("lantern").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> LanternResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> LanternResult<Self> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> LanternResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment-style overrides from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> LanternResult<()> {
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                LanternError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"))
            })?;
            self.client.timeout_secs = secs;
            self.discovery.timeout_secs = secs;
        }
        if let Some(token) = lookup(ENV_BEARER_TOKEN).filter(|t| !t.is_empty()) {
            self.auth = Some(Credentials::bearer(token));
        }
        Ok(())
    }

    /// Reject values that would make timers or the registry unusable.
    pub fn validate(&self) -> LanternResult<()> {
        let positive = [
            ("client.timeout_secs", self.client.timeout_secs),
            ("discovery.timeout_secs", self.discovery.timeout_secs),
            ("registry.cleanup_interval_secs", self.registry.cleanup_interval_secs),
            ("registry.stale_threshold_secs", self.registry.stale_threshold_secs),
            ("registry.health_check_interval_secs", self.registry.health_check_interval_secs),
            ("registry.max_agents", self.registry.max_agents as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(LanternError::Config(format!("{name} must be greater than zero")));
            }
        }
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        Ok(())
    }

    /// Headers for every outgoing request: configured headers plus credentials.
    pub fn request_headers(&self) -> LanternResult<BTreeMap<String, String>> {
        let mut headers = self.client.headers.clone();
        if let Some(auth) = &self.auth {
            headers.extend(auth.to_headers()?);
        }
        Ok(headers)
    }

    pub fn client_options(&self) -> LanternResult<ClientOptions> {
        Ok(ClientOptions {
            timeout: self.client.timeout(),
            stream_timeout: self.client.stream_timeout(),
            headers: self.request_headers()?,
        })
    }

    pub fn discoverer(&self) -> LanternResult<Discoverer> {
        Ok(Discoverer::new(self.discovery.timeout())
            .with_retry_policy(self.discovery.max_retries, self.discovery.retry_delay())
            .with_headers(self.request_headers()?))
    }
}

/// `[client]`: JSON-RPC calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Budget for a whole streamed call.
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,

    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            stream_timeout_secs: default_stream_timeout_secs(),
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }
}

/// `[discovery]`: agent card fetching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// `[registry]`: registry housekeeping, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrySettings {
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: u64,

    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: default_cleanup_interval_secs(),
            stale_threshold_secs: default_stale_threshold_secs(),
            max_agents: default_max_agents(),
            health_check_interval_secs: default_health_check_interval_secs(),
        }
    }
}

impl From<&RegistrySettings> for RegistryConfig {
    fn from(settings: &RegistrySettings) -> Self {
        Self {
            cleanup_interval: Duration::from_secs(settings.cleanup_interval_secs),
            stale_threshold: Duration::from_secs(settings.stale_threshold_secs),
            max_agents: settings.max_agents,
            health_check_interval: Duration::from_secs(settings.health_check_interval_secs),
        }
    }
}

/// Telemetry/observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryConfig {
    /// Emit logs as JSON lines instead of text.
    #[serde(default)]
    pub json: bool,

    /// Whether to export traces over OTLP.
    #[serde(default)]
    pub otlp_enabled: bool,

    /// OTLP exporter endpoint.
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: false,
            otlp_enabled: false,
            otlp_endpoint: default_otlp_endpoint(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_stream_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_cleanup_interval_secs() -> u64 {
    5 * 60
}

fn default_stale_threshold_secs() -> u64 {
    10 * 60
}

fn default_max_agents() -> usize {
    100
}

fn default_health_check_interval_secs() -> u64 {
    60
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LanternConfig::from_toml_str("").unwrap();
        assert_eq!(config, LanternConfig::default());
        assert_eq!(config.client.timeout(), Duration::from_secs(30));
        assert_eq!(config.discovery.max_retries, 3);
        assert_eq!(config.discovery.retry_delay(), Duration::from_secs(2));

        let registry = RegistryConfig::from(&config.registry);
        assert_eq!(registry, RegistryConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_sections() {
        let config = LanternConfig::from_toml_str(
            r#"
            [client]
            timeout_secs = 5
            headers = { "X-Tenant" = "blue" }

            [registry]
            max_agents = 10
            stale_threshold_secs = 120

            [telemetry]
            json = true

            [auth]
            type = "api_key"
            api_key = "k-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.client.timeout_secs, 5);
        assert_eq!(config.registry.max_agents, 10);
        assert_eq!(config.registry.cleanup_interval_secs, 300);
        assert!(config.telemetry.json);

        let headers = config.request_headers().unwrap();
        assert_eq!(headers["X-Tenant"], "blue");
        assert_eq!(headers["X-API-Key"], "k-1");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = LanternConfig::default();
        config
            .apply_overrides(|name| match name {
                ENV_TIMEOUT_SECS => Some("7".into()),
                ENV_BEARER_TOKEN => Some("tok".into()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.client.timeout_secs, 7);
        assert_eq!(config.discovery.timeout_secs, 7);
        assert_eq!(config.auth.as_ref().map(|a| a.kind), Some(AuthKind::Bearer));

        let err = config
            .apply_overrides(|name| (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, LanternError::Config(_)));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let config = LanternConfig::from_toml_str("[registry]\nmax_agents = 0").unwrap();
        assert!(matches!(config.validate(), Err(LanternError::Config(_))));
        assert!(LanternConfig::from_toml_str("[client]\ntimeout_secs = \"x\"").is_err());
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = LanternConfig::load(Some(Path::new("/nonexistent/lantern.toml"))).unwrap_err();
        assert!(matches!(err, LanternError::Io(_)));
    }
}
