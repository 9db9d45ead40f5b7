//! Credentials rendered as request headers.
//!
//! The protocol crate only knows about a header map; this module turns a
//! configured credential into that map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LanternError, LanternResult};

/// Supported credential kinds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    #[default]
    None,
    Bearer,
    #[serde(alias = "apikey")]
    ApiKey,
    /// Accepted in configuration so it can be rejected with a clear error.
    #[serde(rename = "oauth2")]
    OAuth2,
}

/// Credentials for talking to agents, typically the `[auth]` config section.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default, rename = "type")]
    pub kind: AuthKind,

    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Extra headers sent regardless of kind.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("token", &redact(&self.token))
            .field("api_key", &redact(&self.api_key))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            kind: AuthKind::Bearer,
            token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            kind: AuthKind::ApiKey,
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Check that the credential carries what its kind needs.
    pub fn validate(&self) -> LanternResult<()> {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        match self.kind {
            AuthKind::None => Ok(()),
            AuthKind::Bearer if present(&self.token) => Ok(()),
            AuthKind::Bearer => Err(LanternError::Auth("bearer token is required".into())),
            AuthKind::ApiKey if present(&self.api_key) => Ok(()),
            AuthKind::ApiKey => Err(LanternError::Auth("API key is required".into())),
            AuthKind::OAuth2 => Err(LanternError::Auth(
                "oauth2 credentials are not supported".into(),
            )),
        }
    }

    /// Render the credential as request headers.
    pub fn to_headers(&self) -> LanternResult<BTreeMap<String, String>> {
        self.validate()?;

        let mut headers = self.headers.clone();
        match (self.kind, &self.token, &self.api_key) {
            (AuthKind::Bearer, Some(token), _) => {
                headers.insert("Authorization".into(), format!("Bearer {token}"));
            }
            (AuthKind::ApiKey, _, Some(key)) => {
                headers.insert("X-API-Key".into(), key.clone());
                headers.insert("Authorization".into(), format!("ApiKey {key}"));
            }
            _ => {}
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bearer_headers() {
        let headers = Credentials::bearer("abc")
            .with_header("X-Tenant", "blue")
            .to_headers()
            .unwrap();
        assert_eq!(headers["Authorization"], "Bearer abc");
        assert_eq!(headers["X-Tenant"], "blue");
    }

    #[test]
    fn test_api_key_headers() {
        let headers = Credentials::api_key("k-1").to_headers().unwrap();
        assert_eq!(headers["X-API-Key"], "k-1");
        assert_eq!(headers["Authorization"], "ApiKey k-1");
    }

    #[test]
    fn test_validation() {
        assert!(Credentials::default().to_headers().unwrap().is_empty());
        assert!(matches!(
            Credentials::bearer("").validate(),
            Err(LanternError::Auth(_))
        ));

        let oauth: Credentials = toml::from_str("type = \"oauth2\"").unwrap();
        assert_eq!(oauth.kind, AuthKind::OAuth2);
        assert!(oauth.to_headers().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::bearer("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
