//! A2A Client: JSON-RPC calls against a remote agent endpoint.
//!
//! The client is stateless apart from its HTTP pool and default headers, so a
//! single instance can be cloned and shared across tasks. It never retries;
//! retry policy belongs to discovery and to callers.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{A2AError, A2AResult};
use crate::message::Message;
use crate::task::{TaskRequest, TaskResponse, TaskStatus};
use crate::transport::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, EVENT_STREAM_MEDIA_TYPE, JSON_MEDIA_TYPE,
};
use crate::transport::sse::{self, TaskStream, STREAM_BUFFER};
use crate::transport::{build_http_client, status_error};

/// Default timeout for request/response calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a whole streamed call, body included.
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Options for [`A2AClient::new`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout of each request/response call.
    pub timeout: Duration,

    /// Timeout of a streamed call, including reading the event body.
    pub stream_timeout: Duration,

    /// Headers added verbatim to every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            headers: BTreeMap::new(),
        }
    }
}

/// Where a remote agent accepts JSON-RPC calls.
///
/// Gateways host many agents under one base URL; the endpoint is then
/// `base/agent_id` (`http://gw/api/a2a` + `kagent/k8s-agent`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAddress {
    base: Url,
    agent_id: Option<String>,
}

impl AgentAddress {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            agent_id: None,
        }
    }

    /// Parse a base URL.
    pub fn parse(base: &str) -> A2AResult<Self> {
        Ok(Self::new(Url::parse(base.trim())?))
    }

    /// Address a logical agent behind the base URL.
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        self.agent_id = (!agent_id.is_empty()).then_some(agent_id);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    /// The URL calls are POSTed to.
    pub fn endpoint(&self) -> Url {
        let mut url = self.base.clone();
        if let Some(agent_id) = &self.agent_id {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments
                    .pop_if_empty()
                    .extend(agent_id.split('/').filter(|s| !s.is_empty()));
            }
        }
        url
    }
}

impl From<Url> for AgentAddress {
    fn from(base: Url) -> Self {
        Self::new(base)
    }
}

impl fmt::Display for AgentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

/// JSON-RPC client for A2A agents.
#[derive(Debug, Clone)]
pub struct A2AClient {
    /// HTTP client.
    http: Client,

    /// Headers added to every request.
    headers: BTreeMap<String, String>,

    /// Optional bearer token for authentication.
    auth_token: Option<String>,

    stream_timeout: Duration,
}

impl Default for A2AClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl A2AClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            http: build_http_client(options.timeout),
            headers: options.headers,
            auth_token: None,
            stream_timeout: options.stream_timeout,
        }
    }

    /// Create a client with a custom HTTP client.
    pub fn with_http_client(http: Client) -> Self {
        Self {
            http,
            headers: BTreeMap::new(),
            auth_token: None,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        }
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set authentication token.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    // ── Core Operations ──────────────────────────────────────

    /// Submit a task and wait for the agent's answer (`tasks/send`).
    pub async fn send_task(
        &self,
        addr: &AgentAddress,
        request: &TaskRequest,
    ) -> A2AResult<TaskResponse> {
        let rpc_request = JsonRpcRequest::send_task(task_params(request));
        let response: TaskResponse = decode_result(self.call(addr, rpc_request).await?)?;
        ensure_task_id(&request.id, &response.id)?;
        Ok(response)
    }

    /// Send a standalone message (`message/send`).
    pub async fn send_message(
        &self,
        addr: &AgentAddress,
        message: &Message,
    ) -> A2AResult<TaskResponse> {
        let rpc_request = JsonRpcRequest::send_message(json!({ "message": message }));
        decode_result(self.call(addr, rpc_request).await?)
    }

    /// Query the status of a task (`tasks/status`).
    pub async fn get_task_status(
        &self,
        addr: &AgentAddress,
        task_id: &str,
    ) -> A2AResult<TaskStatus> {
        let rpc_request = JsonRpcRequest::task_status(task_id);
        let status: TaskStatus = decode_result(self.call(addr, rpc_request).await?)?;
        ensure_task_id(task_id, &status.id)?;
        Ok(status)
    }

    /// Cancel a running task (`tasks/cancel`).
    pub async fn cancel_task(&self, addr: &AgentAddress, task_id: &str) -> A2AResult<()> {
        let rpc_request = JsonRpcRequest::cancel_task(task_id);
        self.call(addr, rpc_request).await?;
        Ok(())
    }

    // ── Streaming Operations ─────────────────────────────────

    /// Submit a task and subscribe to its events (`tasks/sendSubscribe`).
    ///
    /// The call runs on a background task; every outcome, including a failed
    /// request, arrives through the returned [`TaskStream`]. The stream
    /// listens on a child of `cancel`: cancelling `cancel` stops it, while
    /// [`TaskStream::cancel`] stops only this stream.
    pub fn stream_task(
        &self,
        cancel: &CancellationToken,
        addr: &AgentAddress,
        request: &TaskRequest,
    ) -> TaskStream {
        let token = cancel.child_token();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        let url = addr.endpoint();
        let rpc_request = JsonRpcRequest::send_subscribe(task_params(request));
        tracing::debug!(
            method = %rpc_request.method,
            url = %url,
            task_id = %request.id,
            "Opening A2A stream"
        );
        let http_request = self
            .post(url)
            .header(ACCEPT, EVENT_STREAM_MEDIA_TYPE)
            .timeout(self.stream_timeout)
            .json(&rpc_request);

        let task_token = token.clone();
        tokio::spawn(async move {
            match open_stream(http_request, &task_token).await {
                Ok(Some(response)) => sse::pump(response, tx, task_token).await,
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "A2A stream request failed");
                    sse::deliver(&tx, &task_token, Err(e)).await;
                }
            }
        });

        TaskStream::new(rx, token)
    }

    // ── Internal ─────────────────────────────────────────────

    /// An `Authorization` entry in the header map wins over the bearer token.
    fn post(&self, url: Url) -> RequestBuilder {
        let mut request = self.http.post(url).header(CONTENT_TYPE, JSON_MEDIA_TYPE);
        let explicit_auth = self
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
        if let (Some(token), false) = (&self.auth_token, explicit_auth) {
            request = request.bearer_auth(token);
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    /// POST one JSON-RPC request and return its checked result payload.
    async fn call(
        &self,
        addr: &AgentAddress,
        rpc_request: JsonRpcRequest,
    ) -> A2AResult<Option<Value>> {
        let url = addr.endpoint();
        tracing::debug!(
            method = %rpc_request.method,
            url = %url,
            request_id = %rpc_request.id,
            "Sending A2A request"
        );

        let response = self
            .post(url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .json(&rpc_request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.bytes().await?;
        let envelope: JsonRpcResponse = serde_json::from_slice(&body)
            .map_err(|e| A2AError::Decode(format!("malformed JSON-RPC response: {e}")))?;
        envelope.check(&rpc_request)?;
        envelope.into_result()
    }
}

async fn open_stream(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> A2AResult<Option<Response>> {
    let response = tokio::select! {
        _ = cancel.cancelled() => return Ok(None),
        response = request.send() => response?,
    };
    // Anything but 200 carries no event stream.
    if response.status() != StatusCode::OK {
        return Err(status_error(response).await);
    }
    Ok(Some(response))
}

fn task_params(request: &TaskRequest) -> Value {
    json!({ "id": request.id, "message": request.message })
}

fn decode_result<T: DeserializeOwned>(result: Option<Value>) -> A2AResult<T> {
    let value = result.ok_or_else(|| A2AError::Decode("response carries no result".into()))?;
    serde_json::from_value(value).map_err(|e| A2AError::Decode(format!("unexpected result: {e}")))
}

fn ensure_task_id(expected: &str, actual: &str) -> A2AResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(A2AError::IdMismatch {
            what: "task id",
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
