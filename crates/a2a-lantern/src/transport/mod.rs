//! Transport layer: wire-level protocol bindings for A2A.
//!
//! - JSON-RPC 2.0 over HTTP (request/response)
//! - SSE (Server-Sent Events) for streaming

pub mod jsonrpc;
pub mod sse;

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::A2AError;

/// Longest response body excerpt carried by [`A2AError::HttpStatus`].
const ERROR_BODY_LIMIT: usize = 512;

pub(crate) const USER_AGENT: &str =
    concat!("lantern/", env!("CARGO_PKG_VERSION"), " (A2A-Protocol-Client)");

/// Build the HTTP client shared by discovery and task calls.
pub fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .build()
        .unwrap_or_default()
}

/// Turn a non-2xx response into [`A2AError::HttpStatus`], keeping the start
/// of the body for diagnostics.
pub(crate) async fn status_error(response: Response) -> A2AError {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('…');
    }
    A2AError::HttpStatus { status, url, body }
}
