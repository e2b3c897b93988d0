//! Daemon client: typed HTTP access to one daemon server.
//!
//! Wraps a `reqwest` client configured with the server's base URL and
//! bearer credential. Path segments are percent-escaped individually, so
//! proxy and group names may contain spaces or slashes. Request bodies are
//! JSON and never escaped.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use clashctl_config::{ConfigStore, ServerConfig};

use crate::error::CtlError;
use crate::types::*;

/// Client for one daemon server.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    http: reqwest::Client,
    base: Url,
    websocket_base: String,
    secret: Option<String>,
}

impl DaemonClient {
    /// Create a client for the given server.
    pub fn new(server: &ServerConfig) -> Result<Self, CtlError> {
        Self::build(server, None)
    }

    /// Create a client for the server currently selected in `store`.
    pub async fn for_selected(store: &ConfigStore) -> Result<Self, CtlError> {
        let (name, server) = store.selected_server().await?;
        debug!(server = %name, "using selected server");
        Self::new(&server)
    }

    /// Create a client whose every request is bounded by `timeout`.
    pub fn with_timeout(server: &ServerConfig, timeout: Duration) -> Result<Self, CtlError> {
        Self::build(server, Some(timeout))
    }

    fn build(server: &ServerConfig, timeout: Option<Duration>) -> Result<Self, CtlError> {
        let base = Url::parse(&server.base_url())
            .map_err(|e| CtlError::Validation(format!("invalid server address: {e}")))?;

        let mut headers = HeaderMap::new();
        if let Some(secret) = &server.secret {
            let mut value = HeaderValue::from_str(&format!("Bearer {secret}")).map_err(|_| {
                CtlError::Validation("secret contains characters not allowed in a header".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| CtlError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            websocket_base: server.websocket_url(),
            secret: server.secret.clone(),
        })
    }

    /// Base URL of the HTTP API.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Streaming socket URL for `path` (e.g. `/traffic`).
    pub fn websocket_url(&self, path: &str) -> String {
        format!("{}{path}", self.websocket_base)
    }

    /// Bearer credential, when the server has a secret.
    pub fn bearer(&self) -> Option<String> {
        self.secret.as_ref().map(|secret| format!("Bearer {secret}"))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CtlError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CtlError::Validation(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>, CtlError> {
        let url = self.endpoint(segments)?;
        debug!(method = %method, path = url.path(), "daemon request");

        let mut builder = self.http.request(method, url.clone());
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.header("content-type", "application/json").body(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CtlError::Transport(format!("request to {} timed out", url.path()))
            } else {
                CtlError::Transport(e.to_string())
            }
        })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CtlError::Transport(format!("failed to read response body: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Err(CtlError::NotFound(format!("resource {}", url.path())));
        }
        if !status.is_success() {
            if let Ok(err) = serde_json::from_slice::<ErrorBody>(&bytes) {
                return Err(CtlError::Daemon(err.message));
            }
            return Err(CtlError::Daemon(format!("unexpected status: {status}")));
        }

        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<T, CtlError> {
        let body = self
            .request(Method::GET, segments, query, None, timeout)
            .await?;
        serde_json::from_slice(&body)
            .map_err(|e| CtlError::Decode(format!("{}: {e}", segments.join("/"))))
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CtlError> {
        serde_json::to_vec(value)
            .map_err(|e| CtlError::Validation(format!("failed to serialize request: {e}")))
    }

    // ── Typed API methods ──────────────────────────────────────────────

    /// The full proxy map.
    pub async fn proxies(&self) -> Result<ProxiesResponse, CtlError> {
        self.get_json(&["proxies"], &[], None).await
    }

    /// One proxy or group by name.
    pub async fn proxy(&self, name: &str) -> Result<Proxy, CtlError> {
        self.get_json(&["proxies", name], &[], None).await
    }

    /// Set the active member of a selector group.
    pub async fn select_proxy(&self, group: &str, member: &str) -> Result<(), CtlError> {
        let body = Self::encode(&SelectRequest {
            name: member.to_string(),
        })?;
        self.request(Method::PUT, &["proxies", group], &[], Some(body), None)
            .await?;
        Ok(())
    }

    /// Ask the daemon to time `name` against `url`.
    pub async fn proxy_delay(
        &self,
        name: &str,
        url: &str,
        timeout_ms: u64,
        request_timeout: Duration,
    ) -> Result<DelayResponse, CtlError> {
        let timeout = timeout_ms.to_string();
        self.get_json(
            &["proxies", name, "delay"],
            &[("timeout", timeout.as_str()), ("url", url)],
            Some(request_timeout),
        )
        .await
    }

    /// Current routing mode.
    pub async fn mode(&self) -> Result<ModeConfig, CtlError> {
        self.get_json(&["configs"], &[], None).await
    }

    /// Switch the routing mode.
    pub async fn set_mode(&self, mode: Mode) -> Result<(), CtlError> {
        let body = Self::encode(&ModeConfig {
            mode: mode.to_string(),
        })?;
        self.request(Method::PATCH, &["configs"], &[], Some(body), None)
            .await?;
        Ok(())
    }

    /// Snapshot of tracked connections.
    pub async fn connections(&self) -> Result<ConnectionsSnapshot, CtlError> {
        self.get_json(&["connections"], &[], None).await
    }

    /// Liveness check. Only the status matters; the body is not decoded.
    pub async fn version(&self, timeout: Duration) -> Result<(), CtlError> {
        self.request(Method::GET, &["version"], &[], None, Some(timeout))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = DaemonClient::new(&ServerConfig::new("127.0.0.1", 9090)).unwrap();
        let url = client.endpoint(&["proxies", "HK 01/fast", "delay"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9090/proxies/HK%2001%2Ffast/delay");
    }

    #[test]
    fn test_websocket_url() {
        let server = ServerConfig::new("10.0.0.1", 9090).with_https(true);
        let client = DaemonClient::new(&server).unwrap();
        assert_eq!(client.websocket_url("/traffic"), "wss://10.0.0.1:9090/traffic");
    }

    #[test]
    fn test_bearer_from_secret() {
        let plain = DaemonClient::new(&ServerConfig::new("h", 1)).unwrap();
        assert_eq!(plain.bearer(), None);

        let secured = DaemonClient::new(&ServerConfig::new("h", 1).with_secret("tok")).unwrap();
        assert_eq!(secured.bearer().as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn test_secret_with_newline_is_rejected() {
        let server = ServerConfig::new("h", 1).with_secret("bad\nsecret");
        assert!(matches!(
            DaemonClient::new(&server),
            Err(CtlError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_transport_error() {
        // Port 1 on loopback is reliably closed.
        let client = DaemonClient::new(&ServerConfig::new("127.0.0.1", 1)).unwrap();
        let result = client.proxies().await;
        assert!(matches!(result, Err(CtlError::Transport(_))));
    }
}
