//! Wire types for the daemon's HTTP and streaming API.
//!
//! Field names follow the daemon's JSON exactly; unknown fields are
//! ignored so newer daemons stay compatible.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CtlError;

/// Reserved top-level group that is never treated as the rule selector.
pub const GLOBAL_GROUP: &str = "GLOBAL";

/// Proxy kind as reported by the daemon's `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProxyKind {
    Selector,
    Direct,
    Reject,
    /// Any other kind (`URLTest`, `Shadowsocks`, ...), passed through verbatim.
    Other(String),
}

impl Default for ProxyKind {
    fn default() -> Self {
        ProxyKind::Other(String::new())
    }
}

impl From<String> for ProxyKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Selector" => ProxyKind::Selector,
            "Direct" => ProxyKind::Direct,
            "Reject" => ProxyKind::Reject,
            _ => ProxyKind::Other(s),
        }
    }
}

impl From<ProxyKind> for String {
    fn from(kind: ProxyKind) -> Self {
        match kind {
            ProxyKind::Selector => "Selector".to_string(),
            ProxyKind::Direct => "Direct".to_string(),
            ProxyKind::Reject => "Reject".to_string(),
            ProxyKind::Other(s) => s,
        }
    }
}

/// One latency measurement. `0` means the probe failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelaySample {
    pub delay: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl DelaySample {
    pub fn new(delay: u64) -> Self {
        Self { delay, time: None }
    }
}

/// A proxy or proxy group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ProxyKind,

    /// Active member when this proxy is a group; empty otherwise.
    #[serde(default)]
    pub now: String,

    /// Member names when this proxy is a group.
    #[serde(default, deserialize_with = "null_as_default")]
    pub all: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<DelaySample>,
}

impl Proxy {
    pub fn new(name: impl Into<String>, kind: ProxyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    /// Placeholder for a group member the catalog does not know about.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::new(name, ProxyKind::default())
    }

    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all = members.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_now(mut self, now: impl Into<String>) -> Self {
        self.now = now.into();
        self
    }

    pub fn with_delay(mut self, delay: u64) -> Self {
        self.history.push(DelaySample::new(delay));
        self
    }

    /// The most recent delay sample, or `0` when none was recorded.
    pub fn latest_delay(&self) -> u64 {
        self.history.last().map_or(0, |sample| sample.delay)
    }

    pub fn is_selector(&self) -> bool {
        self.kind == ProxyKind::Selector
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /proxies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxiesResponse {
    pub proxies: BTreeMap<String, Proxy>,
}

/// `PUT /proxies/{group}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectRequest {
    pub name: String,
}

/// `GET /proxies/{name}/delay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayResponse {
    pub delay: u64,
}

/// Routing mode of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Rule,
    Global,
    Direct,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Rule, Mode::Global, Mode::Direct];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Rule => "rule",
            Mode::Global => "global",
            Mode::Direct => "direct",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = CtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                CtlError::Validation(format!("mode must be one of rule, global, direct; got {s:?}"))
            })
    }
}

/// `GET /configs` (only the field clashctl reads) and `PATCH /configs` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeConfig {
    pub mode: String,
}

/// `GET /connections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsSnapshot {
    #[serde(default)]
    pub download_total: u64,
    #[serde(default)]
    pub upload_total: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: Vec<Connection>,
}

/// One tracked connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub metadata: ConnectionMetadata,
    #[serde(default)]
    pub upload: u64,
    #[serde(default)]
    pub download: u64,
    /// RFC 3339 start time.
    #[serde(default)]
    pub start: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chains: Vec<String>,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub rule_payload: String,
}

/// Addressing details of a connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionMetadata {
    #[serde(default)]
    pub network: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "sourceIP", default)]
    pub source_ip: String,
    #[serde(rename = "destinationIP", default)]
    pub destination_ip: String,
    #[serde(rename = "sourcePort", default)]
    pub source_port: String,
    #[serde(rename = "destinationPort", default)]
    pub destination_port: String,
    #[serde(default)]
    pub host: String,
}

/// One `/traffic` frame, bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traffic {
    pub up: u64,
    pub down: u64,
}

/// `GET /version`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionResponse {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub premium: bool,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_proxy_group() {
        let json = r#"{
            "name": "Proxy Group",
            "type": "Selector",
            "now": "HK 01",
            "all": ["HK 01", "JP 02"],
            "history": [{"time": "2024-01-01T00:00:00Z", "delay": 120}],
            "udp": true
        }"#;
        let proxy: Proxy = serde_json::from_str(json).unwrap();
        assert_eq!(proxy.name, "Proxy Group");
        assert!(proxy.is_selector());
        assert_eq!(proxy.now, "HK 01");
        assert_eq!(proxy.all.len(), 2);
        assert_eq!(proxy.latest_delay(), 120);
    }

    #[test]
    fn test_decode_leaf_proxy_with_nulls() {
        let json = r#"{"name": "HK 01", "type": "Shadowsocks", "all": null, "history": null}"#;
        let proxy: Proxy = serde_json::from_str(json).unwrap();
        assert_eq!(proxy.kind, ProxyKind::Other("Shadowsocks".to_string()));
        assert!(proxy.now.is_empty());
        assert!(proxy.all.is_empty());
        assert_eq!(proxy.latest_delay(), 0);
    }

    #[test]
    fn test_latest_delay_uses_last_sample() {
        let proxy = Proxy::new("a", ProxyKind::Direct)
            .with_delay(300)
            .with_delay(0);
        assert_eq!(proxy.latest_delay(), 0);
        let proxy = Proxy::new("a", ProxyKind::Direct)
            .with_delay(0)
            .with_delay(42);
        assert_eq!(proxy.latest_delay(), 42);
    }

    #[test]
    fn test_proxy_kind_round_trip() {
        for raw in ["Selector", "Direct", "Reject", "URLTest"] {
            let kind = ProxyKind::from(raw.to_string());
            assert_eq!(String::from(kind), raw);
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("rule".parse::<Mode>().unwrap(), Mode::Rule);
        assert_eq!("global".parse::<Mode>().unwrap(), Mode::Global);
        assert_eq!("direct".parse::<Mode>().unwrap(), Mode::Direct);
        assert!(matches!("Rule".parse::<Mode>(), Err(CtlError::Validation(_))));
    }

    #[test]
    fn test_decode_connections_snapshot() {
        let json = r#"{
            "downloadTotal": 1024,
            "uploadTotal": 512,
            "connections": [{
                "id": "c1",
                "metadata": {
                    "network": "tcp",
                    "type": "HTTP",
                    "sourceIP": "192.168.1.2",
                    "destinationIP": "1.1.1.1",
                    "sourcePort": "51000",
                    "destinationPort": "443",
                    "host": "example.com"
                },
                "upload": 10,
                "download": 20,
                "start": "2024-01-01T00:00:00Z",
                "chains": ["HK 01", "Proxy"],
                "rule": "MATCH",
                "rulePayload": ""
            }]
        }"#;
        let snapshot: ConnectionsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.download_total, 1024);
        assert_eq!(snapshot.connections.len(), 1);
        let conn = &snapshot.connections[0];
        assert_eq!(conn.metadata.host, "example.com");
        assert_eq!(conn.metadata.destination_port, "443");
        assert_eq!(conn.chains, vec!["HK 01", "Proxy"]);
    }

    #[test]
    fn test_decode_empty_connections() {
        let json = r#"{"downloadTotal": 0, "uploadTotal": 0, "connections": null}"#;
        let snapshot: ConnectionsSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.connections.is_empty());
    }
}
