//! Live traffic stream over the daemon's websocket endpoint.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite;
use tracing::{info, warn};

use crate::client::DaemonClient;
use crate::error::CtlError;
use crate::types::Traffic;

/// Bound on the websocket handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Path of the traffic stream on the daemon.
pub const TRAFFIC_PATH: &str = "/traffic";

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// An open traffic stream.
#[derive(Debug)]
pub struct TrafficStream {
    stream: WsStream,
}

impl TrafficStream {
    /// Open the stream, authenticating with the client's bearer credential.
    pub async fn connect(client: &DaemonClient) -> Result<Self, CtlError> {
        use tungstenite::client::IntoClientRequest;

        let url = client.websocket_url(TRAFFIC_PATH);
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| CtlError::Validation(format!("invalid websocket url {url}: {e}")))?;
        if let Some(bearer) = client.bearer() {
            let value = tungstenite::http::HeaderValue::from_str(&bearer).map_err(|_| {
                CtlError::Validation("secret contains characters not allowed in a header".into())
            })?;
            request
                .headers_mut()
                .insert(tungstenite::http::header::AUTHORIZATION, value);
        }

        let (stream, _response) =
            tokio::time::timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| CtlError::Transport(format!("websocket handshake with {url} timed out")))?
                .map_err(|e| CtlError::Transport(format!("websocket connect failed: {e}")))?;
        info!(url = %url, "traffic stream opened");
        Ok(Self { stream })
    }

    /// Next decoded frame, or `None` once the daemon closes the stream.
    pub async fn next_frame(&mut self) -> Option<Result<Traffic, CtlError>> {
        loop {
            let decoded = match self.stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => serde_json::from_str(&text),
                Ok(tungstenite::Message::Binary(data)) => serde_json::from_slice(&data),
                Ok(tungstenite::Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => {
                    return Some(Err(CtlError::Transport(format!(
                        "websocket read error: {e}"
                    ))));
                }
            };
            return Some(decoded.map_err(|e| CtlError::Decode(format!("traffic frame: {e}"))));
        }
    }

    /// Feed frames to `on_frame` until `shutdown` resolves.
    ///
    /// Unreadable frames are logged and skipped. If the daemon ends the
    /// stream first, this keeps waiting for `shutdown`.
    pub async fn follow<S, F>(mut self, shutdown: S, mut on_frame: F)
    where
        S: Future<Output = ()>,
        F: FnMut(Traffic),
    {
        tokio::pin!(shutdown);
        let mut open = true;
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                frame = self.next_frame(), if open => match frame {
                    Some(Ok(traffic)) => on_frame(traffic),
                    Some(Err(e)) => warn!(error = %e, "traffic frame skipped"),
                    None => {
                        info!("traffic stream closed by daemon");
                        open = false;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clashctl_config::ServerConfig;

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        let client = DaemonClient::new(&ServerConfig::new("127.0.0.1", 1)).unwrap();
        assert!(matches!(
            TrafficStream::connect(&client).await,
            Err(CtlError::Transport(_))
        ));
    }
}
