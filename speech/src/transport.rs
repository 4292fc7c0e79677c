//! Duplex binary-message transport to the synthesis engine.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use uuid::Uuid;

use crate::{Result, SpeechError};

/// Resource identifier naming the bidirectional synthesis engine.
pub const RESOURCE_ID: &str = "tts.bidirectional.v1";

/// Credentials and identifiers sent as headers when dialing.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Application identifier.
    pub app_key: String,
    /// Access credential.
    pub access_key: String,
    /// Engine resource identifier; [`RESOURCE_ID`] unless overridden.
    pub resource_id: String,
    /// Correlation id, unique per dial.
    pub connect_id: String,
}

impl AuthConfig {
    /// Build an auth config with a fresh per-dial correlation id.
    pub fn new(app_key: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            access_key: access_key.into(),
            resource_id: RESOURCE_ID.to_string(),
            connect_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Ordered, reliable duplex channel carrying discrete binary messages.
///
/// The session state machine is written against this trait; the WebSocket
/// implementation below is the production one, tests drive the machine with
/// scripted in-memory transports.
#[async_trait]
pub trait Transport: Send {
    /// Send one binary message.
    async fn send(&mut self, data: Vec<u8>) -> Result<()>;
    /// Receive the next binary message.
    async fn receive(&mut self) -> Result<Vec<u8>>;
    /// Close the channel. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// WebSocket transport backed by `tokio-tungstenite`.
#[derive(Debug)]
pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    /// Dial `endpoint` with the auth headers the engine expects.
    pub async fn connect(endpoint: &str, auth: &AuthConfig) -> Result<Self> {
        let mut request = endpoint
            .into_client_request()
            .map_err(|e| SpeechError::ConnectFailed(e.to_string()))?;
        let headers = request.headers_mut();
        for (name, value) in [
            ("X-Api-App-Key", auth.app_key.as_str()),
            ("X-Api-Access-Key", auth.access_key.as_str()),
            ("X-Api-Resource-Id", auth.resource_id.as_str()),
            ("X-Api-Connect-Id", auth.connect_id.as_str()),
        ] {
            let value = HeaderValue::from_str(value)
                .map_err(|e| SpeechError::ConnectFailed(e.to_string()))?;
            headers.insert(name, value);
        }
        let (inner, response) = connect_async(request)
            .await
            .map_err(|e| SpeechError::ConnectFailed(e.to_string()))?;
        debug!(status = %response.status(), connect_id = %auth.connect_id, "connected");
        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, data: Vec<u8>) -> Result<()> {
        self.inner
            .send(Message::Binary(data.into()))
            .await
            .map_err(|e| SpeechError::Transport(e.to_string()))
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(data.to_vec()),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed the connection");
                    return Err(SpeechError::ConnectionClosed);
                }
                // Text frames and ping/pong are not part of the protocol.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SpeechError::Transport(e.to_string())),
                None => return Err(SpeechError::ConnectionClosed),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.inner.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(SpeechError::Transport(e.to_string())),
        }
    }
}
