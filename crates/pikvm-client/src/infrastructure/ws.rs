//! kvmd WebSocket client (`/api/ws`).
//!
//! kvmd authenticates WebSocket clients with the `X-KVMD-User` and
//! `X-KVMD-Passwd` request headers rather than basic auth.  Events are sent
//! as JSON text frames; nothing the device sends back is consumed.

use async_trait::async_trait;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use pikvm_core::ScriptEvent;

use crate::application::transport::{EventSink, TransportError};
use crate::infrastructure::storage::config::DeviceConfig;

pub const USER_HEADER: &str = "X-KVMD-User";
pub const PASSWORD_HEADER: &str = "X-KVMD-Passwd";

/// An open `/api/ws` session.
pub struct KvmdSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl KvmdSocket {
    /// Connects to the device described by `device`.
    ///
    /// `wss` connections accept self-signed certificates unless
    /// `verify_tls` is set.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Tls`] if the TLS connector cannot be built
    /// and [`TransportError::WebSocket`] if the handshake fails.
    pub async fn connect(device: &DeviceConfig) -> Result<Self, TransportError> {
        let url = device.ws_url();
        let request = kvmd_request(&url, &device.username, &device.password)?;
        let connector = if url.starts_with("wss://") {
            Some(tls_connector(device.verify_tls)?)
        } else {
            None
        };

        let (stream, response) = connect_async_tls_with_config(request, None, false, connector)
            .await
            .map_err(ws_error)?;
        info!("connected to {url} (HTTP {})", response.status());
        Ok(Self { stream })
    }
}

/// Builds the upgrade request for `url` with kvmd's auth headers.
///
/// # Errors
///
/// Returns [`TransportError::WebSocket`] for a malformed URL or a credential
/// that is not a valid header value.
pub fn kvmd_request(url: &str, username: &str, password: &str) -> Result<Request, TransportError> {
    let mut request = url.into_client_request().map_err(ws_error)?;
    let headers = request.headers_mut();
    headers.insert(USER_HEADER, header_value(USER_HEADER, username)?);
    headers.insert(PASSWORD_HEADER, header_value(PASSWORD_HEADER, password)?);
    Ok(request)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::WebSocket(format!("invalid {name} header: {e}")))
}

fn tls_connector(verify_tls: bool) -> Result<Connector, TransportError> {
    let tls = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(!verify_tls)
        .danger_accept_invalid_hostnames(!verify_tls)
        .build()
        .map_err(|e| TransportError::Tls(e.to_string()))?;
    Ok(Connector::NativeTls(tls))
}

fn ws_error(e: WsError) -> TransportError {
    TransportError::WebSocket(e.to_string())
}

#[async_trait]
impl EventSink for KvmdSocket {
    async fn send_event(&mut self, event: &ScriptEvent) -> Result<(), TransportError> {
        let frame = event.to_frame();
        debug!("ws -> {frame}");
        self.stream
            .send(WsMessage::Text(frame))
            .await
            .map_err(ws_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(ws_error(e)),
        }
    }
}
