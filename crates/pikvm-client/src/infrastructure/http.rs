//! kvmd HTTP API client.
//!
//! [`PiKvmHttpClient`] implements [`HidTransport`] with one `POST` per HID
//! action and adds [`snapshot`](PiKvmHttpClient::snapshot) for screenshots.
//! All requests carry HTTP basic auth and share one connection pool.
//!
//! Query strings are built by the free `*_query` functions so they can be
//! checked without a device.

use async_trait::async_trait;
use pikvm_core::{KeyCode, MouseButton};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, warn};

use crate::application::transport::{HidTransport, TransportError};
use crate::infrastructure::storage::config::DeviceConfig;

pub const PRINT_ENDPOINT: &str = "/api/hid/print";
pub const KEY_ENDPOINT: &str = "/api/hid/events/send_key";
pub const MOUSE_MOVE_ENDPOINT: &str = "/api/hid/events/send_mouse_move";
pub const MOUSE_BUTTON_ENDPOINT: &str = "/api/hid/events/send_mouse_button";
pub const MOUSE_WHEEL_ENDPOINT: &str = "/api/hid/events/send_mouse_wheel";
pub const SNAPSHOT_ENDPOINT: &str = "/streamer/snapshot";

/// Query parameters for a plain, uncached snapshot.
pub const SNAPSHOT_QUERY: [(&str, &str); 5] = [
    ("save", "false"),
    ("load", "false"),
    ("allow_offline", "false"),
    ("ocr", "false"),
    ("preview", "false"),
];

type Query = Vec<(&'static str, String)>;

pub fn print_query(keymap: &str) -> Query {
    vec![("keymap", keymap.to_string()), ("slow", "false".to_string())]
}

/// `state` and `finish` are only sent together, and only with a state;
/// without one kvmd performs a full press-and-release.
pub fn key_query(key: KeyCode, state: Option<bool>, finish: bool) -> Query {
    let mut query = vec![("key", key.name().to_string())];
    if let Some(state) = state {
        query.push(("state", state.to_string()));
        query.push(("finish", finish.to_string()));
    }
    query
}

pub fn mouse_move_query(to_x: i16, to_y: i16) -> Query {
    vec![("to_x", to_x.to_string()), ("to_y", to_y.to_string())]
}

pub fn mouse_button_query(button: MouseButton, state: Option<bool>) -> Query {
    let mut query = vec![("button", button.name().to_string())];
    if let Some(state) = state {
        query.push(("state", state.to_string()));
    }
    query
}

pub fn mouse_wheel_query(delta_x: i16, delta_y: i16) -> Query {
    vec![("delta_x", delta_x.to_string()), ("delta_y", delta_y.to_string())]
}

/// HTTP transport for one PiKVM device.
#[derive(Debug, Clone)]
pub struct PiKvmHttpClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    keymap: String,
}

impl PiKvmHttpClient {
    /// Builds a client from the `[device]` configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Tls`] if the TLS backend cannot be
    /// initialised.
    pub fn new(device: &DeviceConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(!device.verify_tls)
            .timeout(device.request_timeout())
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        Ok(Self {
            http,
            base_url: device.base_url(),
            username: device.username.clone(),
            password: device.password.clone(),
            keymap: device.keymap.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the current screen as raw image bytes (JPEG from kvmd).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] for a non-success status and
    /// [`TransportError::Request`] if no response arrives.
    pub async fn snapshot(&self) -> Result<Vec<u8>, TransportError> {
        let request = self
            .http
            .get(self.url(SNAPSHOT_ENDPOINT))
            .query(&SNAPSHOT_QUERY);
        let response = self.execute(SNAPSHOT_ENDPOINT, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error(SNAPSHOT_ENDPOINT, e))?;
        debug!("snapshot: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn post(&self, endpoint: &'static str, query: Query) -> Result<(), TransportError> {
        let request = self.http.post(self.url(endpoint)).query(&query);
        self.execute(endpoint, request).await.map(drop)
    }

    async fn execute(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        debug!("{endpoint}");
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| request_error(endpoint, e))?;
        check_status(endpoint, response.status())?;
        Ok(response)
    }
}

fn request_error(endpoint: &'static str, e: reqwest::Error) -> TransportError {
    TransportError::Request {
        endpoint,
        source: Box::new(e),
    }
}

fn check_status(endpoint: &'static str, status: StatusCode) -> Result<(), TransportError> {
    if status.is_success() {
        return Ok(());
    }
    warn!("{endpoint} returned {status}");
    Err(TransportError::Status {
        endpoint,
        status: status.as_u16(),
    })
}

#[async_trait]
impl HidTransport for PiKvmHttpClient {
    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        let request = self
            .http
            .post(self.url(PRINT_ENDPOINT))
            .query(&print_query(&self.keymap))
            .body(text.to_string());
        self.execute(PRINT_ENDPOINT, request).await.map(drop)
    }

    async fn send_key(
        &self,
        key: KeyCode,
        state: Option<bool>,
        finish: bool,
    ) -> Result<(), TransportError> {
        self.post(KEY_ENDPOINT, key_query(key, state, finish)).await
    }

    async fn send_mouse_move(&self, to_x: i16, to_y: i16) -> Result<(), TransportError> {
        self.post(MOUSE_MOVE_ENDPOINT, mouse_move_query(to_x, to_y))
            .await
    }

    async fn send_mouse_button(
        &self,
        button: MouseButton,
        state: Option<bool>,
    ) -> Result<(), TransportError> {
        self.post(MOUSE_BUTTON_ENDPOINT, mouse_button_query(button, state))
            .await
    }

    async fn send_mouse_wheel(&self, delta_x: i16, delta_y: i16) -> Result<(), TransportError> {
        self.post(MOUSE_WHEEL_ENDPOINT, mouse_wheel_query(delta_x, delta_y))
            .await
    }
}
