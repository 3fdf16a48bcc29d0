//! Infrastructure layer for the PiKVM client.
//!
//! Contains the adapters that touch the outside world: the kvmd HTTP API,
//! the kvmd WebSocket, and the configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `pikvm_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`http`** – `PiKvmHttpClient`, the reqwest implementation of
//!   `HidTransport`, plus screenshots.
//!
//! - **`ws`** – `KvmdSocket`, the tokio-tungstenite implementation of
//!   `EventSink` used for event-script replay.
//!
//! - **`storage`** – TOML configuration file loading and saving.
//!
//! - **`mock`** – `RecordingTransport`, which records calls instead of
//!   sending them.  Used by tests and by `--dry-run`.

pub mod http;
pub mod mock;
pub mod storage;
pub mod ws;
