//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from an explicit
//! path or the platform-appropriate directory, writes a default file on
//! request, and falls back to built-in defaults when no file exists yet.

pub mod config;
