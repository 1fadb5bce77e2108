//! Core types shared by the lambda-bridge crates.
//!
//! - [`events`]: the JSON documents the invoking platform sends and expects
//!   back, one request/response pair per invocation shape.
//! - [`config`]: `bridge.toml` parsing.

pub mod config;
pub mod events;

pub use config::{BridgeConfig, ConfigError};
pub use events::{InvocationEvent, Shape};
