//! bridge.toml configuration parser.
//!
//! Every section and field is optional; an empty file yields
//! [`BridgeConfig::default()`].
//!
//! ```toml
//! [streaming]
//! pipe_capacity = 4
//!
//! [headers]
//! split_comma_joined = ["http-v2"]
//!
//! [response]
//! sniff_content_type = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::Shape;

/// Errors raised while loading a [`BridgeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub streaming: StreamingConfig,
    pub headers: HeadersConfig,
    pub response: ResponseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Body chunks the pipe holds before a handler write waits for the
    /// consumer.
    pub pipe_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self { pipe_capacity: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// Shapes whose single-valued request headers carry several values
    /// joined with `,`.
    pub split_comma_joined: Vec<Shape>,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            split_comma_joined: vec![Shape::HttpV2],
        }
    }
}

impl HeadersConfig {
    pub fn splits(&self, shape: Shape) -> bool {
        self.split_comma_joined.contains(&shape)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Infer `Content-Type` from the body when the handler set none.
    pub sniff_content_type: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            sniff_content_type: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streaming.pipe_capacity == 0 {
            return Err(ConfigError::Invalid(
                "streaming.pipe_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
