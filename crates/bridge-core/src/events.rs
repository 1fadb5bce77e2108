//! Wire shapes for the supported invocation types.
//!
//! Field names follow the platform's JSON documents (camelCase). Maps and
//! lists the platform sends as `null` deserialize to empty collections so
//! the converters never have to distinguish "absent" from "empty".

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` (or a missing field, together with `#[serde(default)]`)
/// as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The invocation shape an event arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    RestV1,
    HttpV2,
    FunctionUrl,
    FunctionUrlStreaming,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::RestV1 => "rest-v1",
            Shape::HttpV2 => "http-v2",
            Shape::FunctionUrl => "function-url",
            Shape::FunctionUrlStreaming => "function-url-streaming",
        }
    }

    /// Whether responses of this shape carry `Set-Cookie` values in a
    /// separate cookie list instead of the header map.
    pub fn has_cookie_channel(&self) -> bool {
        !matches!(self, Shape::RestV1)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound invocation, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "event", rename_all = "kebab-case")]
pub enum InvocationEvent {
    RestV1(RestV1Request),
    HttpV2(HttpV2Request),
    FunctionUrl(FunctionUrlRequest),
    FunctionUrlStreaming(FunctionUrlRequest),
}

impl InvocationEvent {
    pub fn shape(&self) -> Shape {
        match self {
            InvocationEvent::RestV1(_) => Shape::RestV1,
            InvocationEvent::HttpV2(_) => Shape::HttpV2,
            InvocationEvent::FunctionUrl(_) => Shape::FunctionUrl,
            InvocationEvent::FunctionUrlStreaming(_) => Shape::FunctionUrlStreaming,
        }
    }
}

impl From<RestV1Request> for InvocationEvent {
    fn from(event: RestV1Request) -> Self {
        InvocationEvent::RestV1(event)
    }
}

impl From<HttpV2Request> for InvocationEvent {
    fn from(event: HttpV2Request) -> Self {
        InvocationEvent::HttpV2(event)
    }
}

// ── REST (v1 payload) ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestV1Request {
    pub resource: String,
    pub path: String,
    pub http_method: String,
    #[serde(deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,
    pub request_context: RestV1RequestContext,
    /// Shared, so cloning the event does not copy the body.
    #[serde(deserialize_with = "null_as_default")]
    pub body: Arc<str>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestV1RequestContext {
    pub account_id: String,
    pub resource_id: String,
    pub stage: String,
    pub request_id: String,
    pub identity: RestV1Identity,
    pub resource_path: String,
    pub http_method: String,
    pub api_id: String,
    pub protocol: String,
    pub domain_name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestV1Identity {
    pub source_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestV1Response {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

// ── HTTP API (v2 payload) ───────────────────────────────────────────

/// The `http` block shared by the v2 and function URL request contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpDescription {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub source_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpV2Request {
    pub version: String,
    pub route_key: String,
    pub raw_path: String,
    pub raw_query_string: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cookies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,
    pub request_context: HttpV2RequestContext,
    /// Shared, so cloning the event does not copy the body.
    #[serde(deserialize_with = "null_as_default")]
    pub body: Arc<str>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpV2RequestContext {
    pub route_key: String,
    pub account_id: String,
    pub stage: String,
    pub request_id: String,
    pub api_id: String,
    pub domain_name: String,
    pub domain_prefix: String,
    pub time: String,
    pub time_epoch: i64,
    pub http: HttpDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpV2Response {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub cookies: Vec<String>,
}

// ── Function URL ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionUrlRequest {
    pub version: String,
    pub raw_path: String,
    pub raw_query_string: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cookies: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    pub request_context: FunctionUrlRequestContext,
    /// Shared, so cloning the event does not copy the body.
    #[serde(deserialize_with = "null_as_default")]
    pub body: Arc<str>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionUrlRequestContext {
    pub account_id: String,
    pub request_id: String,
    pub api_id: String,
    pub domain_name: String,
    pub domain_prefix: String,
    pub time: String,
    pub time_epoch: i64,
    pub http: HttpDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub cookies: Vec<String>,
}
