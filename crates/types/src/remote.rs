use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP verb used by a remote query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
}

/// Body of a remote query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RequestBody {
    /// Sent verbatim as `text/plain`.
    Text(String),
    /// Serialized as `application/json`.
    Json(Value),
}

/// How the transport should interpret the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseFormat {
    Text,
    Json,
}

/// Request descriptor built from a trigger value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub method: RequestMethod,
    /// Absolute URL or a path resolved against the transport's base URL.
    pub url: String,
    pub body: Option<RequestBody>,
    pub format: ResponseFormat,
}

impl RemoteRequest {
    pub fn get_json(url: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            url: url.into(),
            body: None,
            format: ResponseFormat::Json,
        }
    }

    pub fn get_text(url: impl Into<String>) -> Self {
        Self {
            method: RequestMethod::Get,
            url: url.into(),
            body: None,
            format: ResponseFormat::Text,
        }
    }

    pub fn post(url: impl Into<String>, body: RequestBody, format: ResponseFormat) -> Self {
        Self {
            method: RequestMethod::Post,
            url: url.into(),
            body: Some(body),
            format,
        }
    }
}
