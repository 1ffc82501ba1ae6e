//! Normalized response bodies.
//!
//! Backend endpoints answer either with raw text (rendered HTML, embed
//! codes) or with JSON. Later endpoint revisions wrap JSON in a `{ "data": T }`
//! envelope while earlier ones return the value directly. Both JSON forms are
//! folded into [`RemotePayload::EnvelopedJson`] at the transport boundary so
//! that binders never inspect envelopes themselves.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Keys that may accompany `data` in an envelope without making the object a plain value.
pub const ENVELOPE_METADATA_KEYS: &[&str] = &["meta", "links", "status"];

/// Response body after envelope normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RemotePayload {
    /// Body returned verbatim by a text endpoint.
    RawText { text: String },
    /// JSON body; `data` is the envelope content or the whole value when unwrapped.
    EnvelopedJson { data: Value },
}

impl RemotePayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::RawText { text: text.into() }
    }

    /// Normalize a parsed JSON body, unwrapping a `{ "data": T }` envelope when present.
    ///
    /// An object counts as an envelope when it has a `data` key and every other
    /// key is listed in [`ENVELOPE_METADATA_KEYS`].
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(mut map)
                if map.contains_key("data")
                    && map
                        .keys()
                        .all(|key| key == "data" || ENVELOPE_METADATA_KEYS.contains(&key.as_str())) =>
            {
                let data = map.remove("data").unwrap_or(Value::Null);
                Self::EnvelopedJson { data }
            }
            other => Self::EnvelopedJson { data: other },
        }
    }

    /// Deserialize the payload into a typed value.
    ///
    /// Raw text is parsed as JSON first, so a text endpoint that happens to
    /// return JSON still decodes.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, PayloadError> {
        match self {
            Self::EnvelopedJson { data } => serde_json::from_value(data).map_err(PayloadError::Shape),
            Self::RawText { text } => {
                let value: Value = serde_json::from_str(&text).map_err(|_| PayloadError::UnexpectedText)?;
                Self::from_json(value).decode()
            }
        }
    }

    /// Extract a text body; JSON is accepted only when it is a string.
    pub fn into_text(self) -> Result<String, PayloadError> {
        match self {
            Self::RawText { text } => Ok(text),
            Self::EnvelopedJson { data: Value::String(text) } => Ok(text),
            Self::EnvelopedJson { .. } => Err(PayloadError::UnexpectedJson),
        }
    }
}

/// A response that arrived but does not have the shape a binding expects.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unexpected response shape: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("expected a JSON response but received text")]
    UnexpectedText,

    #[error("expected a text response but received structured JSON")]
    UnexpectedJson,
}
