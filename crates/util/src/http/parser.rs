//! # Response Parsing
//!
//! Turns endpoint response bodies into [`RemotePayload`] values.

use fieldsync_types::RemotePayload;
use thiserror::Error;

/// Characters of a response body kept in error messages.
pub const BODY_PREVIEW_LIMIT: usize = 200;

/// Parse a JSON response body and fold `{ "data": T }` envelopes.
///
/// A body that is not JSON fails with the HTTP status it arrived with and a
/// single-line preview of what the endpoint sent instead.
///
/// # Example
/// ```rust
/// use fieldsync_types::RemotePayload;
/// use fieldsync_util::parse_payload;
/// use serde_json::json;
///
/// let enveloped = parse_payload(r#"{"data":[1,2]}"#, Some(200)).unwrap();
/// let bare = parse_payload("[1,2]", Some(200)).unwrap();
/// assert_eq!(enveloped, RemotePayload::EnvelopedJson { data: json!([1, 2]) });
/// assert_eq!(enveloped, bare);
/// ```
pub fn parse_payload(text: &str, status: Option<u16>) -> Result<RemotePayload, MalformedPayload> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(RemotePayload::from_json(value)),
        Err(source) => Err(MalformedPayload {
            status,
            source,
            body_preview: body_preview(text),
        }),
    }
}

/// One-line excerpt of a response body, `<empty>` for blank bodies.
pub fn body_preview(text: &str) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flattened.char_indices().nth(BODY_PREVIEW_LIMIT) {
        Some((cut, _)) => format!("{}...", &flattened[..cut]),
        None => flattened,
    }
}

/// A JSON endpoint answered with something that is not JSON.
#[derive(Debug, Error)]
#[error("endpoint returned a non-JSON body ({}): {source}. body preview: {body_preview}", status_note(.status))]
pub struct MalformedPayload {
    pub status: Option<u16>,
    #[source]
    pub source: serde_json::Error,
    pub body_preview: String,
}

fn status_note(status: &Option<u16>) -> String {
    status.map_or_else(|| "unknown status".to_string(), |code| format!("status {code}"))
}
