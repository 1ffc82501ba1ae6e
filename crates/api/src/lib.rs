//! Remote transport for fieldsync bindings.
//!
//! Binders never talk to the network directly. They hand a
//! [`RemoteRequest`] to a [`RemoteTransport`] and receive a normalized
//! [`RemotePayload`]. [`HttpTransport`] is the reqwest-backed implementation
//! used against the application's backend; tests plug in scripted
//! transports instead.
//!
//! # Example
//!
//! ```ignore
//! use fieldsync_api::{HttpTransport, RemoteTransport};
//! use fieldsync_types::RemoteRequest;
//! use std::time::Duration;
//!
//! let base = url::Url::parse("http://localhost:9000")?;
//! let transport = HttpTransport::new(Some(base), Duration::from_secs(30))?;
//! let payload = transport.request(RemoteRequest::get_text("/ui/utils/embed?url=x")).await?;
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use fieldsync_types::{RemotePayload, RemoteRequest, RequestBody, RequestMethod, ResponseFormat};
use fieldsync_util::{MalformedPayload, body_preview, parse_payload};
use reqwest::{Client, Method, header};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Schemes accepted for the backend base URL.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Asynchronous request/response service used by binders.
///
/// Implementations must be cancel-safe: a binder drops the returned future
/// when the query is superseded, which should abort the underlying request.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn request(&self, request: RemoteRequest) -> Result<RemotePayload, TransportError>;
}

/// Failure to obtain a usable response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body_preview}")]
    Status { status: u16, body_preview: String },

    #[error(transparent)]
    Malformed(#[from] MalformedPayload),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Thin wrapper around a configured `reqwest::Client`.
///
/// Relative request URLs are resolved against `base_url`; absolute URLs are
/// sent as-is.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Option<Url>,
    http: Client,
    user_agent: String,
}

impl HttpTransport {
    /// Build a transport with default headers and the given request timeout.
    pub fn new(base_url: Option<Url>, timeout: Duration) -> Result<Self> {
        if let Some(base_url) = &base_url {
            validate_base_url(base_url)?;
        }

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json,text/html"));

        let http = Client::builder()
            .default_headers(default_headers)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("fieldsync/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Resolve a request target into an absolute URL.
    pub fn resolve_url(&self, target: &str) -> Result<Url, TransportError> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base_url = self.base_url.as_ref().ok_or_else(|| TransportError::InvalidUrl {
                    url: target.to_string(),
                    reason: "relative URL without a configured base URL".into(),
                })?;
                base_url.join(target).map_err(|error| TransportError::InvalidUrl {
                    url: target.to_string(),
                    reason: error.to_string(),
                })
            }
            Err(error) => Err(TransportError::InvalidUrl {
                url: target.to_string(),
                reason: error.to_string(),
            }),
        }
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn request(&self, request: RemoteRequest) -> Result<RemotePayload, TransportError> {
        let url = self.resolve_url(&request.url)?;
        let method = match request.method {
            RequestMethod::Get => Method::GET,
            RequestMethod::Post => Method::POST,
        };
        debug!(%url, %method, "sending remote query");

        let mut builder = self
            .http
            .request(method, url)
            .header(header::USER_AGENT, &self.user_agent);
        if request.format == ResponseFormat::Json {
            builder = builder.header(header::ACCEPT, "application/json");
        }
        builder = match request.body {
            Some(RequestBody::Text(text)) => builder
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text),
            Some(RequestBody::Json(value)) => builder.json(&value),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|error| TransportError::Network(error.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| TransportError::Network(error.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body_preview: body_preview(&text),
            });
        }

        match request.format {
            ResponseFormat::Text => Ok(RemotePayload::text(text)),
            ResponseFormat::Json => Ok(parse_payload(&text, Some(status.as_u16()))?),
        }
    }
}

/// Validate that a base URL is acceptable for use by the transport.
fn validate_base_url(base_url: &Url) -> Result<()> {
    if !ALLOWED_SCHEMES.contains(&base_url.scheme()) {
        return Err(anyhow!(
            "base URL must use http or https; got '{}://'",
            base_url.scheme()
        ));
    }
    if base_url.host_str().is_none() {
        return Err(anyhow!("base URL must include a host"));
    }
    Ok(())
}
