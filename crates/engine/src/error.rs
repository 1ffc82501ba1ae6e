//! Errors raised while wiring bindings to a page.
//!
//! Query-time failures never surface here: they are routed to each
//! binding's failure transform instead.

use fieldsync_types::FieldId;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("bindings must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("unknown field: {0}")]
    UnknownField(FieldId),

    #[error("missing endpoint for {binding} binding")]
    MissingEndpoint { binding: &'static str },

    #[error("invalid request for {binding} binding: {reason}")]
    InvalidRequest { binding: &'static str, reason: String },

    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
}
