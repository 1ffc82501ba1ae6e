//! Payloads of the preview and duplicate-search endpoints.

use serde::{Deserialize, Serialize};

/// JSON body posted to the template rendering endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRenderRequest {
    pub template: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub markdown: bool,
}

/// Rendered template; `error` is set when the template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRenderResponse {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// An already-known entry that looks like the one being submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}
