//! Data model and validation of binder settings.

use std::time::Duration;

use fieldsync_types::OwnershipPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Settings shared by every binding on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BinderSettings {
    /// Absolute URL that relative endpoint paths are resolved against.
    pub base_url: Option<Url>,
    pub endpoints: EndpointSettings,
    /// Marker replaced by the field value in validation URL templates.
    pub validation_placeholder: String,
    /// Markup shown in embed panes while a request is in flight.
    pub loading_html: String,
    pub slug: SlugSettings,
    pub ownership: OwnershipPolicy,
    pub request_timeout_secs: u64,
}

impl Default for BinderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoints: EndpointSettings::default(),
            validation_placeholder: "{{input}}".to_string(),
            loading_html: "<div class=\"spinner-border spinner-border-sm\" role=\"status\"></div>".to_string(),
            slug: SlugSettings::default(),
            ownership: OwnershipPolicy::default(),
            request_timeout_secs: 30,
        }
    }
}

impl BinderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Paths of the backend helpers used by built-in bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EndpointSettings {
    pub markdown_to_html: String,
    pub render_template: String,
    pub template_data: String,
    pub embed: String,
    pub duplicates: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            markdown_to_html: "/ui/utils/markdown-to-html".to_string(),
            render_template: "/ui/utils/render-template".to_string(),
            template_data: "/ui/utils/template-data".to_string(),
            embed: "/ui/utils/embed".to_string(),
            duplicates: "/ui/cfps/duplicates".to_string(),
        }
    }
}

impl EndpointSettings {
    fn named(&self) -> [(&'static str, &str); 5] {
        [
            ("markdownToHtml", self.markdown_to_html.as_str()),
            ("renderTemplate", self.render_template.as_str()),
            ("templateData", self.template_data.as_str()),
            ("embed", self.embed.as_str()),
            ("duplicates", self.duplicates.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SlugSettings {
    pub separator: char,
}

impl Default for SlugSettings {
    fn default() -> Self {
        Self { separator: '-' }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("slug separator must be ASCII punctuation, got {0:?}")]
    InvalidSeparator(char),

    #[error("endpoint '{0}' must not be empty")]
    EmptyEndpoint(&'static str),

    #[error("validation placeholder must not be empty")]
    EmptyPlaceholder,

    #[error("request timeout must be greater than zero")]
    InvalidTimeout,

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Check settings before any binding is created from them.
pub fn validate_settings(settings: &BinderSettings) -> Result<(), ConfigError> {
    if !settings.slug.separator.is_ascii_punctuation() {
        return Err(ConfigError::InvalidSeparator(settings.slug.separator));
    }
    if let Some((name, _)) = settings.endpoints.named().into_iter().find(|(_, path)| path.trim().is_empty()) {
        return Err(ConfigError::EmptyEndpoint(name));
    }
    if settings.validation_placeholder.is_empty() {
        return Err(ConfigError::EmptyPlaceholder);
    }
    if settings.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }
    if let Some(base_url) = &settings.base_url
        && !matches!(base_url.scheme(), "http" | "https")
    {
        return Err(ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: "expected an http or https URL".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_settings(&BinderSettings::default()), Ok(()));
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let settings: BinderSettings =
            serde_json::from_str(r#"{ "slug": { "separator": "_" }, "endpoints": { "embed": "/embed" } }"#).unwrap();
        assert_eq!(settings.slug.separator, '_');
        assert_eq!(settings.endpoints.embed, "/embed");
        assert_eq!(settings.endpoints.duplicates, "/ui/cfps/duplicates");
        assert_eq!(settings.ownership, OwnershipPolicy::ExplicitFlag);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = serde_json::from_str::<BinderSettings>(r#"{ "slugSeparator": "-" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut settings = BinderSettings::default();
        settings.slug.separator = 'a';
        assert_eq!(validate_settings(&settings), Err(ConfigError::InvalidSeparator('a')));

        let mut settings = BinderSettings::default();
        settings.endpoints.template_data = " ".to_string();
        assert_eq!(validate_settings(&settings), Err(ConfigError::EmptyEndpoint("templateData")));

        let settings = BinderSettings {
            request_timeout_secs: 0,
            ..BinderSettings::default()
        };
        assert_eq!(validate_settings(&settings), Err(ConfigError::InvalidTimeout));

        let settings = BinderSettings {
            base_url: Url::parse("ftp://files.example").ok(),
            ..BinderSettings::default()
        };
        assert!(matches!(validate_settings(&settings), Err(ConfigError::InvalidBaseUrl { .. })));
    }
}
