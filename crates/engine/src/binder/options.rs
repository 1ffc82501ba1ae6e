use std::sync::Arc;

use fieldsync_api::RemoteTransport;
use fieldsync_types::{FieldId, PayloadError, RemotePayload, RemoteRequest, SelectOption, merge_options};
use fieldsync_util::expand_placeholder;

use super::{QueryBinding, RaceSafeBinder};
use crate::BindError;
use crate::host::{FieldHost, Subscription, ensure_field, read_or_empty};
use crate::registry::Binding;
use crate::target::OptionsTarget;

/// Where a select control's options come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsSource {
    /// One fixed endpoint, fetched once when the binding is created.
    Static { url: String },
    /// An endpoint whose `placeholder` is replaced by the value of `field`,
    /// refetched whenever the field changes.
    FieldDependent {
        url_template: String,
        placeholder: String,
        field: FieldId,
    },
}

/// Fills an option list from a `[{id, text}]` endpoint, keeping pre-selected entries.
pub struct OptionsBinding {
    host: Arc<dyn FieldHost>,
    source: OptionsSource,
    target: Arc<dyn OptionsTarget>,
}

impl OptionsBinding {
    pub fn new(host: Arc<dyn FieldHost>, source: OptionsSource, target: Arc<dyn OptionsTarget>) -> Self {
        Self { host, source, target }
    }

    fn merge(&self, fetched: Vec<SelectOption>) {
        let merged = merge_options(&self.target.options(), &self.target.initial_selection(), fetched);
        self.target.replace_options(merged);
    }
}

impl QueryBinding for OptionsBinding {
    fn label(&self) -> &'static str {
        "options"
    }

    fn current_value(&self) -> String {
        match &self.source {
            OptionsSource::Static { url } => url.clone(),
            OptionsSource::FieldDependent { field, .. } => read_or_empty(self.host.as_ref(), field),
        }
    }

    fn issues_on_empty(&self) -> bool {
        matches!(self.source, OptionsSource::Static { .. })
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError> {
        let url = match &self.source {
            OptionsSource::Static { url } => url.clone(),
            OptionsSource::FieldDependent {
                url_template, placeholder, ..
            } => expand_placeholder(url_template, placeholder, value),
        };
        Ok(RemoteRequest::get_json(url))
    }

    /// Drops every option except the pre-selected ones.
    fn clear(&self) {
        self.merge(Vec::new());
    }

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError> {
        let fetched: Vec<SelectOption> = payload.decode()?;
        self.merge(fetched);
        Ok(())
    }

    fn apply_failure(&self) {
        self.merge(Vec::new());
    }
}

pub(crate) fn bind_remote_options(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    source: OptionsSource,
    target: Arc<dyn OptionsTarget>,
) -> Result<Binding, BindError> {
    let trigger = match &source {
        OptionsSource::Static { url } if url.trim().is_empty() => {
            return Err(BindError::MissingEndpoint { binding: "options" });
        }
        OptionsSource::Static { .. } => None,
        OptionsSource::FieldDependent { field, .. } => {
            ensure_field(host.as_ref(), field)?;
            Some(field.clone())
        }
    };

    let binder = RaceSafeBinder::new(OptionsBinding::new(Arc::clone(&host), source, target), transport)?;
    binder.refresh();

    let mut subscriptions: Vec<Subscription> = Vec::new();
    if let Some(field) = trigger {
        let on_change = binder.clone();
        subscriptions.push(host.bind_change(
            &field,
            Arc::new(move |_: &str| {
                on_change.refresh();
            }),
        ));
    }
    Ok(Binding::new("options", Some(Arc::new(binder)), subscriptions))
}
