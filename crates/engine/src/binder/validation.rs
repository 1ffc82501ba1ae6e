use std::sync::Arc;

use fieldsync_api::RemoteTransport;
use fieldsync_types::{Annotation, FieldId, PayloadError, RemotePayload, RemoteRequest, ValidationResponse};
use fieldsync_util::expand_placeholder;

use super::{QueryBinding, RaceSafeBinder};
use crate::BindError;
use crate::host::{FieldHost, ensure_field, read_or_empty};
use crate::registry::Binding;
use crate::target::AnnotationTarget;

/// Marks an input valid or invalid from a `{valid, message}` endpoint.
pub struct ValidationBinding {
    host: Arc<dyn FieldHost>,
    field: FieldId,
    url_template: String,
    placeholder: String,
    target: Arc<dyn AnnotationTarget>,
}

impl ValidationBinding {
    pub fn new(
        host: Arc<dyn FieldHost>,
        field: FieldId,
        url_template: impl Into<String>,
        placeholder: impl Into<String>,
        target: Arc<dyn AnnotationTarget>,
    ) -> Self {
        Self {
            host,
            field,
            url_template: url_template.into(),
            placeholder: placeholder.into(),
            target,
        }
    }
}

impl QueryBinding for ValidationBinding {
    fn label(&self) -> &'static str {
        "validation"
    }

    fn current_value(&self) -> String {
        read_or_empty(self.host.as_ref(), &self.field)
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError> {
        Ok(RemoteRequest::get_json(expand_placeholder(&self.url_template, &self.placeholder, value)))
    }

    fn clear(&self) {
        self.target.set_annotation(Annotation::None);
    }

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError> {
        let response: ValidationResponse = payload.decode()?;
        self.target.set_annotation(response.into());
        Ok(())
    }

    fn apply_failure(&self) {
        self.target.set_annotation(Annotation::None);
    }
}

pub(crate) fn bind_validation(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    field: FieldId,
    url_template: String,
    placeholder: String,
    target: Arc<dyn AnnotationTarget>,
) -> Result<Binding, BindError> {
    ensure_field(host.as_ref(), &field)?;
    if url_template.trim().is_empty() {
        return Err(BindError::MissingEndpoint { binding: "validation" });
    }

    let binding = ValidationBinding::new(Arc::clone(&host), field.clone(), url_template, placeholder, target);
    let binder = RaceSafeBinder::new(binding, transport)?;
    binder.refresh();

    let on_change = binder.clone();
    let subscription = host.bind_change(
        &field,
        Arc::new(move |_: &str| {
            on_change.refresh();
        }),
    );
    Ok(Binding::new("validation", Some(Arc::new(binder)), vec![subscription]))
}
