use std::sync::Arc;

use fieldsync_api::RemoteTransport;
use fieldsync_types::{DuplicateCandidate, FieldId, PayloadError, RemotePayload, RemoteRequest};
use fieldsync_util::with_query;

use super::{QueryBinding, RaceSafeBinder};
use crate::BindError;
use crate::host::{FieldHost, ensure_field, read_or_empty};
use crate::registry::Binding;
use crate::target::CandidatesTarget;

/// Looks up existing entries resembling the form being filled in.
///
/// The trigger value is the full query URL built from every listed field, so
/// a change to any of them makes earlier responses stale.
pub struct DuplicateSearchBinding {
    host: Arc<dyn FieldHost>,
    fields: Vec<(String, FieldId)>,
    endpoint: String,
    target: Arc<dyn CandidatesTarget>,
}

impl DuplicateSearchBinding {
    pub fn new(
        host: Arc<dyn FieldHost>,
        fields: Vec<(String, FieldId)>,
        endpoint: impl Into<String>,
        target: Arc<dyn CandidatesTarget>,
    ) -> Self {
        Self {
            host,
            fields,
            endpoint: endpoint.into(),
            target,
        }
    }
}

impl QueryBinding for DuplicateSearchBinding {
    fn label(&self) -> &'static str {
        "duplicate_search"
    }

    /// Empty when no listed field has a value.
    fn current_value(&self) -> String {
        let pairs: Vec<(&str, String)> = self
            .fields
            .iter()
            .map(|(key, field)| (key.as_str(), read_or_empty(self.host.as_ref(), field)))
            .collect();
        if pairs.iter().all(|(_, value)| value.is_empty()) {
            return String::new();
        }
        with_query(&self.endpoint, &pairs)
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError> {
        Ok(RemoteRequest::get_json(value))
    }

    fn clear(&self) {
        self.target.show_candidates(Vec::new());
    }

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError> {
        let candidates: Vec<DuplicateCandidate> = payload.decode()?;
        self.target.show_candidates(candidates);
        Ok(())
    }

    fn apply_failure(&self) {
        self.target.show_candidates(Vec::new());
    }
}

pub(crate) fn bind_duplicate_search(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    fields: Vec<(String, FieldId)>,
    endpoint: String,
    target: Arc<dyn CandidatesTarget>,
) -> Result<Binding, BindError> {
    for (_, field) in &fields {
        ensure_field(host.as_ref(), field)?;
    }
    if endpoint.trim().is_empty() {
        return Err(BindError::MissingEndpoint {
            binding: "duplicate_search",
        });
    }

    let triggers: Vec<FieldId> = fields.iter().map(|(_, field)| field.clone()).collect();
    let binder = RaceSafeBinder::new(DuplicateSearchBinding::new(Arc::clone(&host), fields, endpoint, target), transport)?;
    binder.refresh();

    let subscriptions = triggers
        .iter()
        .map(|field| {
            let on_change = binder.clone();
            host.bind_change(
                field,
                Arc::new(move |value: &str| {
                    if !value.is_empty() {
                        on_change.refresh();
                    }
                }),
            )
        })
        .collect();
    Ok(Binding::new("duplicate_search", Some(Arc::new(binder)), subscriptions))
}
