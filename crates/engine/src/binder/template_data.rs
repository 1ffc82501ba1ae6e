use std::sync::Arc;

use fieldsync_api::RemoteTransport;
use fieldsync_types::{PayloadError, RemotePayload, RemoteRequest};
use fieldsync_util::{append_path_segment, escape_html};
use serde_json::Value;

use super::{QueryBinding, RaceSafeBinder, TemplateRef};
use crate::BindError;
use crate::host::{FieldHost, ensure_field};
use crate::registry::Binding;
use crate::target::HtmlTarget;

/// Shows the variables available to a template for the selected reference.
pub struct TemplateDataBinding {
    host: Arc<dyn FieldHost>,
    reference: TemplateRef,
    endpoint: String,
    pane: Arc<dyn HtmlTarget>,
}

impl TemplateDataBinding {
    pub fn new(host: Arc<dyn FieldHost>, reference: TemplateRef, endpoint: impl Into<String>, pane: Arc<dyn HtmlTarget>) -> Self {
        Self {
            host,
            reference,
            endpoint: endpoint.into(),
            pane,
        }
    }

    fn hide(&self) {
        self.pane.set_html("");
        self.pane.set_visible(false);
    }
}

impl QueryBinding for TemplateDataBinding {
    fn label(&self) -> &'static str {
        "template_data"
    }

    fn current_value(&self) -> String {
        self.reference.resolve(self.host.as_ref())
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError> {
        Ok(RemoteRequest::get_json(append_path_segment(&self.endpoint, value)))
    }

    fn clear(&self) {
        self.hide();
    }

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError> {
        let data: Value = payload.decode()?;
        let pretty = serde_json::to_string_pretty(&data).map_err(PayloadError::Shape)?;
        self.pane.set_html(&escape_html(&pretty));
        self.pane.set_visible(true);
        Ok(())
    }

    fn apply_failure(&self) {
        self.hide();
    }
}

pub(crate) fn bind_template_data(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    reference: TemplateRef,
    endpoint: String,
    pane: Arc<dyn HtmlTarget>,
) -> Result<Binding, BindError> {
    if let Some(field) = reference.field() {
        ensure_field(host.as_ref(), field)?;
    }
    if endpoint.trim().is_empty() {
        return Err(BindError::MissingEndpoint {
            binding: "template_data",
        });
    }

    let trigger = reference.field().cloned();
    let binder = RaceSafeBinder::new(TemplateDataBinding::new(Arc::clone(&host), reference, endpoint, pane), transport)?;
    binder.refresh();

    let mut subscriptions = Vec::new();
    if let Some(field) = trigger {
        let on_change = binder.clone();
        subscriptions.push(host.bind_change(
            &field,
            Arc::new(move |_: &str| {
                on_change.refresh();
            }),
        ));
    }
    Ok(Binding::new("template_data", Some(Arc::new(binder)), subscriptions))
}

#[cfg(test)]
mod tests {
    use fieldsync_types::{FieldId, QueryOutcome};
    use serde_json::json;

    use super::*;
    use crate::host::MemoryHost;
    use crate::target::MemoryPane;
    use crate::test_support::ScriptedTransport;

    #[tokio::test]
    async fn data_is_pretty_printed_and_escaped() {
        let host = MemoryHost::new().with_field("ref", "talk 1");
        let transport = ScriptedTransport::new();
        transport.respond(
            "/ui/utils/template-data/talk%201",
            RemotePayload::from_json(json!({ "data": { "title": "<Rust>" } })),
        );
        let pane = Arc::new(MemoryPane::new(""));
        pane.set_visible(false);

        let binding = bind_template_data(
            Arc::new(host.clone()),
            Arc::clone(&transport) as Arc<dyn RemoteTransport>,
            TemplateRef::Field(FieldId::from("ref")),
            "/ui/utils/template-data".to_string(),
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();

        assert_eq!(binding.settle().await, vec![QueryOutcome::Applied]);
        assert_eq!(pane.html(), "{\n  &quot;title&quot;: &quot;&lt;Rust&gt;&quot;\n}");
        assert!(pane.is_visible());

        host.commit("ref", "");
        assert!(!pane.is_visible());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn failed_lookup_hides_the_pane() {
        let transport = ScriptedTransport::new();
        transport.fail("/ui/utils/template-data/talk-1", 404);
        let pane = Arc::new(MemoryPane::new("{ \"stale\": true }"));

        let binding = bind_template_data(
            Arc::new(MemoryHost::new()),
            transport as Arc<dyn RemoteTransport>,
            TemplateRef::Static("talk-1".to_string()),
            "/ui/utils/template-data".to_string(),
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();

        assert_eq!(binding.settle().await, vec![QueryOutcome::Failed]);
        assert_eq!(pane.html(), "");
        assert!(!pane.is_visible());
    }
}
