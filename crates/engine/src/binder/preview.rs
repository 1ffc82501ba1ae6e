//! Preview panes rendered by the backend while their tab is visible.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fieldsync_api::RemoteTransport;
use fieldsync_types::{
    FieldId, PayloadError, RemotePayload, RemoteRequest, RequestBody, ResponseFormat, TabId, TemplateRenderRequest,
    TemplateRenderResponse,
};
use tracing::warn;

use super::{QueryBinding, RaceSafeBinder};
use crate::BindError;
use crate::host::{FieldHost, Subscription, ensure_field, read_or_empty};
use crate::registry::Binding;
use crate::target::HtmlTarget;

/// Reference passed along with a template, either fixed or read from a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Static(String),
    Field(FieldId),
}

impl TemplateRef {
    pub(crate) fn resolve(&self, host: &dyn FieldHost) -> String {
        match self {
            Self::Static(reference) => reference.clone(),
            Self::Field(field) => read_or_empty(host, field),
        }
    }

    pub(crate) fn field(&self) -> Option<&FieldId> {
        match self {
            Self::Static(_) => None,
            Self::Field(field) => Some(field),
        }
    }
}

#[derive(Debug, Clone)]
enum PreviewKind {
    Markdown,
    Template { reference: TemplateRef, markdown: bool },
}

/// Renders an editor's content into a pane through a backend endpoint.
pub struct PreviewBinding {
    host: Arc<dyn FieldHost>,
    editor: FieldId,
    endpoint: String,
    kind: PreviewKind,
    pane: Arc<dyn HtmlTarget>,
    loading_html: String,
    active: AtomicBool,
}

impl PreviewBinding {
    /// Markdown preview: the editor text is posted as is and HTML comes back.
    pub fn markdown(host: Arc<dyn FieldHost>, editor: FieldId, endpoint: impl Into<String>, pane: Arc<dyn HtmlTarget>) -> Self {
        Self::with_kind(host, editor, endpoint.into(), PreviewKind::Markdown, pane)
    }

    /// Template preview: `{template, ref, markdown}` is posted and
    /// `{result, error}` comes back.
    pub fn template(
        host: Arc<dyn FieldHost>,
        editor: FieldId,
        endpoint: impl Into<String>,
        reference: TemplateRef,
        markdown: bool,
        pane: Arc<dyn HtmlTarget>,
    ) -> Self {
        Self::with_kind(host, editor, endpoint.into(), PreviewKind::Template { reference, markdown }, pane)
    }

    fn with_kind(host: Arc<dyn FieldHost>, editor: FieldId, endpoint: String, kind: PreviewKind, pane: Arc<dyn HtmlTarget>) -> Self {
        let loading_html = pane.html();
        Self {
            host,
            editor,
            endpoint,
            kind,
            pane,
            loading_html,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Markup the pane showed when the binding was created.
    pub fn loading_html(&self) -> &str {
        &self.loading_html
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.pane.set_html(&self.loading_html);
    }

    fn editor_text(&self) -> String {
        read_or_empty(self.host.as_ref(), &self.editor)
    }
}

impl QueryBinding for PreviewBinding {
    fn label(&self) -> &'static str {
        match self.kind {
            PreviewKind::Markdown => "markdown_preview",
            PreviewKind::Template { .. } => "template_preview",
        }
    }

    fn current_value(&self) -> String {
        let text = self.editor_text();
        match &self.kind {
            PreviewKind::Markdown => text,
            PreviewKind::Template { .. } if text.is_empty() => text,
            // Encoded as a JSON pair so no template text can collide with a reference.
            PreviewKind::Template { reference, .. } => {
                serde_json::json!([text, reference.resolve(self.host.as_ref())]).to_string()
            }
        }
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError> {
        match &self.kind {
            PreviewKind::Markdown => Ok(RemoteRequest::post(
                &self.endpoint,
                RequestBody::Text(value.to_string()),
                ResponseFormat::Text,
            )),
            PreviewKind::Template { reference, markdown } => {
                let body = TemplateRenderRequest {
                    template: self.editor_text(),
                    reference: reference.resolve(self.host.as_ref()),
                    markdown: *markdown,
                };
                let body = serde_json::to_value(&body).map_err(|error| BindError::InvalidRequest {
                    binding: "template_preview",
                    reason: error.to_string(),
                })?;
                Ok(RemoteRequest::post(&self.endpoint, RequestBody::Json(body), ResponseFormat::Json))
            }
        }
    }

    fn show_loading(&self) {
        self.reset();
    }

    fn clear(&self) {
        self.pane.set_html("");
    }

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError> {
        match &self.kind {
            PreviewKind::Markdown => {
                let html = payload.into_text()?;
                self.pane.set_html(&html);
            }
            PreviewKind::Template { .. } => {
                let response: TemplateRenderResponse = payload.decode()?;
                if let Some(error) = response.error.as_deref().filter(|error| !error.is_empty()) {
                    warn!(binding = self.label(), error, "template render reported an error");
                }
                self.pane.set_html(&response.result);
            }
        }
        Ok(())
    }

    fn apply_failure(&self) {
        self.pane.set_html("");
    }
}

/// Wire tab visibility and field changes of a preview to its binder.
fn subscribe_preview(
    host: &Arc<dyn FieldHost>,
    binder: &RaceSafeBinder<PreviewBinding>,
    tab: &TabId,
    triggers: &[FieldId],
) -> Vec<Subscription> {
    let mut subscriptions = Vec::with_capacity(triggers.len() + 2);

    let on_activate = binder.clone();
    subscriptions.push(host.bind_activate(
        tab,
        Arc::new(move || {
            on_activate.binding().set_active(true);
            on_activate.refresh();
        }),
    ));

    let on_deactivate = binder.clone();
    subscriptions.push(host.bind_deactivate(
        tab,
        Arc::new(move || {
            on_deactivate.binding().set_active(false);
            on_deactivate.cancel();
            on_deactivate.binding().reset();
        }),
    ));

    for field in triggers {
        let on_change = binder.clone();
        subscriptions.push(host.bind_change(
            field,
            Arc::new(move |_: &str| {
                if on_change.binding().is_active() {
                    on_change.refresh();
                }
            }),
        ));
    }
    subscriptions
}

pub(crate) fn bind_markdown_preview(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    editor: FieldId,
    tab: TabId,
    endpoint: String,
    pane: Arc<dyn HtmlTarget>,
) -> Result<Binding, BindError> {
    ensure_field(host.as_ref(), &editor)?;
    if endpoint.trim().is_empty() {
        return Err(BindError::MissingEndpoint {
            binding: "markdown_preview",
        });
    }

    let binding = PreviewBinding::markdown(Arc::clone(&host), editor.clone(), endpoint, pane);
    let binder = RaceSafeBinder::new(binding, transport)?;
    let subscriptions = subscribe_preview(&host, &binder, &tab, &[editor]);
    Ok(Binding::new("markdown_preview", Some(Arc::new(binder)), subscriptions))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn bind_template_preview(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    editor: FieldId,
    tab: TabId,
    endpoint: String,
    reference: TemplateRef,
    markdown: bool,
    pane: Arc<dyn HtmlTarget>,
) -> Result<Binding, BindError> {
    ensure_field(host.as_ref(), &editor)?;
    if let Some(field) = reference.field() {
        ensure_field(host.as_ref(), field)?;
    }
    if endpoint.trim().is_empty() {
        return Err(BindError::MissingEndpoint {
            binding: "template_preview",
        });
    }

    let mut triggers = vec![editor.clone()];
    triggers.extend(reference.field().cloned());
    let binding = PreviewBinding::template(Arc::clone(&host), editor, endpoint, reference, markdown, pane);
    let binder = RaceSafeBinder::new(binding, transport)?;
    let subscriptions = subscribe_preview(&host, &binder, &tab, &triggers);
    Ok(Binding::new("template_preview", Some(Arc::new(binder)), subscriptions))
}

#[cfg(test)]
mod tests {
    use fieldsync_types::QueryOutcome;
    use serde_json::json;

    use super::*;
    use crate::host::MemoryHost;
    use crate::target::MemoryPane;
    use crate::test_support::ScriptedTransport;

    const LOADING: &str = "<div class=\"spinner\"></div>";
    const ENDPOINT: &str = "/ui/utils/markdown-to-html";

    fn markdown_page(text: &str) -> (MemoryHost, Arc<ScriptedTransport>, Arc<MemoryPane>, Binding) {
        let host = MemoryHost::new().with_field("description", text);
        let transport = ScriptedTransport::new();
        let pane = Arc::new(MemoryPane::new(LOADING));
        let binding = bind_markdown_preview(
            Arc::new(host.clone()),
            Arc::clone(&transport) as Arc<dyn RemoteTransport>,
            FieldId::from("description"),
            TabId::from("description-preview"),
            ENDPOINT.to_string(),
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();
        (host, transport, pane, binding)
    }

    #[tokio::test]
    async fn activation_renders_the_editor_content() {
        let (host, transport, pane, binding) = markdown_page("# Title");
        transport.respond(ENDPOINT, RemotePayload::text("<h1>Title</h1>"));
        assert_eq!(transport.request_count(), 0);

        host.activate_tab("description-preview");
        assert_eq!(binding.settle().await, vec![QueryOutcome::Applied]);
        assert_eq!(pane.html(), "<h1>Title</h1>");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(RequestBody::Text("# Title".to_string())));
    }

    #[tokio::test]
    async fn changes_are_ignored_while_hidden() {
        let (host, transport, _pane, binding) = markdown_page("");
        transport.respond(ENDPOINT, RemotePayload::text("<p>x</p>"));

        host.commit("description", "x");
        assert!(binding.settle().await.is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn deactivation_cancels_and_restores_the_placeholder() {
        let (host, transport, pane, binding) = markdown_page("# Title");
        let gate = transport.gate(ENDPOINT);

        host.activate_tab("description-preview");
        tokio::task::yield_now().await;
        host.deactivate_tab("description-preview");
        let _ = gate.send(Ok(RemotePayload::text("<h1>Title</h1>")));

        assert_eq!(binding.settle().await, vec![QueryOutcome::Discarded]);
        assert_eq!(pane.html(), LOADING);
    }

    #[tokio::test]
    async fn empty_editor_clears_the_pane() {
        let (host, transport, pane, binding) = markdown_page("");

        host.activate_tab("description-preview");
        assert!(binding.settle().await.is_empty());
        assert_eq!(pane.html(), "");
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn template_preview_posts_template_and_reference() {
        let host = MemoryHost::new()
            .with_field("template", "Hello {{name}}")
            .with_field("proposal", "p-1");
        let transport = ScriptedTransport::new();
        transport.respond(
            "/ui/utils/render-template",
            RemotePayload::from_json(json!({ "result": "Hello Ada", "error": "unused variable" })),
        );
        let pane = Arc::new(MemoryPane::new(LOADING));
        let binding = bind_template_preview(
            Arc::new(host.clone()),
            Arc::clone(&transport) as Arc<dyn RemoteTransport>,
            FieldId::from("template"),
            TabId::from("template-preview"),
            "/ui/utils/render-template".to_string(),
            TemplateRef::Field(FieldId::from("proposal")),
            true,
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();

        host.activate_tab("template-preview");
        assert_eq!(binding.settle().await, vec![QueryOutcome::Applied]);
        assert_eq!(pane.html(), "Hello Ada");

        host.commit("proposal", "p-2");
        binding.settle().await;
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].body,
            Some(RequestBody::Json(json!({ "template": "Hello {{name}}", "ref": "p-2", "markdown": true })))
        );
    }

    #[tokio::test]
    async fn template_with_control_characters_is_posted_intact() {
        let template = "Hi\u{1f}{{name}}";
        let host = MemoryHost::new().with_field("template", template);
        let transport = ScriptedTransport::new();
        transport.respond(
            "/ui/utils/render-template",
            RemotePayload::from_json(json!({ "result": "Hi Ada" })),
        );
        let binding = bind_template_preview(
            Arc::new(host.clone()),
            Arc::clone(&transport) as Arc<dyn RemoteTransport>,
            FieldId::from("template"),
            TabId::from("template-preview"),
            "/ui/utils/render-template".to_string(),
            TemplateRef::Static("p-1".to_string()),
            false,
            Arc::new(MemoryPane::new(LOADING)) as Arc<dyn HtmlTarget>,
        )
        .unwrap();

        host.activate_tab("template-preview");
        assert_eq!(binding.settle().await, vec![QueryOutcome::Applied]);
        assert_eq!(
            transport.requests()[0].body,
            Some(RequestBody::Json(json!({ "template": template, "ref": "p-1", "markdown": false })))
        );
    }

    #[tokio::test]
    async fn failed_render_empties_the_pane() {
        let (host, transport, pane, binding) = markdown_page("# Title");
        transport.fail(ENDPOINT, 500);

        host.activate_tab("description-preview");
        assert_eq!(binding.settle().await, vec![QueryOutcome::Failed]);
        assert_eq!(pane.html(), "");
    }
}
