use std::sync::Arc;

use fieldsync_api::RemoteTransport;
use fieldsync_types::{FieldId, PayloadError, RemotePayload, RemoteRequest};
use fieldsync_util::with_query;

use super::{QueryBinding, RaceSafeBinder};
use crate::BindError;
use crate::host::{FieldHost, ensure_field, read_or_empty};
use crate::registry::Binding;
use crate::target::HtmlTarget;

/// The URL an embed pane renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedSource {
    /// Edited by the user; the pane follows the field.
    Field(FieldId),
    /// Fixed when the page was rendered; fetched exactly once.
    Static(String),
}

/// Renders the embed markup the backend produces for a URL.
pub struct EmbedBinding {
    host: Arc<dyn FieldHost>,
    source: EmbedSource,
    endpoint: String,
    loading_html: String,
    pane: Arc<dyn HtmlTarget>,
}

impl EmbedBinding {
    pub fn new(
        host: Arc<dyn FieldHost>,
        source: EmbedSource,
        endpoint: impl Into<String>,
        loading_html: impl Into<String>,
        pane: Arc<dyn HtmlTarget>,
    ) -> Self {
        Self {
            host,
            source,
            endpoint: endpoint.into(),
            loading_html: loading_html.into(),
            pane,
        }
    }
}

impl QueryBinding for EmbedBinding {
    fn label(&self) -> &'static str {
        match self.source {
            EmbedSource::Field(_) => "embed_editor",
            EmbedSource::Static(_) => "embed_display",
        }
    }

    fn current_value(&self) -> String {
        match &self.source {
            EmbedSource::Field(field) => read_or_empty(self.host.as_ref(), field),
            EmbedSource::Static(url) => url.clone(),
        }
    }

    fn issues_on_empty(&self) -> bool {
        matches!(self.source, EmbedSource::Static(_))
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError> {
        Ok(RemoteRequest::get_text(with_query(&self.endpoint, &[("url", value)])))
    }

    fn show_loading(&self) {
        self.pane.set_html(&self.loading_html);
    }

    fn clear(&self) {
        self.pane.set_html("");
    }

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError> {
        let html = payload.into_text()?;
        self.pane.set_html(&html);
        Ok(())
    }

    fn apply_failure(&self) {
        self.pane.set_html("");
    }
}

fn ensure_endpoint(endpoint: &str, binding: &'static str) -> Result<(), BindError> {
    if endpoint.trim().is_empty() {
        return Err(BindError::MissingEndpoint { binding });
    }
    Ok(())
}

pub(crate) fn bind_embed_editor(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    field: FieldId,
    endpoint: String,
    loading_html: String,
    pane: Arc<dyn HtmlTarget>,
) -> Result<Binding, BindError> {
    ensure_field(host.as_ref(), &field)?;
    ensure_endpoint(&endpoint, "embed_editor")?;

    let binding = EmbedBinding::new(Arc::clone(&host), EmbedSource::Field(field.clone()), endpoint, loading_html, pane);
    let binder = RaceSafeBinder::new(binding, transport)?;
    binder.refresh();

    let on_change = binder.clone();
    let subscription = host.bind_change(
        &field,
        Arc::new(move |_: &str| {
            on_change.refresh();
        }),
    );
    Ok(Binding::new("embed_editor", Some(Arc::new(binder)), vec![subscription]))
}

pub(crate) fn bind_embed_display(
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    url: String,
    endpoint: String,
    loading_html: String,
    pane: Arc<dyn HtmlTarget>,
) -> Result<Binding, BindError> {
    ensure_endpoint(&endpoint, "embed_display")?;

    let binding = EmbedBinding::new(host, EmbedSource::Static(url), endpoint, loading_html, pane);
    let binder = RaceSafeBinder::new(binding, transport)?;
    binder.refresh();
    Ok(Binding::new("embed_display", Some(Arc::new(binder)), Vec::new()))
}

#[cfg(test)]
mod tests {
    use fieldsync_types::QueryOutcome;

    use super::*;
    use crate::host::MemoryHost;
    use crate::target::MemoryPane;
    use crate::test_support::ScriptedTransport;

    const SPINNER: &str = "<i class=\"spinner\"></i>";

    #[tokio::test]
    async fn editor_shows_a_spinner_until_the_embed_arrives() {
        let host = MemoryHost::new().with_field("video", "https://youtu.be/x");
        let transport = ScriptedTransport::new();
        let gate = transport.gate("/ui/utils/embed?url=https%3A%2F%2Fyoutu.be%2Fx");
        let pane = Arc::new(MemoryPane::new(""));

        let binding = bind_embed_editor(
            Arc::new(host.clone()),
            Arc::clone(&transport) as Arc<dyn RemoteTransport>,
            FieldId::from("video"),
            "/ui/utils/embed".to_string(),
            SPINNER.to_string(),
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();
        assert_eq!(pane.html(), SPINNER);

        let _ = gate.send(Ok(RemotePayload::text("<iframe></iframe>")));
        assert_eq!(binding.settle().await, vec![QueryOutcome::Applied]);
        assert_eq!(pane.html(), "<iframe></iframe>");

        host.commit("video", "");
        assert_eq!(pane.html(), "");
    }

    #[tokio::test]
    async fn failed_embed_clears_the_spinner() {
        let host = MemoryHost::new().with_field("video", "https://youtu.be/x");
        let transport = ScriptedTransport::new();
        transport.fail("/ui/utils/embed?url=https%3A%2F%2Fyoutu.be%2Fx", 502);
        let pane = Arc::new(MemoryPane::new("<p>old embed</p>"));

        let binding = bind_embed_editor(
            Arc::new(host),
            transport as Arc<dyn RemoteTransport>,
            FieldId::from("video"),
            "/ui/utils/embed".to_string(),
            SPINNER.to_string(),
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();

        assert_eq!(binding.settle().await, vec![QueryOutcome::Failed]);
        assert_eq!(pane.html(), "");
    }

    #[tokio::test]
    async fn display_fires_once() {
        let host = MemoryHost::new();
        let transport = ScriptedTransport::new();
        transport.respond("/ui/utils/embed?url=https%3A%2F%2Fslides.example%2F1", RemotePayload::text("<embed>"));
        let pane = Arc::new(MemoryPane::new(""));

        let binding = bind_embed_display(
            Arc::new(host),
            Arc::clone(&transport) as Arc<dyn RemoteTransport>,
            "https://slides.example/1".to_string(),
            "/ui/utils/embed".to_string(),
            SPINNER.to_string(),
            Arc::clone(&pane) as Arc<dyn HtmlTarget>,
        )
        .unwrap();

        assert_eq!(binding.settle().await, vec![QueryOutcome::Applied]);
        assert_eq!(pane.html(), "<embed>");
        assert_eq!(transport.request_count(), 1);
    }
}
