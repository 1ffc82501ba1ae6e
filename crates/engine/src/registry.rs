//! Explicit registry of the bindings attached to one page.
//!
//! Page setup code creates a [`FormBindings`] with a host, a transport and
//! settings, then calls one method per widget. Each method validates the
//! referenced fields, wires the subscriptions, runs the initial query where
//! the binding has one and keeps the resulting [`Binding`]. Dropping the
//! registry tears everything down.

use std::sync::Arc;

use fieldsync_api::{HttpTransport, RemoteTransport};
use fieldsync_types::{FieldId, QueryOutcome, TabId};
use tokio::runtime::Handle;
use tracing::debug;

use crate::BindError;
use crate::binder::{
    BindingControl, OptionsSource, TemplateRef, bind_duplicate_search, bind_embed_display, bind_embed_editor,
    bind_markdown_preview, bind_remote_options, bind_template_data, bind_template_preview, bind_validation,
};
use crate::config::{BinderSettings, validate_settings};
use crate::host::{FieldHost, Subscription};
use crate::synchronizer::DerivedFieldSynchronizer;
use crate::target::{AnnotationTarget, CandidatesTarget, HtmlTarget, OptionsTarget};

/// One live binding. Dropping it removes its handlers and cancels in-flight work.
pub struct Binding {
    label: &'static str,
    control: Option<Arc<dyn BindingControl>>,
    subscriptions: Vec<Subscription>,
}

impl Binding {
    pub(crate) fn new(label: &'static str, control: Option<Arc<dyn BindingControl>>, subscriptions: Vec<Subscription>) -> Self {
        Self {
            label,
            control,
            subscriptions,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn cancel(&self) {
        if let Some(control) = &self.control {
            control.cancel();
        }
    }

    /// Wait for in-flight queries. Synchronous bindings return immediately.
    pub async fn settle(&self) -> Vec<QueryOutcome> {
        match &self.control {
            Some(control) => control.settle().await,
            None => Vec::new(),
        }
    }

    pub fn dispose(self) {}
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.subscriptions.clear();
        self.cancel();
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("label", &self.label)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

pub struct FormBindings {
    host: Arc<dyn FieldHost>,
    transport: Arc<dyn RemoteTransport>,
    settings: BinderSettings,
    bindings: Vec<Binding>,
}

impl FormBindings {
    /// Must be called inside a Tokio runtime; queries are spawned on it.
    pub fn new(host: Arc<dyn FieldHost>, transport: Arc<dyn RemoteTransport>, settings: BinderSettings) -> Result<Self, BindError> {
        Handle::try_current().map_err(|_| BindError::NoRuntime)?;
        validate_settings(&settings)?;
        Ok(Self {
            host,
            transport,
            settings,
            bindings: Vec::new(),
        })
    }

    /// Build a registry talking HTTP to `settings.base_url`.
    pub fn connect(host: Arc<dyn FieldHost>, settings: BinderSettings) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(settings.base_url.clone(), settings.request_timeout())?;
        let bindings = Self::new(host, Arc::new(transport), settings)?;
        Ok(bindings)
    }

    pub fn settings(&self) -> &BinderSettings {
        &self.settings
    }

    /// Keep `derived` equal to the slug of `sources` until the user edits it.
    ///
    /// The returned handle reports ownership; the binding itself stays in the registry.
    pub fn slug<I, F>(&mut self, derived: impl Into<FieldId>, sources: I) -> Result<Arc<DerivedFieldSynchronizer>, BindError>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldId>,
    {
        let synchronizer = Arc::new(DerivedFieldSynchronizer::new(
            Arc::clone(&self.host),
            derived.into(),
            sources.into_iter().map(Into::into).collect(),
            self.settings.slug.separator,
            self.settings.ownership,
        )?);
        let subscriptions = DerivedFieldSynchronizer::subscribe(&synchronizer);
        self.push(Binding::new("slug", None, subscriptions));
        Ok(synchronizer)
    }

    /// Annotate `field` from a `{valid, message}` endpoint. `url_template`
    /// contains the configured validation placeholder.
    pub fn validation(
        &mut self,
        field: impl Into<FieldId>,
        url_template: impl Into<String>,
        target: Arc<dyn AnnotationTarget>,
    ) -> Result<&Binding, BindError> {
        let binding = bind_validation(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            field.into(),
            url_template.into(),
            self.settings.validation_placeholder.clone(),
            target,
        )?;
        Ok(self.push(binding))
    }

    pub fn remote_options(&mut self, source: OptionsSource, target: Arc<dyn OptionsTarget>) -> Result<&Binding, BindError> {
        let binding = bind_remote_options(Arc::clone(&self.host), Arc::clone(&self.transport), source, target)?;
        Ok(self.push(binding))
    }

    /// Render `editor` as markdown into `pane` while `tab` is visible.
    ///
    /// The markup `pane` shows now is restored whenever the tab is hidden.
    pub fn markdown_preview(
        &mut self,
        editor: impl Into<FieldId>,
        tab: impl Into<TabId>,
        pane: Arc<dyn HtmlTarget>,
    ) -> Result<&Binding, BindError> {
        let binding = bind_markdown_preview(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            editor.into(),
            tab.into(),
            self.settings.endpoints.markdown_to_html.clone(),
            pane,
        )?;
        Ok(self.push(binding))
    }

    pub fn template_preview(
        &mut self,
        editor: impl Into<FieldId>,
        tab: impl Into<TabId>,
        reference: TemplateRef,
        markdown: bool,
        pane: Arc<dyn HtmlTarget>,
    ) -> Result<&Binding, BindError> {
        let binding = bind_template_preview(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            editor.into(),
            tab.into(),
            self.settings.endpoints.render_template.clone(),
            reference,
            markdown,
            pane,
        )?;
        Ok(self.push(binding))
    }

    pub fn template_data(&mut self, reference: TemplateRef, pane: Arc<dyn HtmlTarget>) -> Result<&Binding, BindError> {
        let binding = bind_template_data(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            reference,
            self.settings.endpoints.template_data.clone(),
            pane,
        )?;
        Ok(self.push(binding))
    }

    pub fn embed_editor(&mut self, field: impl Into<FieldId>, pane: Arc<dyn HtmlTarget>) -> Result<&Binding, BindError> {
        let binding = bind_embed_editor(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            field.into(),
            self.settings.endpoints.embed.clone(),
            self.settings.loading_html.clone(),
            pane,
        )?;
        Ok(self.push(binding))
    }

    /// Fetch the embed markup for a fixed URL once.
    pub fn embed_display(&mut self, url: impl Into<String>, pane: Arc<dyn HtmlTarget>) -> Result<&Binding, BindError> {
        let binding = bind_embed_display(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            url.into(),
            self.settings.endpoints.embed.clone(),
            self.settings.loading_html.clone(),
            pane,
        )?;
        Ok(self.push(binding))
    }

    /// Search for existing entries matching `(query key, field)` pairs.
    pub fn duplicate_search<I, K, F>(&mut self, fields: I, target: Arc<dyn CandidatesTarget>) -> Result<&Binding, BindError>
    where
        I: IntoIterator<Item = (K, F)>,
        K: Into<String>,
        F: Into<FieldId>,
    {
        let fields = fields.into_iter().map(|(key, field)| (key.into(), field.into())).collect();
        let binding = bind_duplicate_search(
            Arc::clone(&self.host),
            Arc::clone(&self.transport),
            fields,
            self.settings.endpoints.duplicates.clone(),
            target,
        )?;
        Ok(self.push(binding))
    }

    /// Wait for every binding's in-flight queries.
    pub async fn settle_all(&self) -> Vec<QueryOutcome> {
        let mut outcomes = Vec::new();
        for binding in &self.bindings {
            outcomes.extend(binding.settle().await);
        }
        outcomes
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Remove every handler and cancel in-flight work.
    pub fn dispose(self) {}

    fn push(&mut self, binding: Binding) -> &Binding {
        debug!(binding = binding.label(), "binding attached");
        self.bindings.push(binding);
        &self.bindings[self.bindings.len() - 1]
    }
}

impl Drop for FormBindings {
    fn drop(&mut self) {
        if !self.bindings.is_empty() {
            debug!(count = self.bindings.len(), "disposing form bindings");
        }
    }
}

#[cfg(test)]
mod tests {
    use fieldsync_types::{Annotation, Ownership, RemotePayload, SelectOption};
    use serde_json::json;

    use super::*;
    use crate::host::MemoryHost;
    use crate::target::{MemoryAnnotation, MemoryOptionList, MemoryPane};
    use crate::test_support::ScriptedTransport;

    fn registry(host: &MemoryHost, transport: &Arc<ScriptedTransport>) -> FormBindings {
        FormBindings::new(
            Arc::new(host.clone()),
            Arc::clone(transport) as Arc<dyn RemoteTransport>,
            BinderSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn registry_wires_synchronous_and_remote_bindings() {
        let host = MemoryHost::new()
            .with_field("name", "")
            .with_field("slug", "")
            .with_field("tags", "");
        let transport = ScriptedTransport::new();
        transport.respond(
            "/ui/groups/slug/scala-io/exists",
            RemotePayload::from_json(json!({ "valid": true })),
        );
        transport.respond("/ui/tags", RemotePayload::from_json(json!([{ "id": "rust", "text": "Rust" }])));

        let mut bindings = registry(&host, &transport);
        let slug = bindings.slug("slug", ["name"]).unwrap();
        let annotation = Arc::new(MemoryAnnotation::new());
        bindings
            .validation("slug", "/ui/groups/slug/{{input}}/exists", Arc::clone(&annotation) as Arc<dyn AnnotationTarget>)
            .unwrap();
        let options = Arc::new(MemoryOptionList::new(Vec::new(), ""));
        bindings
            .remote_options(
                OptionsSource::Static {
                    url: "/ui/tags".to_string(),
                },
                Arc::clone(&options) as Arc<dyn OptionsTarget>,
            )
            .unwrap();
        assert_eq!(bindings.len(), 3);

        host.commit("name", "Scala IO");
        assert_eq!(host.value("slug"), "scala-io");
        assert_eq!(slug.ownership(), Ownership::Auto);

        // Programmatic slug writes raise no change event; the user commit does.
        host.commit("slug", host.value("slug"));
        bindings.settle_all().await;
        assert_eq!(annotation.annotation(), Annotation::Valid { message: None });
        assert_eq!(options.options(), vec![SelectOption::new("rust", "Rust")]);
    }

    #[tokio::test]
    async fn dispose_removes_every_handler() {
        let host = MemoryHost::new().with_field("description", "").with_field("video", "");
        let transport = ScriptedTransport::new();
        let mut bindings = registry(&host, &transport);
        bindings
            .markdown_preview("description", "preview", Arc::new(MemoryPane::new("")) as Arc<dyn HtmlTarget>)
            .unwrap();
        bindings
            .embed_editor("video", Arc::new(MemoryPane::new("")) as Arc<dyn HtmlTarget>)
            .unwrap();
        assert_eq!(host.listener_count(), 4);

        bindings.dispose();
        assert_eq!(host.listener_count(), 0);
        host.commit("video", "https://youtu.be/x");
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn unknown_fields_are_rejected_at_setup() {
        let host = MemoryHost::new();
        let transport = ScriptedTransport::new();
        let mut bindings = registry(&host, &transport);
        let error = bindings
            .embed_editor("missing", Arc::new(MemoryPane::new("")) as Arc<dyn HtmlTarget>)
            .unwrap_err();
        assert!(matches!(error, BindError::UnknownField(_)));
        assert!(bindings.is_empty());
    }

    #[test]
    fn registry_requires_a_runtime() {
        let result = FormBindings::new(
            Arc::new(MemoryHost::new()),
            ScriptedTransport::new() as Arc<dyn RemoteTransport>,
            BinderSettings::default(),
        );
        assert!(matches!(result, Err(BindError::NoRuntime)));
    }
}
