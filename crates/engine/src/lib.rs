//! Reactive field synchronization and race-safe remote population for forms.
//!
//! Two cooperating pieces operate on a [`FieldHost`]:
//!
//! - [`DerivedFieldSynchronizer`] keeps a derived field (a slug) equal to a
//!   normalization of its source fields until the user takes it over.
//! - [`RaceSafeBinder`] populates a target from a remote query triggered by a
//!   field, and drops responses that arrive after the trigger has moved on.
//!
//! [`FormBindings`] wires both to a page and owns the resulting
//! subscriptions.
//!
//! ```ignore
//! use std::sync::Arc;
//! use fieldsync_engine::{FormBindings, MemoryHost, MemoryAnnotation, load_settings};
//!
//! let host = MemoryHost::new().with_field("name", "").with_field("slug", "");
//! let mut page = FormBindings::connect(Arc::new(host.clone()), load_settings()?)?;
//! page.slug("slug", ["name"])?;
//! page.validation("slug", "/ui/groups/slug/{{input}}/exists", Arc::new(MemoryAnnotation::new()))?;
//! host.commit("name", "Scala IO");
//! page.settle_all().await;
//! ```

pub mod binder;
pub mod config;
mod error;
pub mod host;
pub mod registry;
mod sync;
pub mod synchronizer;
pub mod target;

#[cfg(test)]
mod test_support;

pub use binder::{
    BindingControl, DuplicateSearchBinding, EmbedBinding, EmbedSource, OptionsBinding, OptionsSource, PreviewBinding,
    QueryBinding, RaceSafeBinder, TemplateDataBinding, TemplateRef, ValidationBinding,
};
pub use config::{BinderSettings, ConfigError, EndpointSettings, SlugSettings, load_settings, load_settings_from_path};
pub use error::BindError;
pub use host::{ChangeHandler, FieldHost, MemoryHost, Subscription, TabHandler};
pub use registry::{Binding, FormBindings};
pub use synchronizer::DerivedFieldSynchronizer;
pub use target::{
    AnnotationTarget, CandidatesTarget, HtmlTarget, MemoryAnnotation, MemoryCandidates, MemoryOptionList, MemoryPane,
    OptionsTarget,
};
