//! The host port: how bindings reach the page they are attached to.
//!
//! A host identifies fields and tabs by id, reads and writes field values,
//! and delivers change and tab lifecycle events. Writes made through
//! [`FieldHost::write_field`] are programmatic: hosts must not turn them into
//! change events, otherwise derived fields would feed back into the bindings
//! that wrote them.

mod memory;

use std::sync::Arc;

use fieldsync_types::{FieldId, TabId};

use crate::BindError;

pub use memory::MemoryHost;

/// Receives the committed value of a field.
pub type ChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives a tab lifecycle event.
pub type TabHandler = Arc<dyn Fn() + Send + Sync>;

pub trait FieldHost: Send + Sync {
    /// Current value of a field, or `None` when the page has no such field.
    fn read_field(&self, field: &FieldId) -> Option<String>;

    /// Programmatic write. Never dispatches a change event.
    fn write_field(&self, field: &FieldId, value: &str);

    /// Subscribe to user commits on a field.
    fn bind_change(&self, field: &FieldId, handler: ChangeHandler) -> Subscription;

    /// Subscribe to a tab becoming visible.
    fn bind_activate(&self, tab: &TabId, handler: TabHandler) -> Subscription;

    /// Subscribe to a tab being hidden.
    fn bind_deactivate(&self, tab: &TabId, handler: TabHandler) -> Subscription;
}

/// Read a field, treating a missing one as empty.
pub(crate) fn read_or_empty(host: &dyn FieldHost, field: &FieldId) -> String {
    host.read_field(field).unwrap_or_default()
}

/// Fail with [`BindError::UnknownField`] unless the host knows `field`.
pub(crate) fn ensure_field(host: &dyn FieldHost, field: &FieldId) -> Result<(), BindError> {
    match host.read_field(field) {
        Some(_) => Ok(()),
        None => Err(BindError::UnknownField(field.clone())),
    }
}

/// Guard for a handler registration. Dropping it removes the handler.
#[must_use = "dropping a subscription removes its handler immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Remove the handler now instead of at drop.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
