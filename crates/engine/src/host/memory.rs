//! In-process host backed by plain maps.
//!
//! `MemoryHost` stands in for a rendered page: tests and headless embedders
//! register fields, then drive user commits and tab switches explicitly.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use fieldsync_types::{FieldId, TabId, WriteOrigin};
use indexmap::IndexMap;

use super::{ChangeHandler, FieldHost, Subscription, TabHandler};
use crate::sync::lock;

#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Arc<MemoryHostInner>,
}

#[derive(Default)]
struct MemoryHostInner {
    fields: Mutex<IndexMap<FieldId, FieldState>>,
    change_listeners: Mutex<Vec<ChangeListener>>,
    tab_listeners: Mutex<Vec<TabListener>>,
    active_tabs: Mutex<HashSet<TabId>>,
    next_listener_id: AtomicU64,
}

#[derive(Debug, Clone, Default)]
struct FieldState {
    value: String,
    last_origin: Option<WriteOrigin>,
}

struct ChangeListener {
    id: u64,
    field: FieldId,
    handler: ChangeHandler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TabEvent {
    Activate,
    Deactivate,
}

struct TabListener {
    id: u64,
    tab: TabId,
    event: TabEvent,
    handler: TabHandler,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MemoryHost::add_field`].
    pub fn with_field(self, field: impl Into<FieldId>, value: impl Into<String>) -> Self {
        self.add_field(field, value);
        self
    }

    /// Register a field with its initial value. Re-adding replaces the value.
    pub fn add_field(&self, field: impl Into<FieldId>, value: impl Into<String>) {
        lock(&self.inner.fields).insert(
            field.into(),
            FieldState {
                value: value.into(),
                last_origin: None,
            },
        );
    }

    /// Current value, empty when the field is unknown.
    pub fn value(&self, field: impl Into<FieldId>) -> String {
        let field = field.into();
        lock(&self.inner.fields)
            .get(&field)
            .map(|state| state.value.clone())
            .unwrap_or_default()
    }

    /// Who wrote the field last; `None` when only the initial value was set.
    pub fn last_origin(&self, field: impl Into<FieldId>) -> Option<WriteOrigin> {
        let field = field.into();
        lock(&self.inner.fields).get(&field).and_then(|state| state.last_origin)
    }

    /// Simulate a user editing and committing a field.
    ///
    /// Unlike [`FieldHost::write_field`] this dispatches the change event to
    /// every handler bound to the field. Handlers run after all host locks
    /// are released, so they may read and write fields freely.
    pub fn commit(&self, field: impl Into<FieldId>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        {
            let mut fields = lock(&self.inner.fields);
            let state = fields.entry(field.clone()).or_default();
            state.value = value.clone();
            state.last_origin = Some(WriteOrigin::User);
        }

        let handlers: Vec<ChangeHandler> = lock(&self.inner.change_listeners)
            .iter()
            .filter(|listener| listener.field == field)
            .map(|listener| Arc::clone(&listener.handler))
            .collect();
        for handler in handlers {
            handler(&value);
        }
    }

    /// Show a tab. Fires activation handlers only on a hidden-to-visible transition.
    pub fn activate_tab(&self, tab: impl Into<TabId>) {
        let tab = tab.into();
        if lock(&self.inner.active_tabs).insert(tab.clone()) {
            self.dispatch_tab(&tab, TabEvent::Activate);
        }
    }

    /// Hide a tab. Fires deactivation handlers only when the tab was visible.
    pub fn deactivate_tab(&self, tab: impl Into<TabId>) {
        let tab = tab.into();
        if lock(&self.inner.active_tabs).remove(&tab) {
            self.dispatch_tab(&tab, TabEvent::Deactivate);
        }
    }

    pub fn is_tab_active(&self, tab: impl Into<TabId>) -> bool {
        lock(&self.inner.active_tabs).contains(&tab.into())
    }

    /// Number of live handler registrations across fields and tabs.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.change_listeners).len() + lock(&self.inner.tab_listeners).len()
    }

    fn dispatch_tab(&self, tab: &TabId, event: TabEvent) {
        let handlers: Vec<TabHandler> = lock(&self.inner.tab_listeners)
            .iter()
            .filter(|listener| &listener.tab == tab && listener.event == event)
            .map(|listener| Arc::clone(&listener.handler))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    fn bind_tab(&self, tab: &TabId, event: TabEvent, handler: TabHandler) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.tab_listeners).push(TabListener {
            id,
            tab: tab.clone(),
            event,
            handler,
        });

        let weak: Weak<MemoryHostInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner.tab_listeners).retain(|listener| listener.id != id);
            }
        })
    }
}

impl FieldHost for MemoryHost {
    fn read_field(&self, field: &FieldId) -> Option<String> {
        lock(&self.inner.fields).get(field).map(|state| state.value.clone())
    }

    fn write_field(&self, field: &FieldId, value: &str) {
        let mut fields = lock(&self.inner.fields);
        let state = fields.entry(field.clone()).or_default();
        state.value = value.to_string();
        state.last_origin = Some(WriteOrigin::Binding);
    }

    fn bind_change(&self, field: &FieldId, handler: ChangeHandler) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.change_listeners).push(ChangeListener {
            id,
            field: field.clone(),
            handler,
        });

        let weak: Weak<MemoryHostInner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner.change_listeners).retain(|listener| listener.id != id);
            }
        })
    }

    fn bind_activate(&self, tab: &TabId, handler: TabHandler) -> Subscription {
        self.bind_tab(tab, TabEvent::Activate, handler)
    }

    fn bind_deactivate(&self, tab: &TabId, handler: TabHandler) -> Subscription {
        self.bind_tab(tab, TabEvent::Deactivate, handler)
    }
}
