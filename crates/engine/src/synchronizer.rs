//! Derived fields that follow their sources until the user takes over.
//!
//! A [`DerivedFieldSynchronizer`] keeps one field equal to
//! [`derive_slug`] of an ordered set of source fields. Whether a source
//! change may overwrite the derived field is decided by the configured
//! [`OwnershipPolicy`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fieldsync_types::{FieldId, Ownership, OwnershipPolicy};
use fieldsync_util::derive_slug;
use tracing::debug;

use crate::BindError;
use crate::host::{FieldHost, Subscription, ensure_field, read_or_empty};
use crate::sync::lock;

pub struct DerivedFieldSynchronizer {
    host: Arc<dyn FieldHost>,
    derived: FieldId,
    sources: Vec<FieldId>,
    separator: char,
    policy: OwnershipPolicy,
    state: Mutex<SyncState>,
}

#[derive(Debug)]
struct SyncState {
    /// Last value each source was observed with.
    previous: HashMap<FieldId, String>,
    /// Only meaningful under [`OwnershipPolicy::ExplicitFlag`].
    ownership: Ownership,
    /// Derived value as last written or observed by this synchronizer.
    expected: String,
}

impl SyncState {
    /// A non-empty derived value this synchronizer did not produce was
    /// written by someone else, whether or not the host raised an event.
    fn notice_foreign_write(&mut self, field: &FieldId, current: &str) {
        if self.ownership == Ownership::Auto && !current.is_empty() && current != self.expected {
            debug!(%field, "derived field written elsewhere; tracking stopped");
            self.ownership = Ownership::Manual;
        }
    }
}

impl DerivedFieldSynchronizer {
    /// Attach to `derived` and `sources`, recording the current source values
    /// as the baseline for the first change.
    pub fn new(
        host: Arc<dyn FieldHost>,
        derived: FieldId,
        sources: Vec<FieldId>,
        separator: char,
        policy: OwnershipPolicy,
    ) -> Result<Self, BindError> {
        ensure_field(host.as_ref(), &derived)?;
        let mut previous = HashMap::with_capacity(sources.len());
        for source in &sources {
            let value = host
                .read_field(source)
                .ok_or_else(|| BindError::UnknownField(source.clone()))?;
            previous.insert(source.clone(), value);
        }

        let current_values: Vec<String> = sources.iter().map(|source| read_or_empty(host.as_ref(), source)).collect();
        let current_derived = read_or_empty(host.as_ref(), &derived);
        let ownership = if current_derived.is_empty() || current_derived == derive_slug(&current_values, separator) {
            Ownership::Auto
        } else {
            Ownership::Manual
        };

        Ok(Self {
            host,
            derived,
            sources,
            separator,
            policy,
            state: Mutex::new(SyncState {
                previous,
                ownership,
                expected: current_derived,
            }),
        })
    }

    pub fn derived_field(&self) -> &FieldId {
        &self.derived
    }

    pub fn sources(&self) -> &[FieldId] {
        &self.sources
    }

    /// Derivation of the sources as they are right now.
    pub fn derive(&self) -> String {
        let values: Vec<String> = self
            .sources
            .iter()
            .map(|source| read_or_empty(self.host.as_ref(), source))
            .collect();
        derive_slug(&values, self.separator)
    }

    /// Who controls the derived field.
    ///
    /// Under [`OwnershipPolicy::ValueEquality`] this is computed from the
    /// current values: the field is `Auto` while it is empty or equal to the
    /// derivation of the last observed source state.
    pub fn ownership(&self) -> Ownership {
        let mut state = lock(&self.state);
        match self.policy {
            OwnershipPolicy::ExplicitFlag => {
                let current = read_or_empty(self.host.as_ref(), &self.derived);
                state.notice_foreign_write(&self.derived, &current);
                state.ownership
            }
            OwnershipPolicy::ValueEquality => {
                let current = read_or_empty(self.host.as_ref(), &self.derived);
                let observed: Vec<&str> = self
                    .sources
                    .iter()
                    .map(|source| state.previous.get(source).map(String::as_str).unwrap_or_default())
                    .collect();
                if current.is_empty() || current == derive_slug(&observed, self.separator) {
                    Ownership::Auto
                } else {
                    Ownership::Manual
                }
            }
        }
    }

    /// React to a committed change of one source field.
    pub fn on_source_change(&self, changed: &FieldId) {
        let mut state = lock(&self.state);
        let host = self.host.as_ref();

        let current_values: Vec<String> = self.sources.iter().map(|source| read_or_empty(host, source)).collect();
        let old_values: Vec<String> = self
            .sources
            .iter()
            .zip(&current_values)
            .map(|(source, current)| {
                if source == changed {
                    state.previous.get(source).cloned().unwrap_or_default()
                } else {
                    current.clone()
                }
            })
            .collect();

        let old_derived = derive_slug(&old_values, self.separator);
        let new_derived = derive_slug(&current_values, self.separator);
        if let Some(position) = self.sources.iter().position(|source| source == changed) {
            state.previous.insert(changed.clone(), current_values[position].clone());
        }

        let current_derived = read_or_empty(host, &self.derived);
        let owned = match self.policy {
            OwnershipPolicy::ValueEquality => current_derived.is_empty() || current_derived == old_derived,
            OwnershipPolicy::ExplicitFlag => {
                if current_derived.is_empty() {
                    state.ownership = Ownership::Auto;
                }
                state.notice_foreign_write(&self.derived, &current_derived);
                state.ownership == Ownership::Auto
            }
        };

        if owned && current_derived != new_derived {
            debug!(field = %self.derived, value = %new_derived, "derived field updated");
            host.write_field(&self.derived, &new_derived);
        }
        if owned {
            state.expected = new_derived;
        }
    }

    /// React to a user commit on the derived field itself.
    pub fn on_derived_edit(&self, value: &str) {
        if self.policy != OwnershipPolicy::ExplicitFlag {
            return;
        }
        let mut state = lock(&self.state);
        state.expected = value.to_string();
        state.ownership = if value.is_empty() {
            Ownership::Auto
        } else {
            Ownership::Manual
        };
    }

    /// Subscribe `synchronizer` to every source and to the derived field.
    pub(crate) fn subscribe(synchronizer: &Arc<Self>) -> Vec<Subscription> {
        let host = Arc::clone(&synchronizer.host);
        let mut subscriptions = Vec::with_capacity(synchronizer.sources.len() + 1);
        for source in &synchronizer.sources {
            let target = Arc::clone(synchronizer);
            let changed = source.clone();
            subscriptions.push(host.bind_change(source, Arc::new(move |_: &str| target.on_source_change(&changed))));
        }
        let target = Arc::clone(synchronizer);
        subscriptions.push(host.bind_change(&synchronizer.derived, Arc::new(move |value: &str| target.on_derived_edit(value))));
        subscriptions
    }
}

impl std::fmt::Debug for DerivedFieldSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedFieldSynchronizer")
            .field("derived", &self.derived)
            .field("sources", &self.sources)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
