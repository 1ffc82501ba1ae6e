use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a text-valued page element (an input, textarea or select).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a tab-like element whose show/hide transitions drive preview panes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Who performed the most recent write to a field.
///
/// Hosts raise change events only for [`WriteOrigin::User`] commits; writes
/// made by a synchronizer or binder are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOrigin {
    /// Committed by the person filling in the form.
    User,
    /// Written programmatically by a binding.
    Binding,
}

/// Who currently controls the value of a derived field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ownership {
    /// The synchronizer rewrites the field whenever a source changes.
    #[default]
    Auto,
    /// The user typed a value of their own; sources no longer overwrite it.
    Manual,
}

/// How a derived field decides whether the user has taken it over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OwnershipPolicy {
    /// Explicit `Auto`/`Manual` flag. It flips to `Manual` on a user commit to
    /// the derived field and on any other write the synchronizer did not
    /// make, including silent programmatic ones.
    ///
    /// A user who types exactly what the rule would have produced still owns
    /// the field afterwards.
    #[default]
    ExplicitFlag,
    /// Ownership inferred on every source change: the synchronizer keeps the
    /// field while it is empty or equal to the derivation of the previous
    /// source state. Typing the derived value by hand is indistinguishable
    /// from never having edited it.
    ValueEquality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_policy_uses_camel_case_names() {
        let policy: OwnershipPolicy = serde_json::from_str("\"valueEquality\"").expect("policy");
        assert_eq!(policy, OwnershipPolicy::ValueEquality);
        assert_eq!(serde_json::to_string(&OwnershipPolicy::ExplicitFlag).unwrap(), "\"explicitFlag\"");
    }

    #[test]
    fn field_id_serializes_as_plain_string() {
        let id = FieldId::from("event_name");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"event_name\"");
        assert_eq!(id.to_string(), "event_name");
    }
}
