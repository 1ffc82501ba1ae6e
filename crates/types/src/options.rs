//! Selectable options and the merge rule applied when remote options arrive.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One entry of a selectable-options list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

impl SelectOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            selected: false,
        }
    }

    pub fn selected(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            selected: true,
            ..Self::new(id, text)
        }
    }
}

/// Split a host page's initial `value` attribute (`"a,b"`) into identifiers.
pub fn parse_initial_selection(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Merge fetched options into a list while keeping every pre-selected identifier.
///
/// Order is fetched-first: fetched options keep response order (first
/// occurrence wins on duplicate ids), then pre-selected ids missing from the
/// fetch are appended in pre-selection order. `preselected` is the union of
/// `initial_selection` and the options of `existing` currently marked selected.
/// Labels of appended options come from `existing` when known.
pub fn merge_options(existing: &[SelectOption], initial_selection: &[String], fetched: Vec<SelectOption>) -> Vec<SelectOption> {
    let mut preselected: IndexSet<&str> = initial_selection.iter().map(String::as_str).collect();
    preselected.extend(existing.iter().filter(|option| option.selected).map(|option| option.id.as_str()));

    let mut merged: IndexMap<String, SelectOption> = IndexMap::new();
    for option in fetched {
        if merged.contains_key(&option.id) {
            continue;
        }
        let selected = preselected.contains(option.id.as_str());
        merged.insert(option.id.clone(), SelectOption { selected, ..option });
    }

    for id in preselected {
        if merged.contains_key(id) {
            continue;
        }
        let text = existing
            .iter()
            .find(|option| option.id == id)
            .map(|option| option.text.clone())
            .unwrap_or_else(|| id.to_string());
        merged.insert(id.to_string(), SelectOption::selected(id, text));
    }

    merged.into_values().collect()
}
