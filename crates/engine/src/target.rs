//! Display targets that remote responses are rendered into.
//!
//! A target is whatever part of the page a binding owns: a preview pane, the
//! validity annotation of an input, the option list of a select control or a
//! candidate list. Each trait comes with an in-memory implementation that
//! records what was rendered.

use std::sync::Mutex;

use fieldsync_types::{Annotation, DuplicateCandidate, SelectOption, parse_initial_selection};

use crate::sync::lock;

/// A pane holding rendered markup.
pub trait HtmlTarget: Send + Sync {
    fn html(&self) -> String;
    fn set_html(&self, html: &str);
    /// Show or hide the pane. Panes that are always visible ignore this.
    fn set_visible(&self, _visible: bool) {}
}

/// Validity annotation attached to an input.
pub trait AnnotationTarget: Send + Sync {
    fn annotation(&self) -> Annotation;
    fn set_annotation(&self, annotation: Annotation);
}

/// Option list of a select control.
pub trait OptionsTarget: Send + Sync {
    fn options(&self) -> Vec<SelectOption>;
    /// Ids that were selected when the page was rendered.
    fn initial_selection(&self) -> Vec<String>;
    fn replace_options(&self, options: Vec<SelectOption>);
}

/// List of possible duplicates shown next to a form.
pub trait CandidatesTarget: Send + Sync {
    fn candidates(&self) -> Vec<DuplicateCandidate>;
    fn show_candidates(&self, candidates: Vec<DuplicateCandidate>);
}

#[derive(Debug, Default)]
pub struct MemoryPane {
    state: Mutex<PaneState>,
}

#[derive(Debug, Default)]
struct PaneState {
    html: String,
    visible: bool,
}

impl MemoryPane {
    /// A visible pane showing `html`.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(PaneState {
                html: html.into(),
                visible: true,
            }),
        }
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }
}

impl HtmlTarget for MemoryPane {
    fn html(&self) -> String {
        lock(&self.state).html.clone()
    }

    fn set_html(&self, html: &str) {
        lock(&self.state).html = html.to_string();
    }

    fn set_visible(&self, visible: bool) {
        lock(&self.state).visible = visible;
    }
}

#[derive(Debug, Default)]
pub struct MemoryAnnotation {
    annotation: Mutex<Annotation>,
}

impl MemoryAnnotation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnnotationTarget for MemoryAnnotation {
    fn annotation(&self) -> Annotation {
        lock(&self.annotation).clone()
    }

    fn set_annotation(&self, annotation: Annotation) {
        *lock(&self.annotation) = annotation;
    }
}

#[derive(Debug, Default)]
pub struct MemoryOptionList {
    initial_selection: Vec<String>,
    options: Mutex<Vec<SelectOption>>,
}

impl MemoryOptionList {
    /// Build a list from the rendered options and the control's raw
    /// comma-separated `value` attribute.
    pub fn new(options: Vec<SelectOption>, value_attribute: &str) -> Self {
        Self {
            initial_selection: parse_initial_selection(value_attribute),
            options: Mutex::new(options),
        }
    }

    /// Ids of the options currently selected.
    pub fn selected_ids(&self) -> Vec<String> {
        lock(&self.options)
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.id.clone())
            .collect()
    }
}

impl OptionsTarget for MemoryOptionList {
    fn options(&self) -> Vec<SelectOption> {
        lock(&self.options).clone()
    }

    fn initial_selection(&self) -> Vec<String> {
        self.initial_selection.clone()
    }

    fn replace_options(&self, options: Vec<SelectOption>) {
        *lock(&self.options) = options;
    }
}

#[derive(Debug, Default)]
pub struct MemoryCandidates {
    candidates: Mutex<Vec<DuplicateCandidate>>,
}

impl MemoryCandidates {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CandidatesTarget for MemoryCandidates {
    fn candidates(&self) -> Vec<DuplicateCandidate> {
        lock(&self.candidates).clone()
    }

    fn show_candidates(&self, candidates: Vec<DuplicateCandidate>) {
        *lock(&self.candidates) = candidates;
    }
}
