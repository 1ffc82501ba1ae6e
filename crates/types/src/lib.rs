//! Shared type definitions for the fieldsync crates.
//!
//! The types here are plain data: identifiers for page elements, the
//! request/response shapes exchanged with backend endpoints, and the small
//! state enums reported by synchronizers and binders. Behavior lives in
//! `fieldsync-engine`.

mod field;
mod options;
mod payload;
mod phase;
mod preview;
mod remote;
mod validation;

pub use field::{FieldId, Ownership, OwnershipPolicy, TabId, WriteOrigin};
pub use options::{SelectOption, merge_options, parse_initial_selection};
pub use payload::{ENVELOPE_METADATA_KEYS, PayloadError, RemotePayload};
pub use phase::{BinderPhase, QueryDispatch, QueryOutcome};
pub use preview::{DuplicateCandidate, TemplateRenderRequest, TemplateRenderResponse};
pub use remote::{RemoteRequest, RequestBody, RequestMethod, ResponseFormat};
pub use validation::{Annotation, ValidationResponse};
