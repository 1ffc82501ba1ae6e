use serde::{Deserialize, Serialize};

/// Stored state of a binder between and during queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinderPhase {
    #[default]
    Idle,
    /// A query is in flight for the current trigger value.
    Loading,
}

/// How a single query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryOutcome {
    /// The success transform was applied to the target.
    Applied,
    /// The failure transform was applied (transport failure or malformed payload).
    Failed,
    /// The result was stale or the query was cancelled; the target was left untouched.
    Discarded,
    /// The trigger was empty; the target was cleared without issuing a request.
    Cleared,
}

/// Immediate result of asking a binder to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDispatch {
    /// Empty trigger; the target was cleared synchronously.
    Cleared,
    /// The request could not be built; the failure transform was applied synchronously.
    Rejected,
    /// A request was issued and will complete asynchronously.
    Issued { query_id: u64 },
}
