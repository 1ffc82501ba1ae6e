//! Race-safe population of targets from remote queries.
//!
//! A [`RaceSafeBinder`] owns one [`QueryBinding`]: the piece that knows how
//! to turn a trigger value into a request and how to render the response.
//! The binder supplies the protocol around it. Every new query cancels the
//! previous one, and a response is only applied while its token is live and
//! the trigger still holds the value the query was issued for.

mod duplicates;
mod embed;
mod options;
mod preview;
mod template_data;
mod validation;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fieldsync_api::{RemoteTransport, TransportError};
use fieldsync_types::{BinderPhase, PayloadError, QueryDispatch, QueryOutcome, RemotePayload, RemoteRequest};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::BindError;
use crate::sync::lock;

pub use duplicates::DuplicateSearchBinding;
pub use embed::{EmbedBinding, EmbedSource};
pub use options::{OptionsBinding, OptionsSource};
pub use preview::{PreviewBinding, TemplateRef};
pub use template_data::TemplateDataBinding;
pub use validation::ValidationBinding;

pub(crate) use duplicates::bind_duplicate_search;
pub(crate) use embed::{bind_embed_display, bind_embed_editor};
pub(crate) use options::bind_remote_options;
pub(crate) use preview::{bind_markdown_preview, bind_template_preview};
pub(crate) use template_data::bind_template_data;
pub(crate) use validation::bind_validation;

/// The variable half of a remote binding.
///
/// Implementations must be cheap to call from inside the binder's state lock:
/// none of these methods may call back into the binder.
pub trait QueryBinding: Send + Sync + 'static {
    /// Short name used in log fields.
    fn label(&self) -> &'static str;

    /// Current trigger state. Compared against the echo when a response arrives.
    fn current_value(&self) -> String;

    /// Whether an empty trigger still issues a request.
    fn issues_on_empty(&self) -> bool {
        false
    }

    fn build_request(&self, value: &str) -> Result<RemoteRequest, BindError>;

    /// Render a placeholder while the query is in flight.
    fn show_loading(&self) {}

    /// Render the empty-trigger state.
    fn clear(&self);

    fn apply_success(&self, payload: RemotePayload) -> Result<(), PayloadError>;

    fn apply_failure(&self);
}

/// Lifecycle hooks a registry needs from any binding.
#[async_trait]
pub trait BindingControl: Send + Sync {
    /// Abort in-flight work without touching the target.
    fn cancel(&self);

    /// Wait for in-flight queries and return their outcomes.
    async fn settle(&self) -> Vec<QueryOutcome>;
}

pub struct RaceSafeBinder<B: QueryBinding> {
    inner: Arc<BinderInner<B>>,
}

impl<B: QueryBinding> Clone for RaceSafeBinder<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct BinderInner<B> {
    binding: B,
    transport: Arc<dyn RemoteTransport>,
    runtime: Handle,
    state: Mutex<QueryState>,
    tasks: Mutex<Vec<JoinHandle<QueryOutcome>>>,
    next_query_id: AtomicU64,
}

#[derive(Debug, Default)]
struct QueryState {
    phase: BinderPhase,
    in_flight: Option<InFlightQuery>,
    last_outcome: Option<QueryOutcome>,
}

#[derive(Debug)]
struct InFlightQuery {
    query_id: u64,
    token: CancellationToken,
}

impl<B: QueryBinding> RaceSafeBinder<B> {
    /// Wrap `binding`. Queries are spawned on the runtime current at this call.
    pub fn new(binding: B, transport: Arc<dyn RemoteTransport>) -> Result<Self, BindError> {
        let runtime = Handle::try_current().map_err(|_| BindError::NoRuntime)?;
        Ok(Self {
            inner: Arc::new(BinderInner {
                binding,
                transport,
                runtime,
                state: Mutex::new(QueryState::default()),
                tasks: Mutex::new(Vec::new()),
                next_query_id: AtomicU64::new(1),
            }),
        })
    }

    pub fn binding(&self) -> &B {
        &self.inner.binding
    }

    pub fn phase(&self) -> BinderPhase {
        lock(&self.inner.state).phase
    }

    /// Outcome of the most recent query that was still current when it finished.
    pub fn last_outcome(&self) -> Option<QueryOutcome> {
        lock(&self.inner.state).last_outcome
    }

    /// Run a query for the binding's current trigger value.
    pub fn refresh(&self) -> QueryDispatch {
        let value = self.inner.binding.current_value();
        self.run_query(value)
    }

    /// Supersede any in-flight query and start one for `trigger_value`.
    pub fn run_query(&self, trigger_value: impl Into<String>) -> QueryDispatch {
        let echo = trigger_value.into();
        let inner = &self.inner;
        let label = inner.binding.label();

        let mut state = lock(&inner.state);
        if let Some(previous) = state.in_flight.take() {
            previous.token.cancel();
        }

        if echo.is_empty() && !inner.binding.issues_on_empty() {
            inner.binding.clear();
            state.phase = BinderPhase::Idle;
            state.last_outcome = Some(QueryOutcome::Cleared);
            return QueryDispatch::Cleared;
        }

        let request = match inner.binding.build_request(&echo) {
            Ok(request) => request,
            Err(error) => {
                warn!(binding = label, %error, "remote query rejected");
                inner.binding.apply_failure();
                state.phase = BinderPhase::Idle;
                state.last_outcome = Some(QueryOutcome::Failed);
                return QueryDispatch::Rejected;
            }
        };

        inner.binding.show_loading();
        let query_id = inner.next_query_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        state.in_flight = Some(InFlightQuery {
            query_id,
            token: token.clone(),
        });
        state.phase = BinderPhase::Loading;
        drop(state);

        debug!(binding = label, query_id, url = %request.url, "remote query issued");

        let task_inner = Arc::clone(inner);
        let handle = inner.runtime.spawn(async move {
            let transport = Arc::clone(&task_inner.transport);
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = transport.request(request) => Some(result),
            };
            task_inner.complete(query_id, &echo, &token, result)
        });

        let mut tasks = lock(&inner.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);

        QueryDispatch::Issued { query_id }
    }

    /// Abort the in-flight query and return to idle. The target keeps whatever it shows.
    pub fn cancel(&self) {
        let mut state = lock(&self.inner.state);
        if let Some(in_flight) = state.in_flight.take() {
            in_flight.token.cancel();
        }
        state.phase = BinderPhase::Idle;
    }

    /// Await every query the binder still tracks and return their outcomes.
    ///
    /// Queries that had already finished when a newer one was issued are no
    /// longer tracked.
    pub async fn settle(&self) -> Vec<QueryOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let pending = std::mem::take(&mut *lock(&self.inner.tasks));
            if pending.is_empty() {
                return outcomes;
            }
            for task in pending {
                match task.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(error) => warn!(binding = self.inner.binding.label(), %error, "remote query task failed"),
                }
            }
        }
    }
}

impl<B: QueryBinding> BinderInner<B> {
    fn complete(
        &self,
        query_id: u64,
        echo: &str,
        token: &CancellationToken,
        result: Option<Result<RemotePayload, TransportError>>,
    ) -> QueryOutcome {
        let label = self.binding.label();
        let mut state = lock(&self.state);
        let is_current = state
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.query_id == query_id);
        if is_current {
            state.in_flight = None;
            state.phase = BinderPhase::Idle;
        }

        let outcome = match result {
            None => QueryOutcome::Discarded,
            Some(_) if token.is_cancelled() || self.binding.current_value() != echo => QueryOutcome::Discarded,
            Some(Ok(payload)) => match self.binding.apply_success(payload) {
                Ok(()) => {
                    debug!(binding = label, query_id, "remote query applied");
                    QueryOutcome::Applied
                }
                Err(error) => {
                    warn!(binding = label, query_id, %error, "malformed remote payload");
                    self.binding.apply_failure();
                    QueryOutcome::Failed
                }
            },
            Some(Err(error)) => {
                warn!(binding = label, query_id, %error, "remote query failed");
                self.binding.apply_failure();
                QueryOutcome::Failed
            }
        };

        if is_current {
            state.last_outcome = Some(outcome);
        }
        outcome
    }
}

#[async_trait]
impl<B: QueryBinding> BindingControl for RaceSafeBinder<B> {
    fn cancel(&self) {
        RaceSafeBinder::<B>::cancel(self);
    }

    async fn settle(&self) -> Vec<QueryOutcome> {
        RaceSafeBinder::<B>::settle(self).await
    }
}

impl<B: QueryBinding> std::fmt::Debug for RaceSafeBinder<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("RaceSafeBinder")
            .field("binding", &self.inner.binding.label())
            .field("phase", &state.phase)
            .field("last_outcome", &state.last_outcome)
            .finish()
    }
}
