//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fieldsync_api::{RemoteTransport, TransportError};
use fieldsync_types::{RemotePayload, RemoteRequest};
use tokio::sync::oneshot;

use crate::sync::lock;

type Reply = Result<RemotePayload, TransportError>;

enum Route {
    Ready(Result<RemotePayload, u16>),
    /// Each request pops one gate and waits until the test releases it.
    Gated(VecDeque<oneshot::Receiver<Reply>>),
}

/// Answers requests by exact URL; unknown URLs fail with 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, Route>>,
    requests: Mutex<Vec<RemoteRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every request for `url` immediately with `payload`.
    pub(crate) fn respond(&self, url: &str, payload: RemotePayload) {
        lock(&self.routes).insert(url.to_string(), Route::Ready(Ok(payload)));
    }

    /// Fail every request for `url` with an HTTP status.
    pub(crate) fn fail(&self, url: &str, status: u16) {
        lock(&self.routes).insert(url.to_string(), Route::Ready(Err(status)));
    }

    /// Hold the next request for `url` until the returned sender fires.
    pub(crate) fn gate(&self, url: &str) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        let mut routes = lock(&self.routes);
        match routes.get_mut(url) {
            Some(Route::Gated(queue)) => queue.push_back(receiver),
            _ => {
                routes.insert(url.to_string(), Route::Gated(VecDeque::from([receiver])));
            }
        }
        sender
    }

    pub(crate) fn requests(&self) -> Vec<RemoteRequest> {
        lock(&self.requests).clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

enum Pending {
    Now(Reply),
    Wait(oneshot::Receiver<Reply>),
}

#[async_trait]
impl RemoteTransport for ScriptedTransport {
    async fn request(&self, request: RemoteRequest) -> Result<RemotePayload, TransportError> {
        let url = request.url.clone();
        lock(&self.requests).push(request);

        let pending = match lock(&self.routes).get_mut(&url) {
            Some(Route::Ready(Ok(payload))) => Pending::Now(Ok(payload.clone())),
            Some(Route::Ready(Err(status))) => Pending::Now(Err(TransportError::Status {
                status: *status,
                body_preview: "<empty>".to_string(),
            })),
            Some(Route::Gated(queue)) => match queue.pop_front() {
                Some(receiver) => Pending::Wait(receiver),
                None => Pending::Now(Err(TransportError::Unavailable(format!("no gate left for {url}")))),
            },
            None => Pending::Now(Err(TransportError::Status {
                status: 404,
                body_preview: "<empty>".to_string(),
            })),
        };

        match pending {
            Pending::Now(reply) => reply,
            Pending::Wait(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(TransportError::Unavailable(format!("gate for {url} was dropped")))),
        }
    }
}
