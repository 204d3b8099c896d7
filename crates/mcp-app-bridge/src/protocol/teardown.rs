//! Teardown controller: best-effort acknowledgment with forced fallback.
//!
//! The Host sends `ui/resource-teardown` and waits a bounded time for the
//! App's response. A matching response completes the cycle; silence past
//! the timeout completes it anyway. Either way the completion callback
//! fires exactly once per cycle, and the Host never hangs on the App.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::types::RequestId;

/// Default time to wait for the App before forcing completion.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// One in-flight teardown request.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTeardown {
    pub request_id: RequestId,
    pub started_at: DateTime<Utc>,
    pub completed: bool,
}

/// State of the current teardown cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownState {
    None,
    Requested,
    Completed,
    TimedOut,
}

/// How a teardown cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// The App answered with the matching id.
    Acknowledged,
    /// No answer within the timeout; completed anyway.
    TimedOut,
    /// Completed without a wire message (App never became ready, or the
    /// request could not be sent).
    Skipped,
    /// A newer teardown request replaced this one before it finished.
    Superseded,
}

/// Completion callback.
pub type TeardownCallback = Arc<dyn Fn() + Send + Sync>;

struct Inner {
    pending: Option<(PendingTeardown, oneshot::Sender<()>)>,
    state: TeardownState,
    completed: bool,
}

/// Owns the pending-teardown record. Single writer: the Host engine.
pub struct TeardownController {
    inner: Mutex<Inner>,
    timeout: Duration,
    on_complete: Option<TeardownCallback>,
}

impl TeardownController {
    pub fn new(timeout: Duration, on_complete: Option<TeardownCallback>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pending: None,
                state: TeardownState::None,
                completed: false,
            }),
            timeout,
            on_complete,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> TeardownState {
        self.lock().state
    }

    /// Whether the latest cycle has completed (acknowledged or forced).
    pub fn is_completed(&self) -> bool {
        self.lock().completed
    }

    /// The in-flight record, if a request is outstanding.
    pub fn pending(&self) -> Option<PendingTeardown> {
        self.lock().pending.as_ref().map(|(p, _)| p.clone())
    }

    /// Start a cycle with a fresh id.
    ///
    /// String ids never collide with the App's integer request ids. An
    /// outstanding request is replaced; its late response will no longer
    /// match.
    pub fn begin(&self) -> (RequestId, oneshot::Receiver<()>) {
        let request_id = RequestId::String(format!("teardown-{}", uuid::Uuid::new_v4()));
        let (tx, rx) = oneshot::channel();
        let mut inner = self.lock();
        if let Some((previous, _)) = inner.pending.take() {
            tracing::warn!(
                "Teardown {} superseded by a new request before completing",
                previous.request_id
            );
        }
        inner.pending = Some((
            PendingTeardown {
                request_id: request_id.clone(),
                started_at: Utc::now(),
                completed: false,
            },
            tx,
        ));
        inner.state = TeardownState::Requested;
        inner.completed = false;
        (request_id, rx)
    }

    /// Handle a response carrying `id`. Returns true if it matched the
    /// outstanding request; anything else leaves the state untouched.
    pub fn acknowledge(&self, id: &RequestId) -> bool {
        let waiter = {
            let mut inner = self.lock();
            match &inner.pending {
                Some((pending, _)) if &pending.request_id == id && !pending.completed => {}
                _ => return false,
            }
            let Some((pending, tx)) = inner.pending.take() else {
                return false;
            };
            let elapsed = Utc::now() - pending.started_at;
            tracing::info!(
                "Teardown {} acknowledged after {}ms",
                pending.request_id,
                elapsed.num_milliseconds()
            );
            inner.state = TeardownState::Completed;
            inner.completed = true;
            tx
        };
        let _ = waiter.send(());
        self.fire();
        true
    }

    /// Timeout path: complete the outstanding request `id` without an
    /// answer. Returns false if it already finished or was superseded.
    pub fn force_complete(&self, id: &RequestId) -> bool {
        {
            let mut inner = self.lock();
            match &inner.pending {
                Some((pending, _)) if &pending.request_id == id => {}
                _ => return false,
            }
            inner.pending = None;
            inner.state = TeardownState::TimedOut;
            inner.completed = true;
        }
        tracing::warn!(
            "Teardown {} not acknowledged within {:?}, forcing completion",
            id,
            self.timeout
        );
        self.fire();
        true
    }

    /// Complete without sending anything (App never reached ready).
    pub fn complete_immediately(&self) {
        {
            let mut inner = self.lock();
            inner.pending = None;
            inner.state = TeardownState::Completed;
            inner.completed = true;
        }
        tracing::info!("Teardown completed immediately, app was not ready");
        self.fire();
    }

    /// Wait for the acknowledgment of `id`, forcing completion on timeout.
    pub async fn wait(&self, id: RequestId, ack: oneshot::Receiver<()>) -> TeardownOutcome {
        match tokio::time::timeout(self.timeout, ack).await {
            Ok(Ok(())) => TeardownOutcome::Acknowledged,
            Ok(Err(_)) => TeardownOutcome::Superseded,
            Err(_) => {
                if self.force_complete(&id) {
                    TeardownOutcome::TimedOut
                } else if self.pending().is_none() && self.is_completed() {
                    TeardownOutcome::Acknowledged
                } else {
                    TeardownOutcome::Superseded
                }
            }
        }
    }

    fn fire(&self) {
        if let Some(callback) = &self.on_complete {
            callback();
        }
    }
}
