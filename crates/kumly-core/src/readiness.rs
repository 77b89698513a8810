// ── Readiness tracker ──
//
// Pending set of snapshot events that must arrive after login before the
// session is handed to the caller. The ready signal flips exactly once.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use kumly_api::{CallContext, DoneReason};

pub(crate) struct Readiness {
    pending: Mutex<BTreeSet<String>>,
    ready: watch::Sender<bool>,
}

impl Readiness {
    pub(crate) fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pending: BTreeSet<String> = required.into_iter().map(Into::into).collect();
        let (ready, _) = watch::channel(pending.is_empty());
        Self {
            pending: Mutex::new(pending),
            ready,
        }
    }

    /// Record that `event` has fired. Returns `true` only for the call
    /// that completes readiness.
    pub(crate) fn mark(&self, event: &str) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.remove(event) {
            return false;
        }
        debug!(event, remaining = pending.len(), "snapshot received");
        if pending.is_empty() {
            self.ready.send_replace(true);
            return true;
        }
        false
    }

    pub(crate) fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Names still outstanding.
    pub(crate) fn pending(&self) -> Vec<String> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Block until ready or until `ctx` is done.
    pub(crate) async fn wait(&self, ctx: &CallContext) -> Result<(), DoneReason> {
        let mut rx = self.ready.subscribe();
        tokio::select! {
            biased;
            _ = rx.wait_for(|ready| *ready) => Ok(()),
            reason = ctx.done() => Err(reason),
        }
    }
}
