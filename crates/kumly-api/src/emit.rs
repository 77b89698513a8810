// ── Synchronous emit bridge ──
//
// Turns emit + out-of-band acknowledgment into an awaitable call bounded
// by a `CallContext`. Each call owns one correlation: a transport ack id
// plus a oneshot channel. The correlation guard deregisters the ack id on
// every exit path, including the caller dropping the future mid-await.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::context::CallContext;
use crate::envelope::Response;
use crate::error::Error;
use crate::transport::{AckId, Args, Transport};

/// Request/acknowledgment bridge over a [`Transport`].
///
/// Cheaply cloneable; all clones share the same transport.
#[derive(Clone)]
pub struct Emitter {
    transport: Arc<dyn Transport>,
}

impl Emitter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Emit `event` and wait for its acknowledgment envelope.
    ///
    /// Returns the decoded envelope whether or not `ok` is set; use
    /// [`emit`](Self::emit) when `ok: false` should be an error.
    pub async fn request(
        &self,
        ctx: &CallContext,
        event: &str,
        args: Args,
    ) -> Result<Response, Error> {
        let reply = self.request_raw(ctx, event, args).await?;
        Response::from_ack(event, reply)
    }

    /// Emit `event`, wait for the acknowledgment, and fail with
    /// [`Error::Rejected`] if the server answered `ok: false`.
    pub async fn emit(&self, ctx: &CallContext, event: &str, args: Args) -> Result<Response, Error> {
        self.request(ctx, event, args).await?.into_result()
    }

    /// Emit `event` and return the raw acknowledgment arguments.
    pub async fn request_raw(
        &self,
        ctx: &CallContext,
        event: &str,
        args: Args,
    ) -> Result<Args, Error> {
        if let Some(reason) = ctx.err() {
            debug!(event, ?reason, "context already done, not sending");
            return Err(reason.into());
        }

        let (tx, rx) = oneshot::channel();
        let id = self.transport.emit_with_ack(
            event,
            args,
            Box::new(move |reply| {
                // Receiver is gone if the caller gave up; nothing to do.
                let _ = tx.send(reply);
            }),
        )?;
        let _correlation = Correlation {
            transport: self.transport.as_ref(),
            id,
        };
        trace!(event, ack_id = id, "awaiting acknowledgment");

        tokio::select! {
            biased;
            reply = rx => reply.map_err(|_| Error::ConnectionClosed),
            reason = ctx.done() => {
                debug!(event, ack_id = id, ?reason, "abandoning pending acknowledgment");
                Err(reason.into())
            }
        }
    }
}

/// Deregisters a pending ack id when dropped.
struct Correlation<'a> {
    transport: &'a dyn Transport,
    id: AckId,
}

impl Drop for Correlation<'_> {
    fn drop(&mut self) {
        self.transport.cancel_ack(self.id);
    }
}
