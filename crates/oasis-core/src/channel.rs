//! Typed asynchronous request/response bus coupling agents to the Platform.
//!
//! Each sender obtains a fresh request id, enqueues a
//! request, then awaits a reply whose id matches. Delivery is FIFO per
//! sender and exactly-once per waiter. Closing the Platform is done by
//! enqueuing the `exit` action tag; the Platform drains until it sees that
//! tag and stops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::error::ChannelError;

/// The action tag selecting a Platform handler.
pub type ActionTag = String;

/// A request enqueued by an agent (or the Driver on an agent's behalf).
#[derive(Debug)]
pub struct Request {
    /// Unique id assigned by the sending half of the channel.
    pub request_id: u64,
    /// The id of the agent on whose behalf this request is made.
    pub agent_id: i64,
    /// The handler to dispatch to.
    pub action_tag: ActionTag,
    /// Handler arguments, as a JSON value (object, array, or null).
    pub payload: Value,
    /// Where to deliver the reply. `None` only for the internal `exit`
    /// sentinel, which has no waiter.
    pub reply_to: Option<oneshot::Sender<Reply>>,
}

/// The handler's reply, matched back to the waiting caller by `request_id`.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Echoes the originating request id.
    pub request_id: u64,
    /// `true` if the handler applied its mutation successfully.
    pub success: bool,
    /// The handler's result payload on success, or `Value::Null`.
    pub data: Value,
    /// A human-readable precondition/failure reason when `success` is false.
    pub error: Option<String>,
}

impl Reply {
    /// Build a successful reply carrying `data`.
    pub fn ok(request_id: u64, data: Value) -> Self {
        Reply {
            request_id,
            success: true,
            data,
            error: None,
        }
    }

    /// Build a failure reply carrying `error`.
    pub fn fail(request_id: u64, error: impl Into<String>) -> Self {
        Reply {
            request_id,
            success: false,
            data: Value::Null,
            error: Some(error.into()),
        }
    }
}

/// The `exit` action tag that drains and stops the Platform.
pub const ACTION_EXIT: &str = "exit";

/// Handle held by callers (agents, the Driver) to submit requests to the
/// Platform and await their replies.
#[derive(Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<Request>,
    next_id: Arc<AtomicU64>,
}

/// Handle held by the Platform task to drain inbound requests.
pub struct ChannelReceiver {
    rx: mpsc::UnboundedReceiver<Request>,
}

/// Construct a fresh request/response channel pair.
pub fn channel() -> (ChannelSender, ChannelReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChannelSender {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        },
        ChannelReceiver { rx },
    )
}

impl ChannelSender {
    /// Send a request and await its matching reply.
    ///
    /// Assigns a fresh monotonically increasing `request_id`. Requests from
    /// a single `ChannelSender` clone reach the Platform in send order
    /// (FIFO per sender) because the underlying mpsc queue preserves
    /// enqueue order and request ids are assigned at enqueue time.
    pub async fn call(
        &self,
        agent_id: i64,
        action_tag: impl Into<ActionTag>,
        payload: Value,
    ) -> Result<Reply, ChannelError> {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = oneshot::channel();

        let request = Request {
            request_id,
            agent_id,
            action_tag: action_tag.into(),
            payload,
            reply_to: Some(reply_tx),
        };

        self.tx
            .send(request)
            .map_err(|_| ChannelError::Closed { request_id })?;

        reply_rx
            .await
            .map_err(|_| ChannelError::Cancelled { request_id })
    }

    /// Enqueue the `exit` sentinel. The Platform drains remaining requests
    /// up to and including this one, then stops.
    pub fn close(&self) {
        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(Request {
            request_id,
            agent_id: -1,
            action_tag: ACTION_EXIT.to_string(),
            payload: Value::Null,
            reply_to: None,
        });
    }
}

impl ChannelReceiver {
    /// Receive the next request, or `None` once all senders have dropped.
    pub async fn recv(&mut self) -> Option<Request> {
        self.rx.recv().await
    }
}

/// Tracks in-flight FIFO ordering per agent for tests and diagnostics; not
/// required for correctness (the mpsc queue already guarantees it) but
/// mirrors the per-sender FIFO ordering guarantee the Channel contract makes.
#[derive(Default)]
pub struct FifoLedger {
    last_seen: Mutex<HashMap<i64, u64>>,
}

impl FifoLedger {
    /// Record that `request_id` from `agent_id` was observed; panics (in
    /// debug builds, via assertion) if ids from the same agent arrive out of
    /// order.
    pub async fn observe(&self, agent_id: i64, request_id: u64) {
        let mut map = self.last_seen.lock().await;
        if let Some(&prev) = map.get(&agent_id) {
            debug_assert!(
                request_id > prev,
                "FIFO violation for agent {agent_id}: {request_id} after {prev}"
            );
        }
        map.insert(agent_id, request_id);
    }
}
