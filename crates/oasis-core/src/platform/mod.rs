//! The single-writer Platform actor.
//!
//! One task owns the [`crate::store::DbPool`], the [`crate::clock::Clock`],
//! the [`crate::agent_graph::AgentGraph`], and the [`crate::recsys::RecEngine`].
//! It drains the [`crate::channel::ChannelReceiver`] one request at a time;
//! from "payload dequeued" to "reply enqueued" a handler body contains no
//! suspension point, so no other mutation can interleave.

pub mod handlers;

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent_graph::AgentGraph;
use crate::channel::{ChannelReceiver, Reply, ACTION_EXIT};

/// Requests the Environment Driver sends to itself via the Channel to keep
/// `recRefresh` and clock advance inside the single-writer step, alongside
/// `exit`. Unlike handler action tags these never produce a
/// trace row.
const ACTION_UPDATE_REC_TABLE: &str = "update_rec_table";
const ACTION_ADVANCE_CLOCK: &str = "advance_clock";
use crate::clock::Clock;
use crate::config::{ClockMode, Config};
use crate::error::{PlatformError, StoreError};
use crate::recsys::embedding::EmbeddingProvider;
use crate::recsys::RecEngine;
use crate::store::{self, DbPool};

use handlers::Ctx;

/// Build the Clock variant selected by `config.clock_mode`.
fn clock_from_mode(mode: ClockMode) -> Clock {
    match mode {
        ClockMode::Tick => Clock::new_tick(),
        ClockMode::Scaled { k } => Clock::new_scaled(k),
    }
}

/// The core simulation actor. Constructed once per simulation run and
/// driven to completion by [`Platform::run`].
pub struct Platform {
    pool: DbPool,
    clock: Clock,
    graph: AgentGraph,
    config: Config,
    rec_engine: RecEngine,
}

impl Platform {
    /// Open (or create) the configured Store, build a fresh Clock/AgentGraph
    /// and the RecEngine for `config.recsys_type`.
    pub async fn new(config: Config, embedding_provider: Arc<dyn EmbeddingProvider>) -> Result<Self, StoreError> {
        let pool = store::init_db(&config.storage.db_path).await?;
        let clock = clock_from_mode(config.clock_mode);
        let rec_engine = RecEngine::new(
            config.recsys_type,
            embedding_provider,
            config.max_rec_post_len as usize,
            config.swap_rate,
        );

        Ok(Platform {
            pool,
            clock,
            graph: AgentGraph::new(),
            config,
            rec_engine,
        })
    }

    /// Build a Platform around an already-open pool, used by tests and by
    /// [`crate::env::EnvironmentDriver`]'s in-process harness.
    pub fn with_pool(pool: DbPool, config: Config, embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        let rec_engine = RecEngine::new(
            config.recsys_type,
            embedding_provider,
            config.max_rec_post_len as usize,
            config.swap_rate,
        );
        Platform {
            pool,
            clock: clock_from_mode(config.clock_mode),
            graph: AgentGraph::new(),
            config,
            rec_engine,
        }
    }

    /// Borrow the underlying config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the Store pool, for callers that need read-only projections
    /// outside the Channel protocol (e.g. CLI inspection commands).
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Advance the Clock by one tick (tick mode only).
    pub fn advance_clock(&mut self) {
        self.clock.advance();
    }

    /// Invoke the RecEngine's refresh against the current Store snapshot,
    /// replacing the `rec` table in one batch.
    pub async fn rec_refresh(&mut self) -> Result<(), crate::error::RecEngineError> {
        let now_epoch = self.clock.now_epoch_seconds();
        info!(strategy = ?self.config.recsys_type, "refreshing rec table");
        self.rec_engine.refresh(&self.pool, now_epoch).await
    }

    /// Drain `receiver` until the `exit` sentinel is observed, dispatching
    /// each request to its handler and replying on its oneshot channel.
    pub async fn run(mut self, mut receiver: ChannelReceiver) {
        while let Some(request) = receiver.recv().await {
            if request.action_tag == ACTION_EXIT {
                info!("platform received exit, draining and stopping");
                break;
            }

            let reply = match request.action_tag.as_str() {
                ACTION_UPDATE_REC_TABLE => match self.rec_refresh().await {
                    Ok(()) => Reply::ok(request.request_id, serde_json::Value::Null),
                    Err(e) => Reply::fail(request.request_id, e.to_string()),
                },
                ACTION_ADVANCE_CLOCK => {
                    self.advance_clock();
                    Reply::ok(request.request_id, serde_json::Value::Null)
                }
                _ => self.handle_one(request.agent_id, &request.action_tag, &request.payload).await,
            };
            if let Some(reply_to) = request.reply_to {
                let _ = reply_to.send(Reply {
                    request_id: request.request_id,
                    ..reply
                });
            }
        }
    }

    /// Dispatch one request and apply the trace-writing rule: a successful
    /// state-changing handler writes exactly one trace row; a failure
    /// writes none.
    async fn handle_one(&mut self, agent_id: i64, action_tag: &str, payload: &serde_json::Value) -> Reply {
        let mut ctx = Ctx {
            pool: &self.pool,
            clock: &self.clock,
            graph: &mut self.graph,
            config: &self.config,
        };

        match handlers::dispatch(&mut ctx, agent_id, action_tag, payload).await {
            Ok(outcome) => {
                if let (Some(action), Some(info)) = (outcome.trace_action, &outcome.trace_info) {
                    let info_str = info.to_string();
                    if let Err(e) = store::trace::insert_trace(&self.pool, agent_id, action, Some(&info_str), &self.clock.now()).await {
                        warn!(error = %e, action, "failed to write trace row for successful handler");
                    }
                }
                Reply::ok(0, outcome.data)
            }
            Err(e) => match e {
                PlatformError::Precondition(msg) => Reply::fail(0, msg),
                PlatformError::Internal(msg) => {
                    warn!(action_tag, error = %msg, "internal error handling request");
                    Reply::fail(0, msg)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::channel;
    use crate::recsys::embedding::HashEmbeddingProvider;
    use serde_json::json;

    async fn test_platform() -> (Platform, crate::channel::ChannelReceiver) {
        let pool = store::init_test_db().await.unwrap();
        let config = Config::default();
        let platform = Platform::with_pool(pool, config, Arc::new(HashEmbeddingProvider::default()));
        let (_tx, rx) = channel();
        (platform, rx)
    }

    #[tokio::test]
    async fn sign_up_then_create_post_round_trips_through_handle_one() {
        let (mut platform, _rx) = test_platform().await;

        let reply = platform
            .handle_one(1, "sign_up", &json!({ "handle": "a", "display_name": "A", "bio": "" }))
            .await;
        assert!(reply.success);

        let reply = platform
            .handle_one(1, "create_post", &json!({ "content": "hello" }))
            .await;
        assert!(reply.success);

        let traces = store::trace::traces_for_user(platform.pool(), 1).await.unwrap();
        assert_eq!(traces.len(), 2);
    }

    #[tokio::test]
    async fn failed_handler_writes_no_trace() {
        let (mut platform, _rx) = test_platform().await;

        let reply = platform.handle_one(1, "create_post", &json!({ "content": "x" })).await;
        assert!(!reply.success);
        assert_eq!(store::trace::count_traces(platform.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_action_tag_fails_without_trace() {
        let (mut platform, _rx) = test_platform().await;
        let reply = platform.handle_one(1, "not_a_real_action", &json!({})).await;
        assert!(!reply.success);
        assert_eq!(store::trace::count_traces(platform.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn run_drains_until_exit_sentinel() {
        let (platform, _rx) = test_platform().await;
        let (tx, rx) = channel();

        let run_handle = tokio::spawn(platform.run(rx));

        let reply = tx
            .call(1, "sign_up", json!({ "handle": "a", "display_name": "A", "bio": "" }))
            .await
            .unwrap();
        assert!(reply.success);

        tx.close();
        run_handle.await.unwrap();
    }

    #[tokio::test]
    async fn rec_refresh_populates_full_set_when_posts_fit() {
        let (mut platform, _rx) = test_platform().await;
        platform.handle_one(1, "sign_up", &json!({ "handle": "a", "display_name": "A", "bio": "" })).await;
        platform.handle_one(1, "create_post", &json!({ "content": "hi" })).await;

        platform.rec_refresh().await.unwrap();
        let user = store::users::get_user_by_agent_id(platform.pool(), 1).await.unwrap().unwrap();
        let slate = store::rec::slate_for_user(platform.pool(), user.id).await.unwrap();
        assert_eq!(slate.len(), 1);
    }
}
