//! Core simulation engine for the oasis social-media agent simulator.
//!
//! A discrete-time simulator of a social platform populated by autonomous,
//! LLM-driven agents. The engine is built around a single-writer [`platform`]
//! actor that serializes every state mutation against a SQLite-backed
//! [`store`], a [`channel`] that couples many concurrent [`agent`] tasks to
//! that actor, a pluggable [`recsys`] feed-ranking subsystem, and an
//! [`env`] driver that advances timesteps.

pub mod agent;
pub mod agent_graph;
pub mod channel;
pub mod clock;
pub mod config;
pub mod env;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod platform;
pub mod recsys;
pub mod store;

pub use agent_graph::AgentGraph;
pub use channel::{channel, ChannelReceiver, ChannelSender};
pub use clock::Clock;
pub use config::Config;
pub use env::EnvironmentDriver;
pub use platform::Platform;
