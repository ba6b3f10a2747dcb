//! Implementation of the `oasis run` command.
//!
//! Loads an agent profile file, boots a Platform and an EnvironmentDriver
//! around it, signs every agent up, then steps the simulation until the
//! requested tick count is reached or a shutdown signal arrives.

use std::path::Path;
use std::sync::Arc;

use oasis_core::agent_graph::AgentProfile;
use oasis_core::config::{ClockMode, Config};
use oasis_core::env::{Activation, AgentSpec, EnvAction, StepInput};
use oasis_core::ingest;
use oasis_core::llm::openai_compat::OpenAiCompatProvider;
use oasis_core::llm::LlmProvider;
use oasis_core::recsys::embedding::{EmbeddingProvider, HashEmbeddingProvider, HttpEmbeddingProvider};
use oasis_core::{EnvironmentDriver, Platform};
use tokio_util::sync::CancellationToken;

use super::RunArgs;

/// The full permitted-action set handed to every agent, mirroring the
/// tool schemas `Agent::tool_schemas` is able to produce.
const DEFAULT_PERMITTED_ACTIONS: &[&str] = &[
    "create_post",
    "repost",
    "quote_post",
    "search_posts",
    "trend",
    "like_post",
    "unlike_post",
    "dislike_post",
    "undo_dislike_post",
    "like_comment",
    "unlike_comment",
    "dislike_comment",
    "undo_dislike_comment",
    "report_post",
    "follow",
    "unfollow",
    "mute",
    "unmute",
    "search_user",
    "create_comment",
    "create_group",
    "join_group",
    "leave_group",
    "send_to_group",
    "do_nothing",
];

fn build_embedding_provider(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding.provider.as_str() {
        "" | "hash" => Ok(Arc::new(HashEmbeddingProvider::default())),
        other => {
            let base_url = config.embedding.base_url.clone().ok_or_else(|| {
                anyhow::anyhow!("embedding.base_url is required for provider '{other}'")
            })?;
            Ok(Arc::new(HttpEmbeddingProvider::new(base_url, config.embedding.api_key.clone(), config.embedding.model.clone())))
        }
    }
}

fn build_llm_provider(config: &Config) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let base_url = config.llm.base_url.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "llm.base_url is not set.\n\
             Hint: set [llm] base_url/model in your config, or OASIS_LLM__BASE_URL."
        )
    })?;
    Ok(Arc::new(OpenAiCompatProvider::new(
        base_url,
        config.llm.api_key.clone(),
        config.llm.model.clone(),
        config.llm.provider.clone(),
    )))
}

/// Build one `AgentSpec` per ingested profile row, truncated to `max_agents`
/// when it is non-zero.
fn agent_specs_from_twitter_csv(path: &Path, max_agents: usize) -> anyhow::Result<Vec<AgentSpec>> {
    let profiles = ingest::load_twitter_csv(path)?;
    let take = if max_agents == 0 { profiles.len() } else { max_agents.min(profiles.len()) };
    Ok(profiles
        .into_iter()
        .take(take)
        .map(|p| AgentSpec {
            agent_id: p.agent_id,
            profile: AgentProfile { handle: p.username, display_name: p.name, bio: p.description },
            permitted_actions: DEFAULT_PERMITTED_ACTIONS.iter().map(|s| s.to_string()).collect(),
        })
        .collect())
}

fn agent_specs_from_reddit_json(path: &Path, max_agents: usize) -> anyhow::Result<Vec<AgentSpec>> {
    let profiles = ingest::load_reddit_json(path)?;
    let take = if max_agents == 0 { profiles.len() } else { max_agents.min(profiles.len()) };
    Ok(profiles
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(agent_id, p)| AgentSpec {
            agent_id: agent_id as i64,
            profile: AgentProfile { handle: p.username, display_name: p.realname, bio: p.bio },
            permitted_actions: DEFAULT_PERMITTED_ACTIONS.iter().map(|s| s.to_string()).collect(),
        })
        .collect())
}

/// Execute the `oasis run` command.
///
/// Startup sequence:
/// 1. Ingest agent profiles (format implied by `clock_mode`)
/// 2. Build the embedding and LLM providers from config
/// 3. Open the Platform against the configured Store
/// 4. Build the EnvironmentDriver and sign every agent up
/// 5. Step the simulation until `ticks` is reached or a shutdown signal arrives
/// 6. Drain and close the driver
pub async fn execute(config: &Config, args: &RunArgs) -> anyhow::Result<()> {
    let profiles_path = Path::new(&args.profiles);

    let specs = match config.clock_mode {
        ClockMode::Tick => agent_specs_from_twitter_csv(profiles_path, args.max_agents)?,
        ClockMode::Scaled { .. } => agent_specs_from_reddit_json(profiles_path, args.max_agents)?,
    };
    if specs.is_empty() {
        anyhow::bail!("no agent profiles loaded from {}", args.profiles);
    }
    tracing::info!(agents = specs.len(), "profiles loaded");

    let embedding_provider = build_embedding_provider(config)?;
    let llm_provider = build_llm_provider(config)?;

    let platform = Platform::new(config.clone(), embedding_provider)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open platform store: {e}"))?;

    let driver = EnvironmentDriver::make(platform, specs, llm_provider, config.semaphore);
    driver.reset().await.map_err(|e| anyhow::anyhow!("failed to sign agents up: {e}"))?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received, finishing the current tick");
                shutdown.cancel();
            }
        });
    }

    for tick in 0..args.ticks {
        if shutdown.is_cancelled() {
            tracing::info!(tick, "stopping before the requested tick count was reached");
            break;
        }
        let step = EnvAction { activate_agents: Activation::All, intervention: Vec::new() };
        let report = driver
            .step(StepInput::Scripted(step))
            .await
            .map_err(|e| anyhow::anyhow!("tick {tick} failed: {e}"))?;
        tracing::info!(tick, agents_acted = report.dispatched.len(), "tick complete");
    }

    driver.close().await;
    Ok(())
}
