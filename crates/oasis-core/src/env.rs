//! Environment Driver: the outer loop that advances timesteps.
//!
//! Owns the Channel's send half and spawns the Platform's single-writer
//! `run` loop as a background task. A timestep is, in order: scripted
//! interventions in parallel, `recRefresh`, bounded-concurrency `act-by-llm`
//! turns for the activated agents, then a clock advance — all four phases
//! round-trip through the same Channel the agents use, so `recRefresh` and
//! the clock advance are serialized against handler mutations exactly like
//! any other request.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::agent::Agent;
use crate::agent_graph::AgentProfile;
use crate::channel::{channel, ChannelSender};
use crate::error::EnvError;
use crate::llm::{LlmProvider, ToolCall};
use crate::platform::Platform;

/// Static registration data for one agent, supplied to
/// [`EnvironmentDriver::make`].
pub struct AgentSpec {
    pub agent_id: i64,
    pub profile: AgentProfile,
    pub permitted_actions: Vec<String>,
}

/// Which agents run `act-by-llm` this step.
pub enum Activation {
    All,
    Agents(Vec<i64>),
}

/// A scripted action issued by the Driver on behalf of an agent, bypassing
/// LLM choice entirely — an intervention.
pub struct ScriptedAction {
    pub agent_id: i64,
    pub action_tag: String,
    pub payload: Value,
}

/// The normal step shape: scripted interventions plus an activation list.
pub struct EnvAction {
    pub activate_agents: Activation,
    pub intervention: Vec<ScriptedAction>,
}

/// One agent's explicit per-step instruction, for the alternate `step()`
/// shape that bypasses the activate/intervene pipeline entirely: a mapping
/// `agent -> (ManualAction | LLMAction | list thereof)`.
pub enum AgentAction {
    Manual { action_tag: String, payload: Value },
    Llm,
}

/// Either step shape `step()` accepts.
pub enum StepInput {
    Scripted(EnvAction),
    Explicit(HashMap<i64, Vec<AgentAction>>),
}

/// What happened during one `step()` call, per agent that ran `act-by-llm`.
pub struct StepReport {
    pub dispatched: HashMap<i64, Vec<ToolCall>>,
}

/// The outer simulation loop.
pub struct EnvironmentDriver {
    channel: ChannelSender,
    agents: HashMap<i64, Arc<Agent>>,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    platform_task: Option<JoinHandle<()>>,
}

impl EnvironmentDriver {
    /// `make(agent_graph, platform, database_path?)`: here the
    /// Platform and the agent registry are supplied directly and the Driver
    /// spawns the Platform's `run` loop for the lifetime of the simulation.
    pub fn make(platform: Platform, specs: Vec<AgentSpec>, llm: Arc<dyn LlmProvider>, semaphore_capacity: usize) -> Self {
        let (tx, rx) = channel();
        let platform_task = tokio::spawn(platform.run(rx));

        let agents = specs
            .into_iter()
            .map(|spec| {
                let agent = Agent::new(spec.agent_id, spec.profile, spec.permitted_actions, tx.clone(), llm.clone());
                (spec.agent_id, Arc::new(agent))
            })
            .collect();

        EnvironmentDriver {
            channel: tx,
            agents,
            semaphore: Arc::new(Semaphore::new(semaphore_capacity.max(1))),
            cancel: CancellationToken::new(),
            platform_task: Some(platform_task),
        }
    }

    /// Opens the Platform and signs every registered agent up.
    pub async fn reset(&self) -> Result<(), EnvError> {
        for agent in self.agents.values() {
            let profile = &agent.profile;
            self.channel
                .call(
                    agent.agent_id,
                    "sign_up",
                    json!({ "handle": profile.handle, "display_name": profile.display_name, "bio": profile.bio }),
                )
                .await?;
        }
        Ok(())
    }

    /// Advance one timestep.
    pub async fn step(&self, input: StepInput) -> Result<StepReport, EnvError> {
        match input {
            StepInput::Scripted(env_action) => self.step_scripted(env_action).await,
            StepInput::Explicit(per_agent) => self.step_explicit(per_agent).await,
        }
    }

    async fn step_scripted(&self, env_action: EnvAction) -> Result<StepReport, EnvError> {
        let mut interventions = JoinSet::new();
        for action in env_action.intervention {
            let channel = self.channel.clone();
            interventions.spawn(async move { channel.call(action.agent_id, action.action_tag, action.payload).await });
        }
        while let Some(result) = interventions.join_next().await {
            if let Ok(Err(e)) = result {
                warn!(error = %e, "scripted intervention failed to reach the platform");
            }
        }

        self.channel.call(-1, "update_rec_table", Value::Null).await?;

        let activated: Vec<i64> = match env_action.activate_agents {
            Activation::All => self.agents.keys().copied().collect(),
            Activation::Agents(ids) => ids,
        };
        let dispatched = self.run_llm_turns(activated).await;

        self.channel.call(-1, "advance_clock", Value::Null).await?;

        Ok(StepReport { dispatched })
    }

    async fn step_explicit(&self, per_agent: HashMap<i64, Vec<AgentAction>>) -> Result<StepReport, EnvError> {
        let mut dispatched = HashMap::new();
        let mut llm_turns = Vec::new();

        for (agent_id, actions) in per_agent {
            let Some(agent) = self.agents.get(&agent_id).cloned() else {
                warn!(agent_id, "explicit step named an unregistered agent, skipping");
                continue;
            };
            for action in actions {
                match action {
                    AgentAction::Manual { action_tag, payload } => {
                        if let Err(e) = agent.act_by_manual(&action_tag, payload).await {
                            warn!(agent_id, action = %action_tag, error = %e, "manual action failed");
                        }
                    }
                    AgentAction::Llm => llm_turns.push(agent_id),
                }
            }
        }

        let llm_results = self.run_llm_turns(llm_turns).await;
        dispatched.extend(llm_results);
        Ok(StepReport { dispatched })
    }

    async fn run_llm_turns(&self, agent_ids: Vec<i64>) -> HashMap<i64, Vec<ToolCall>> {
        let mut set = JoinSet::new();
        for agent_id in agent_ids {
            let Some(agent) = self.agents.get(&agent_id).cloned() else {
                continue;
            };
            let semaphore = self.semaphore.clone();
            let cancel = self.cancel.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("driver semaphore closed");
                (agent_id, agent.act_by_llm(&cancel).await)
            });
        }

        let mut dispatched = HashMap::new();
        while let Some(result) = set.join_next().await {
            if let Ok((agent_id, calls)) = result {
                dispatched.insert(agent_id, calls);
            }
        }
        dispatched
    }

    /// Cancel any in-flight agent turns; cascades to agent tasks and to
    /// their in-flight LLM calls.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain and shut down: enqueue `exit` and await the Platform task.
    pub async fn close(mut self) {
        self.channel.close();
        if let Some(task) = self.platform_task.take() {
            let _ = task.await;
        }
    }
}
