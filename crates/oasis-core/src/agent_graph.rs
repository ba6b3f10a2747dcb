//! Directed follow-graph registry mirrored against the `user`/`follow`
//! tables.
//!
//! The graph is an in-memory adjacency structure kept consistent with the
//! Store by the Platform: `follow`/`unfollow` handlers mutate both within
//! the same single-writer step.

use std::collections::{HashMap, HashSet};

/// Static profile data carried by a registered agent.
#[derive(Debug, Clone, Default)]
pub struct AgentProfile {
    /// Display handle (not required unique).
    pub handle: String,
    /// Display name.
    pub display_name: String,
    /// Free-text biography.
    pub bio: String,
}

/// Directed multigraph of agents and their follow edges.
///
/// Called a multigraph for historical reasons; in practice edges are
/// deduplicated by the `(follower, followee)` uniqueness invariant enforced
/// at the Store layer, so this structure behaves as a simple directed graph.
#[derive(Debug, Default)]
pub struct AgentGraph {
    agents: HashMap<i64, AgentProfile>,
    /// followee_id -> set of follower_ids (edges point follower -> followee).
    followers_of: HashMap<i64, HashSet<i64>>,
    /// follower_id -> set of followee_ids.
    following_of: HashMap<i64, HashSet<i64>>,
    num_edges: usize,
}

impl AgentGraph {
    /// Construct an empty graph.
    pub fn new() -> Self {
        AgentGraph::default()
    }

    /// Register an agent node. Overwrites any existing profile for `id`.
    pub fn add_agent(&mut self, id: i64, profile: AgentProfile) {
        self.agents.insert(id, profile);
        self.followers_of.entry(id).or_default();
        self.following_of.entry(id).or_default();
    }

    /// Remove an agent node and every edge touching it.
    pub fn remove_agent(&mut self, id: i64) {
        if self.agents.remove(&id).is_none() {
            return;
        }
        if let Some(followers) = self.followers_of.remove(&id) {
            self.num_edges -= followers.len();
            for follower in followers {
                if let Some(set) = self.following_of.get_mut(&follower) {
                    set.remove(&id);
                }
            }
        }
        if let Some(following) = self.following_of.remove(&id) {
            self.num_edges -= following.len();
            for followee in following {
                if let Some(set) = self.followers_of.get_mut(&followee) {
                    set.remove(&id);
                }
            }
        }
    }

    /// Add a `follower -> followee` edge. No-ops if the edge already exists
    /// or would create a self-loop.
    ///
    /// Returns `true` if a new edge was added.
    pub fn add_edge(&mut self, follower: i64, followee: i64) -> bool {
        if follower == followee {
            return false;
        }
        self.following_of.entry(follower).or_default();
        self.followers_of.entry(followee).or_default();

        let inserted = self
            .following_of
            .get_mut(&follower)
            .expect("entry just inserted")
            .insert(followee);
        if inserted {
            self.followers_of
                .get_mut(&followee)
                .expect("entry just inserted")
                .insert(follower);
            self.num_edges += 1;
        }
        inserted
    }

    /// Remove a `follower -> followee` edge, if present.
    ///
    /// Returns `true` if an edge was removed.
    pub fn remove_edge(&mut self, follower: i64, followee: i64) -> bool {
        let removed = self
            .following_of
            .get_mut(&follower)
            .map(|set| set.remove(&followee))
            .unwrap_or(false);
        if removed {
            if let Some(set) = self.followers_of.get_mut(&followee) {
                set.remove(&follower);
            }
            self.num_edges -= 1;
        }
        removed
    }

    /// Look up a single agent's profile.
    pub fn get_agent(&self, id: i64) -> Option<&AgentProfile> {
        self.agents.get(&id)
    }

    /// Look up several agents' profiles, skipping unknown ids.
    pub fn get_agents(&self, ids: &[i64]) -> Vec<(i64, &AgentProfile)> {
        ids.iter()
            .filter_map(|id| self.agents.get(id).map(|p| (*id, p)))
            .collect()
    }

    /// Total registered agent count.
    pub fn num_nodes(&self) -> usize {
        self.agents.len()
    }

    /// Total edge count.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// The set of agent ids following `id`.
    pub fn followers(&self, id: i64) -> impl Iterator<Item = &i64> {
        self.followers_of.get(&id).into_iter().flatten()
    }

    /// The set of agent ids `id` follows.
    pub fn following(&self, id: i64) -> impl Iterator<Item = &i64> {
        self.following_of.get(&id).into_iter().flatten()
    }
}
