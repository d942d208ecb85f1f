//! Agents and their per-step behavior.
//!
//! An agent activation runs four operations in a fixed order:
//!
//! 1. **Opinion update**: pull toward each neighbor in turn, then round.
//! 2. **Connection breaking**: drop neighbors now further than `tolerance`.
//! 3. **Neighbor connections**: sample non-neighbors uniformly, connect the
//!    similar ones.
//! 4. **Recommended connections**: draw non-neighbors weighted by opinion
//!    similarity, connect the similar ones.
//!
//! The activation is computed as a [`StepPlan`] against a read view of the
//! population and the agent's neighbor list, then applied to the graph. The
//! only state an activation reads and writes in the middle is the agent's own
//! opinion and adjacency, which the plan tracks locally, so planning then
//! applying immediately is the same as mutating the live graph operation by
//! operation. Simultaneous activation plans every agent against one frozen
//! view and applies all plans afterwards.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::SocialGraph;
use crate::sampling::{uniform_sample, weighted_sample};

/// The neutral opinion.
pub const NEUTRAL: f64 = 0.5;

/// Agent identifier; doubles as the graph node key and the index into the
/// population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub usize);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Agent#{}", self.0)
    }
}

/// Three-way opinion classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpinionState {
    /// Below neutral
    Negative,
    /// Exactly neutral
    Neutral,
    /// Above neutral
    Positive,
}

impl OpinionState {
    /// Classify a raw opinion by its side of neutral.
    pub fn of_opinion(opinion: f64) -> Self {
        if opinion > NEUTRAL {
            Self::Positive
        } else if opinion < NEUTRAL {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// State used for homophily.
    ///
    /// Neutral agents are `Neutral`. Any other agent takes the strict
    /// majority side of its neighbors' opinions; without a strict majority
    /// (including no neighbors) the state is `Neutral`.
    pub fn of_agent(opinion: f64, neighbor_opinions: &[f64]) -> Self {
        if opinion == NEUTRAL {
            return Self::Neutral;
        }
        let half = neighbor_opinions.len() as f64 / 2.0;
        let positive = neighbor_opinions.iter().filter(|&&o| o > NEUTRAL).count() as f64;
        let negative = neighbor_opinions.iter().filter(|&&o| o < NEUTRAL).count() as f64;
        if positive > half {
            Self::Positive
        } else if negative > half {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Direction used by radical recommendations. Never `Neutral`.
    ///
    /// Non-neutral agents use their own side. A neutral agent leans
    /// `Positive` only when strictly more than half of its neighbors are
    /// positive; an even split or an empty neighborhood leans `Negative`.
    pub fn direction(opinion: f64, neighbor_opinions: &[f64]) -> Self {
        match Self::of_opinion(opinion) {
            Self::Neutral => {
                let positive = neighbor_opinions.iter().filter(|&&o| o > NEUTRAL).count();
                if positive * 2 > neighbor_opinions.len() {
                    Self::Positive
                } else {
                    Self::Negative
                }
            },
            side => side,
        }
    }

    /// Whether `opinion` lies strictly on this side of neutral.
    fn admits(self, opinion: f64) -> bool {
        match self {
            Self::Positive => opinion > NEUTRAL,
            Self::Negative => opinion < NEUTRAL,
            Self::Neutral => opinion == NEUTRAL,
        }
    }
}

/// Round an opinion to one decimal place.
///
/// Rounds the exact binary value, with exact halves going to the even digit:
/// `0.25` becomes `0.2` while `0.35` (stored just below the half) becomes
/// `0.3`.
pub fn round_opinion(opinion: f64) -> f64 {
    let scaled = opinion * 10.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        // The product may have rounded onto the half; its exact error decides.
        let error = opinion.mul_add(10.0, -scaled);
        if error > 0.0 {
            floor + 1.0
        } else if error < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / 10.0
}

/// Connection-making limits shared by every agent in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewiringRules {
    /// Uniform non-neighbor samples per activation
    pub num_neighbor_conn: usize,
    /// Recommender draws per activation
    pub num_recommended: usize,
    /// Restrict recommendations to the agent's opinion direction
    pub radical: bool,
}

/// An agent in the social network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    opinion: f64,
    tolerance: f64,
}

impl Agent {
    /// Create an agent.
    pub fn new(id: AgentId, opinion: f64, tolerance: f64) -> Self {
        Self {
            id,
            opinion,
            tolerance,
        }
    }

    /// Agent id
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current opinion in [0, 1]
    pub fn opinion(&self) -> f64 {
        self.opinion
    }

    /// Fixed tolerance in [0, 1]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether `other` is close enough to connect (`|diff| < tolerance`).
    pub fn is_similar(&self, other: f64) -> bool {
        (other - self.opinion).abs() < self.tolerance
    }

    /// Opinion after being pulled toward each neighbor opinion in order.
    ///
    /// Each step is `opinion += tolerance * (neighbor - opinion)`; the result
    /// is rounded to one decimal. With no neighbors the opinion is returned
    /// untouched.
    pub fn updated_opinion(&self, neighbor_opinions: impl IntoIterator<Item = f64>) -> f64 {
        let mut opinion = self.opinion;
        let mut influenced = false;
        for other in neighbor_opinions {
            opinion += self.tolerance * (other - opinion);
            influenced = true;
        }
        if influenced {
            round_opinion(opinion)
        } else {
            self.opinion
        }
    }

    /// Plan one activation.
    ///
    /// `population` is the read view of every agent's opinion, indexed by id;
    /// `neighbors` is this agent's adjacency in the same view. The agent's own
    /// entry in `population` is ignored in favor of its updated opinion.
    pub fn plan_step(
        &self,
        population: &[Agent],
        neighbors: Vec<AgentId>,
        rules: &RewiringRules,
        rng: &mut impl Rng,
    ) -> StepPlan {
        let opinion = self.updated_opinion(neighbors.iter().map(|n| population[n.0].opinion));
        let me = Agent {
            opinion,
            ..self.clone()
        };
        let opinion_of = |id: AgentId| {
            if id == me.id {
                me.opinion
            } else {
                population[id.0].opinion
            }
        };

        let (removed, mut current): (Vec<AgentId>, Vec<AgentId>) = neighbors
            .into_iter()
            .partition(|&n| (opinion_of(n) - me.opinion).abs() > me.tolerance);

        let mut added = Vec::new();

        let candidates = non_neighbors(population.len(), &current);
        for candidate in uniform_sample(&candidates, rules.num_neighbor_conn, rng) {
            if candidate != me.id && me.is_similar(opinion_of(candidate)) {
                added.push(candidate);
                current.push(candidate);
            }
        }

        let mut pool = non_neighbors(population.len(), &current);
        if rules.radical {
            let neighbor_opinions: Vec<f64> = current.iter().map(|&n| opinion_of(n)).collect();
            let direction = OpinionState::direction(me.opinion, &neighbor_opinions);
            pool.retain(|&c| direction.admits(opinion_of(c)));
        }
        let weights: Vec<f64> = pool
            .iter()
            .map(|&c| 1.0 / ((opinion_of(c) - me.opinion).abs() + 1.0))
            .collect();
        for index in weighted_sample(&weights, rules.num_recommended, rng) {
            let candidate = pool[index];
            if candidate != me.id && me.is_similar(opinion_of(candidate)) {
                added.push(candidate);
            }
        }

        StepPlan {
            agent: me.id,
            opinion: me.opinion,
            removed,
            added,
        }
    }
}

/// Every id in `0..population` not in `neighbors`, ascending. The agent
/// itself is included; pairing with itself is a graph no-op.
fn non_neighbors(population: usize, neighbors: &[AgentId]) -> Vec<AgentId> {
    let current: HashSet<AgentId> = neighbors.iter().copied().collect();
    (0..population)
        .map(AgentId)
        .filter(|id| !current.contains(id))
        .collect()
}

/// The outcome of one agent activation, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    /// Activated agent
    pub agent: AgentId,
    /// Opinion after the update
    pub opinion: f64,
    /// Neighbors to disconnect
    pub removed: Vec<AgentId>,
    /// Agents to connect
    pub added: Vec<AgentId>,
}

impl StepPlan {
    /// Write the new opinion into the population.
    pub fn commit_opinion(&self, population: &mut [Agent]) {
        population[self.agent.0].opinion = self.opinion;
    }

    /// Remove planned edges; returns how many existed.
    pub fn commit_removals(&self, graph: &mut SocialGraph) -> usize {
        self.removed
            .iter()
            .filter(|&&n| graph.remove_edge(self.agent, n))
            .count()
    }

    /// Add planned edges; returns how many were new.
    pub fn commit_additions(&self, graph: &mut SocialGraph) -> usize {
        self.added
            .iter()
            .filter(|&&n| graph.add_edge(self.agent, n))
            .count()
    }

    /// Apply the whole plan at once; returns `(removed, added)` edge counts.
    pub fn apply(&self, graph: &mut SocialGraph, population: &mut [Agent]) -> (usize, usize) {
        self.commit_opinion(population);
        let removed = self.commit_removals(graph);
        let added = self.commit_additions(graph);
        tracing::trace!(
            agent = self.agent.0,
            opinion = self.opinion,
            removed,
            added,
            "agent activated"
        );
        (removed, added)
    }
}
