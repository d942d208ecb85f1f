//! Activation scheduling.
//!
//! | Policy         | Order               | Visibility within a step            |
//! |----------------|---------------------|-------------------------------------|
//! | `Sequential`   | ids ascending       | later agents see earlier mutations  |
//! | `Random`       | fresh shuffle/step  | later agents see earlier mutations  |
//! | `Simultaneous` | ids ascending       | all agents read the pre-step state  |
//!
//! Simultaneous steps plan every agent against a frozen copy of the
//! population and the unmodified graph, then commit in three phases: all
//! opinions, all removals, all additions. A removal only ever targets a
//! pre-step edge and an addition only a pair that was unconnected (or
//! dropped by the same agent, which its similarity filter then rejects), so
//! the committed result does not depend on plan order.

use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, RewiringRules, StepPlan};
use crate::error::{EchoChamberError, Result};
use crate::graph::SocialGraph;

/// Agent activation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationPolicy {
    /// Fixed id order every step
    Sequential,
    /// Freshly shuffled order every step
    #[default]
    Random,
    /// Every agent reads the same pre-step state
    Simultaneous,
}

impl ActivationPolicy {
    /// All policies, in display order.
    pub const ALL: [ActivationPolicy; 3] = [Self::Sequential, Self::Random, Self::Simultaneous];

    /// Policy name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::Random => "Random",
            Self::Simultaneous => "Simultaneous",
        }
    }

    /// Activation order for one step over `n` agents.
    pub fn activation_order(&self, n: usize, rng: &mut impl Rng) -> Vec<AgentId> {
        let mut order: Vec<AgentId> = (0..n).map(AgentId).collect();
        if *self == Self::Random {
            order.shuffle(rng);
        }
        order
    }
}

impl std::fmt::Display for ActivationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivationPolicy {
    type Err = EchoChamberError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            "simultaneous" => Ok(Self::Simultaneous),
            _ => Err(EchoChamberError::UnknownSchedule(s.to_string())),
        }
    }
}

/// Edge churn produced by one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Agents activated
    pub activated: usize,
    /// Edges removed
    pub edges_removed: usize,
    /// Edges added
    pub edges_added: usize,
}

/// Runs one step of agent activations under a policy.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    policy: ActivationPolicy,
}

impl Scheduler {
    /// Create a scheduler for `policy`.
    pub fn new(policy: ActivationPolicy) -> Self {
        Self { policy }
    }

    /// The activation policy
    pub fn policy(&self) -> ActivationPolicy {
        self.policy
    }

    /// Activate every agent exactly once.
    pub fn step(
        &self,
        graph: &mut SocialGraph,
        agents: &mut [Agent],
        rules: &RewiringRules,
        rng: &mut impl Rng,
    ) -> StepStats {
        let order = self.policy.activation_order(agents.len(), rng);
        match self.policy {
            ActivationPolicy::Sequential | ActivationPolicy::Random => {
                Self::step_in_place(&order, graph, agents, rules, rng)
            },
            ActivationPolicy::Simultaneous => Self::step_staged(&order, graph, agents, rules, rng),
        }
    }

    fn step_in_place(
        order: &[AgentId],
        graph: &mut SocialGraph,
        agents: &mut [Agent],
        rules: &RewiringRules,
        rng: &mut impl Rng,
    ) -> StepStats {
        let mut stats = StepStats::default();
        for &id in order {
            let plan = agents[id.0].plan_step(agents, graph.neighbors(id), rules, rng);
            let (removed, added) = plan.apply(graph, agents);
            stats.activated += 1;
            stats.edges_removed += removed;
            stats.edges_added += added;
        }
        stats
    }

    fn step_staged(
        order: &[AgentId],
        graph: &mut SocialGraph,
        agents: &mut [Agent],
        rules: &RewiringRules,
        rng: &mut impl Rng,
    ) -> StepStats {
        let frozen = agents.to_vec();
        let plans: Vec<StepPlan> = order
            .iter()
            .map(|&id| frozen[id.0].plan_step(&frozen, graph.neighbors(id), rules, rng))
            .collect();

        for plan in &plans {
            plan.commit_opinion(agents);
        }
        let edges_removed = plans.iter().map(|p| p.commit_removals(graph)).sum();
        let edges_added = plans.iter().map(|p| p.commit_additions(graph)).sum();

        StepStats {
            activated: plans.len(),
            edges_removed,
            edges_added,
        }
    }
}
