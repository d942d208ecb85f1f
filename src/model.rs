//! The simulation model.
//!
//! [`EchoChamberModel`] owns the graph, the population (indexed by
//! [`AgentId`]), the scheduler, the run's single seeded generator and the
//! snapshot series. A snapshot for step 0 is recorded at initialization and
//! one more after every [`EchoChamberModel::step`].
//!
//! # Example
//!
//! ```rust
//! use echo_chamber::{ActivationPolicy, EchoChamberModel, ModelParams};
//!
//! let params = ModelParams::default()
//!     .with_agents(30)
//!     .with_schedule(ActivationPolicy::Simultaneous)
//!     .with_seed(7);
//! let mut model = EchoChamberModel::initialize(params).unwrap();
//! model.run(10);
//!
//! assert_eq!(model.snapshots().len(), 11);
//! assert!(model.graph().is_simple());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::{Agent, AgentId};
use crate::config::ModelParams;
use crate::error::{EchoChamberError, Result};
use crate::graph::SocialGraph;
use crate::metrics::MetricsSnapshot;
use crate::scheduler::Scheduler;
use crate::view::GraphView;

/// One echo chamber simulation run.
#[derive(Debug, Clone)]
pub struct EchoChamberModel {
    params: ModelParams,
    graph: SocialGraph,
    agents: Vec<Agent>,
    scheduler: Scheduler,
    rng: StdRng,
    steps: u64,
    snapshots: Vec<MetricsSnapshot>,
}

impl EchoChamberModel {
    /// Validate `params`, build the random graph and the population, and
    /// record the step-0 snapshot.
    ///
    /// Topology is drawn first, then one uniform opinion per agent in id
    /// order, all from the generator seeded with `params.seed`.
    pub fn initialize(params: ModelParams) -> Result<Self> {
        params.validate()?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let graph = SocialGraph::erdos_renyi(params.num_agents, params.avg_degree, &mut rng);
        let agents: Vec<Agent> = (0..params.num_agents)
            .map(|i| Agent::new(AgentId(i), rng.gen::<f64>(), params.tolerance_of(i)))
            .collect();

        tracing::info!(
            agents = params.num_agents,
            edges = graph.edge_count(),
            schedule = %params.schedule,
            radical = params.radical,
            seed = params.seed,
            "echo chamber model initialized"
        );

        Ok(Self::assemble(params, graph, agents, rng))
    }

    /// Build a model from an explicit graph and population.
    ///
    /// `agents[i]` must carry id `i`, every opinion and tolerance must lie in
    /// [0, 1], and the graph must have exactly one node per agent. The
    /// scheduler's generator is still seeded from `params.seed`.
    pub fn from_parts(params: ModelParams, graph: SocialGraph, agents: Vec<Agent>) -> Result<Self> {
        params.validate()?;
        if agents.len() != params.num_agents || graph.node_count() != agents.len() {
            return Err(EchoChamberError::invalid(
                "num_agents",
                format!(
                    "parameters say {}, population has {}, graph has {} nodes",
                    params.num_agents,
                    agents.len(),
                    graph.node_count()
                ),
            ));
        }
        for (index, agent) in agents.iter().enumerate() {
            if agent.id() != AgentId(index) {
                return Err(EchoChamberError::invalid(
                    "agents",
                    format!("{} stored at index {index}", agent.id()),
                ));
            }
            if !(0.0..=1.0).contains(&agent.opinion()) {
                return Err(EchoChamberError::invalid(
                    "opinion",
                    format!("{} has opinion {}", agent.id(), agent.opinion()),
                ));
            }
            if !(0.0..=1.0).contains(&agent.tolerance()) {
                return Err(EchoChamberError::invalid(
                    "tolerance",
                    format!("{} has tolerance {}", agent.id(), agent.tolerance()),
                ));
            }
        }

        let rng = StdRng::seed_from_u64(params.seed);
        Ok(Self::assemble(params, graph, agents, rng))
    }

    fn assemble(params: ModelParams, graph: SocialGraph, agents: Vec<Agent>, rng: StdRng) -> Self {
        let mut model = Self {
            scheduler: Scheduler::new(params.schedule),
            params,
            graph,
            agents,
            rng,
            steps: 0,
            snapshots: Vec::new(),
        };
        let initial = model.metrics();
        model.snapshots.push(initial);
        model
    }

    /// Advance one step: activate every agent, then record a snapshot.
    pub fn step(&mut self) -> &MetricsSnapshot {
        let rules = self.params.rules();
        let stats = self
            .scheduler
            .step(&mut self.graph, &mut self.agents, &rules, &mut self.rng);
        self.steps += 1;

        let snapshot = self.metrics();
        tracing::debug!(
            step = self.steps,
            edges = self.graph.edge_count(),
            removed = stats.edges_removed,
            added = stats.edges_added,
            clusters = snapshot.num_clusters,
            homophily = snapshot.opinion_homophily,
            "step complete"
        );

        let index = self.snapshots.len();
        self.snapshots.push(snapshot);
        &self.snapshots[index]
    }

    /// Advance `steps` steps.
    pub fn run(&mut self, steps: u64) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Metrics of the current state, without recording them.
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot::capture(self.steps, &self.graph, &self.agents, self.params.radical)
    }

    /// Recorded snapshots, oldest first.
    pub fn snapshots(&self) -> &[MetricsSnapshot] {
        &self.snapshots
    }

    /// Render the current graph and opinions.
    pub fn graph_view(&self) -> GraphView {
        GraphView::capture(&self.graph, &self.agents)
    }

    /// Steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run parameters
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    /// The social graph
    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    /// The population, indexed by agent id
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }
}
