//! # Echo Chamber - Opinion Dynamics on Adaptive Social Networks
//!
//! Agent-based simulation of echo chamber formation. Agents hold a continuous
//! opinion in [0, 1] and a tolerance; every step each agent is pulled toward
//! each of its neighbors in turn, drops links to those now too far away and
//! makes new links by sampling and through a recommender.
//!
//! ## Features
//!
//! - **Tolerance-weighted updates**: each neighbor pulls the opinion by `tolerance` of the gap
//! - **Adaptive rewiring**: connection breaking, neighbor sampling, recommender links
//! - **Radical mode**: recommendations restricted to the agent's own side
//! - **Three activation policies**: Sequential, Random, Simultaneous
//! - **Echo chamber metrics**: clusters, homophily, modularity, opinion clustering
//! - **Parameter sweeps**: Cartesian product runs with CSV / JSON export
//!
//! ## Model Overview
//!
//! ### One Agent Activation
//!
//! ```text
//!   [neighbors] ──> update opinion ──> break dissimilar links
//!                                            │
//!                                            v
//!                 recommender links <── neighbor sampling
//! ```
//!
//! ### One Step
//!
//! ```text
//!   Sequential / Random:  agent 1 (apply) -> agent 2 (apply) -> ... -> snapshot
//!   Simultaneous:         plan all -> opinions -> removals -> additions -> snapshot
//! ```
//!
//! ### Opinion States
//!
//! | State    | Opinion     | Color     |
//! |----------|-------------|-----------|
//! | Negative | `< 0.5`     | green     |
//! | Neutral  | `== 0.5`    | grey      |
//! | Positive | `> 0.5`     | red       |
//!
//! ## Quick Start
//!
//! ### Single Run
//!
//! ```rust
//! use echo_chamber::{EchoChamberModel, ModelParams};
//!
//! let params = ModelParams::default().with_agents(50).with_tolerance(0.2);
//! let mut model = EchoChamberModel::initialize(params).unwrap();
//! model.run(20);
//!
//! for snapshot in model.snapshots() {
//!     println!("{} clusters={} homophily={:.3}",
//!         snapshot.step, snapshot.num_clusters, snapshot.opinion_homophily);
//! }
//!
//! // Render the final network
//! let dot = model.graph_view().to_dot();
//! assert!(dot.starts_with("graph EchoChamber"));
//! ```
//!
//! ### Parameter Sweep
//!
//! ```rust
//! use echo_chamber::{BatchRunner, SweepConfig};
//!
//! let sweep = SweepConfig {
//!     num_agents: vec![10],
//!     tolerance: vec![0.2, 0.8],
//!     num_recommended: vec![1],
//!     iterations: 1,
//!     max_steps: 4,
//!     ..SweepConfig::default()
//! };
//! let report = BatchRunner::new(sweep).unwrap().run().unwrap();
//! println!("{}", report.to_csv_string().unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`agent`]: Agents, opinion states and the per-activation step plan
//! - [`graph`]: Undirected simple social graph (petgraph-based)
//! - [`scheduler`]: Activation policies and step execution
//! - [`metrics`]: Echo chamber metrics
//! - [`model`]: The simulation model
//! - [`batch`]: Parameter sweeps and result export
//! - [`view`]: Read-only graph rendering (JSON, DOT)
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod agent;
pub mod batch;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod sampling;
pub mod scheduler;
pub mod view;

// Re-exports for convenience
pub use agent::{Agent, AgentId, OpinionState, NEUTRAL};
pub use batch::{BatchReport, BatchRow, BatchRunner, RunSpec};
pub use config::{Config, ModelParams, SweepConfig};
pub use error::{EchoChamberError, Result};
pub use graph::SocialGraph;
pub use metrics::MetricsSnapshot;
pub use model::EchoChamberModel;
pub use scheduler::{ActivationPolicy, Scheduler, StepStats};
pub use view::{EdgeView, GraphView, NodeView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
