//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files (`[model]` and `[sweep]` tables)
//! - Environment variables (`ECHO_*`, model parameters only)
//! - CLI arguments (applied by the binary on top of both)
//!
//! Parameters are validated before a model is built; nothing is clamped.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::RewiringRules;
use crate::error::{EchoChamberError, Result};
use crate::scheduler::ActivationPolicy;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Single-run parameters
    #[serde(default)]
    pub model: ModelParams,

    /// Parameter sweep
    #[serde(default)]
    pub sweep: SweepConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            EchoChamberError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| EchoChamberError::Config(format!("Failed to parse config: {e}")))
    }

    /// Defaults overridden by `ECHO_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Override model parameters from `ECHO_*` environment variables
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|key| std::env::var(key).ok())
    }

    /// Override model parameters from any key lookup using the `ECHO_*` names.
    ///
    /// A present but unparsable value is a configuration error.
    pub fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn parse<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
            raw.trim()
                .parse()
                .map_err(|_| EchoChamberError::Config(format!("{key}: cannot parse {raw:?}")))
        }

        let model = &mut self.model;
        if let Some(v) = lookup("ECHO_NUM_AGENTS") {
            model.num_agents = parse("ECHO_NUM_AGENTS", &v)?;
        }
        if let Some(v) = lookup("ECHO_AVG_DEGREE") {
            model.avg_degree = parse("ECHO_AVG_DEGREE", &v)?;
        }
        if let Some(v) = lookup("ECHO_TOLERANCE") {
            model.tolerance = parse("ECHO_TOLERANCE", &v)?;
        }
        if let Some(v) = lookup("ECHO_NUM_RECOMMENDED") {
            model.num_recommended = parse("ECHO_NUM_RECOMMENDED", &v)?;
        }
        if let Some(v) = lookup("ECHO_NUM_NEIGHBOR_CONN") {
            model.num_neighbor_conn = parse("ECHO_NUM_NEIGHBOR_CONN", &v)?;
        }
        if let Some(v) = lookup("ECHO_SCHEDULE") {
            model.schedule = v.trim().parse()?;
        }
        if let Some(v) = lookup("ECHO_RADICAL") {
            model.radical = parse("ECHO_RADICAL", &v)?;
        }
        if let Some(v) = lookup("ECHO_SEED") {
            model.seed = parse("ECHO_SEED", &v)?;
        }

        Ok(self)
    }
}

/// Parameters of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Population size
    pub num_agents: usize,

    /// Target average degree of the initial random graph
    pub avg_degree: f64,

    /// Tolerance shared by every agent without an override
    pub tolerance: f64,

    /// Per-agent tolerances, indexed by agent id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_tolerances: Option<Vec<f64>>,

    /// Recommender draws per activation
    pub num_recommended: usize,

    /// Uniform non-neighbor samples per activation
    pub num_neighbor_conn: usize,

    /// Activation policy
    pub schedule: ActivationPolicy,

    /// Restrict recommendations to the agent's opinion direction
    pub radical: bool,

    /// Seed for every random draw of the run
    pub seed: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            num_agents: 20,
            avg_degree: 3.0,
            tolerance: 0.3,
            agent_tolerances: None,
            num_recommended: 5,
            num_neighbor_conn: 1,
            schedule: ActivationPolicy::Random,
            radical: false,
            seed: 42,
        }
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EchoChamberError::invalid(
            name,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

impl ModelParams {
    /// Set the population size
    pub fn with_agents(mut self, num_agents: usize) -> Self {
        self.num_agents = num_agents;
        self
    }

    /// Set the target average degree
    pub fn with_avg_degree(mut self, avg_degree: f64) -> Self {
        self.avg_degree = avg_degree;
        self
    }

    /// Set the shared tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set per-agent tolerances
    pub fn with_agent_tolerances(mut self, tolerances: Vec<f64>) -> Self {
        self.agent_tolerances = Some(tolerances);
        self
    }

    /// Set both connection-making counts
    pub fn with_connections(mut self, num_neighbor_conn: usize, num_recommended: usize) -> Self {
        self.num_neighbor_conn = num_neighbor_conn;
        self.num_recommended = num_recommended;
        self
    }

    /// Set the activation policy
    pub fn with_schedule(mut self, schedule: ActivationPolicy) -> Self {
        self.schedule = schedule;
        self
    }

    /// Toggle radical recommendations
    pub fn with_radical(mut self, radical: bool) -> Self {
        self.radical = radical;
        self
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject parameters outside their documented domain.
    pub fn validate(&self) -> Result<()> {
        if self.num_agents == 0 {
            return Err(EchoChamberError::invalid(
                "num_agents",
                "population must hold at least one agent",
            ));
        }
        if !self.avg_degree.is_finite() || self.avg_degree < 0.0 {
            return Err(EchoChamberError::invalid(
                "avg_degree",
                format!("must be a non-negative number, got {}", self.avg_degree),
            ));
        }
        if self.avg_degree >= self.num_agents as f64 {
            return Err(EchoChamberError::invalid(
                "avg_degree",
                format!(
                    "must be below the population size {}, got {}",
                    self.num_agents, self.avg_degree
                ),
            ));
        }
        check_tolerance("tolerance", self.tolerance)?;
        if let Some(tolerances) = &self.agent_tolerances {
            if tolerances.len() != self.num_agents {
                return Err(EchoChamberError::invalid(
                    "agent_tolerances",
                    format!(
                        "expected {} entries, got {}",
                        self.num_agents,
                        tolerances.len()
                    ),
                ));
            }
            for &t in tolerances {
                check_tolerance("agent_tolerances", t)?;
            }
        }
        if self.num_recommended > self.num_agents {
            return Err(EchoChamberError::invalid(
                "num_recommended",
                format!(
                    "cannot exceed the population size {}, got {}",
                    self.num_agents, self.num_recommended
                ),
            ));
        }
        if self.num_neighbor_conn > self.num_agents {
            return Err(EchoChamberError::invalid(
                "num_neighbor_conn",
                format!(
                    "cannot exceed the population size {}, got {}",
                    self.num_agents, self.num_neighbor_conn
                ),
            ));
        }
        Ok(())
    }

    /// Tolerance of agent `index`
    pub fn tolerance_of(&self, index: usize) -> f64 {
        self.agent_tolerances
            .as_ref()
            .and_then(|t| t.get(index).copied())
            .unwrap_or(self.tolerance)
    }

    /// Connection-making rules for the run
    pub fn rules(&self) -> RewiringRules {
        RewiringRules {
            num_neighbor_conn: self.num_neighbor_conn,
            num_recommended: self.num_recommended,
            radical: self.radical,
        }
    }
}

/// Parameter sweep configuration.
///
/// Every list is one axis of the Cartesian product; each combination is run
/// `iterations` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Population sizes
    pub num_agents: Vec<usize>,
    /// Average degrees
    pub avg_degree: Vec<f64>,
    /// Shared tolerances
    pub tolerance: Vec<f64>,
    /// Recommender draw counts
    pub num_recommended: Vec<usize>,
    /// Neighbor sample counts
    pub num_neighbor_conn: Vec<usize>,
    /// Radical mode settings
    pub radical: Vec<bool>,
    /// Activation policies
    pub schedule: Vec<ActivationPolicy>,
    /// Runs per combination
    pub iterations: usize,
    /// Steps per run
    pub max_steps: u64,
    /// Keep every n-th step in the results table
    pub data_collection_period: u64,
    /// Seed of run 0; run `i` uses `base_seed + i`
    pub base_seed: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            num_agents: vec![50, 150],
            avg_degree: vec![2.0],
            tolerance: vec![0.1, 0.3, 0.5, 0.7, 0.9],
            num_recommended: vec![0, 1, 7],
            num_neighbor_conn: vec![1, 5],
            radical: vec![true, false],
            schedule: vec![ActivationPolicy::Sequential],
            iterations: 10,
            max_steps: 20,
            data_collection_period: 2,
            base_seed: 0,
        }
    }
}
