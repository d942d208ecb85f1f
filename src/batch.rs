//! Parameter sweeps.
//!
//! A [`BatchRunner`] expands a [`SweepConfig`] into independent runs, one per
//! parameter combination and iteration, steps each run to `max_steps`, and
//! flattens the snapshot series into [`BatchRow`]s: one row per run per
//! collected step.
//!
//! Runs are numbered in expansion order (axes in declaration order, the
//! iteration innermost) and run `i` is seeded with `base_seed + i`, so a
//! sweep is reproducible whether it executes sequentially or concurrently.
//! Runs share no state; [`BatchRunner::run_concurrent`] hands each one to
//! the tokio blocking pool and restores expansion order afterwards.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ModelParams, SweepConfig};
use crate::error::{EchoChamberError, Result};
use crate::metrics::MetricsSnapshot;
use crate::model::EchoChamberModel;
use crate::scheduler::ActivationPolicy;

/// One expanded run of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    /// Position in expansion order
    pub run_index: usize,
    /// Iteration within its parameter combination
    pub iteration: usize,
    /// Fully resolved, validated parameters
    pub params: ModelParams,
}

/// One results-table row: a run's parameters and one collected snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    /// Unique id of the run
    pub run_id: Uuid,
    /// Position in expansion order
    pub run_index: usize,
    /// Iteration within its parameter combination
    pub iteration: usize,
    /// Step of the snapshot
    pub step: u64,
    /// Population size
    pub num_agents: usize,
    /// Average degree
    pub avg_degree: f64,
    /// Shared tolerance
    pub tolerance: f64,
    /// Recommender draws per activation
    pub num_recommended: usize,
    /// Neighbor samples per activation
    pub num_neighbor_conn: usize,
    /// Radical mode
    pub radical: bool,
    /// Activation policy
    pub schedule: ActivationPolicy,
    /// Run seed
    pub seed: u64,
    /// Connected components
    pub num_clusters: usize,
    /// Average opinion clustering coefficient
    pub opinion_clustering_coefficient: f64,
    /// Opinion homophily
    pub opinion_homophily: f64,
    /// Opinion modularity
    pub opinion_modularity: f64,
    /// Radicalization (radical runs only)
    pub radicalization: Option<f64>,
}

impl BatchRow {
    fn new(run_id: Uuid, spec: &RunSpec, snapshot: &MetricsSnapshot) -> Self {
        let p = &spec.params;
        Self {
            run_id,
            run_index: spec.run_index,
            iteration: spec.iteration,
            step: snapshot.step,
            num_agents: p.num_agents,
            avg_degree: p.avg_degree,
            tolerance: p.tolerance,
            num_recommended: p.num_recommended,
            num_neighbor_conn: p.num_neighbor_conn,
            radical: p.radical,
            schedule: p.schedule,
            seed: p.seed,
            num_clusters: snapshot.num_clusters,
            opinion_clustering_coefficient: snapshot.opinion_clustering_coefficient,
            opinion_homophily: snapshot.opinion_homophily,
            opinion_modularity: snapshot.opinion_modularity,
            radicalization: snapshot.radicalization,
        }
    }
}

/// Results of a finished sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Sweep start
    pub started_at: DateTime<Utc>,
    /// Sweep end
    pub finished_at: DateTime<Utc>,
    /// Number of runs executed
    pub runs: usize,
    /// Collected rows, in run order then step order
    pub rows: Vec<BatchRow>,
}

impl BatchReport {
    /// The rows as CSV. The header row is taken from the [`BatchRow`] field
    /// names; an empty report gives an empty string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        self.serialize_rows(&mut wtr)?;
        let bytes = wtr
            .into_inner()
            .map_err(|e| EchoChamberError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            EchoChamberError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    /// Write the CSV table to `path`.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        self.serialize_rows(&mut wtr)?;
        wtr.flush()?;
        Ok(())
    }

    fn serialize_rows<W: std::io::Write>(&self, wtr: &mut csv::Writer<W>) -> Result<()> {
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        Ok(())
    }

    /// The whole report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Step one run to `max_steps` and keep the snapshots at multiples of
/// `period` plus the final one.
pub fn execute_run(spec: &RunSpec, max_steps: u64, period: u64) -> Result<Vec<BatchRow>> {
    let run_id = Uuid::new_v4();
    let mut model = EchoChamberModel::initialize(spec.params.clone())?;
    model.run(max_steps);

    let rows: Vec<BatchRow> = model
        .snapshots()
        .iter()
        .filter(|s| s.step % period == 0 || s.step == max_steps)
        .map(|s| BatchRow::new(run_id, spec, s))
        .collect();

    tracing::debug!(
        run = spec.run_index,
        seed = spec.params.seed,
        rows = rows.len(),
        "sweep run finished"
    );
    Ok(rows)
}

/// Expands and executes a parameter sweep.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: SweepConfig,
}

impl BatchRunner {
    /// Check the sweep's own settings and every expanded parameter set.
    pub fn new(config: SweepConfig) -> Result<Self> {
        if config.data_collection_period == 0 {
            return Err(EchoChamberError::invalid(
                "data_collection_period",
                "must be at least 1",
            ));
        }
        let axes = [
            ("num_agents", config.num_agents.is_empty()),
            ("avg_degree", config.avg_degree.is_empty()),
            ("tolerance", config.tolerance.is_empty()),
            ("num_recommended", config.num_recommended.is_empty()),
            ("num_neighbor_conn", config.num_neighbor_conn.is_empty()),
            ("radical", config.radical.is_empty()),
            ("schedule", config.schedule.is_empty()),
        ];
        if let Some(&(name, _)) = axes.iter().find(|(_, empty)| *empty) {
            return Err(EchoChamberError::invalid(name, "sweep axis has no values"));
        }

        let runner = Self { config };
        for spec in runner.runs() {
            spec.params.validate()?;
        }
        Ok(runner)
    }

    /// The sweep configuration
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// All runs in expansion order.
    pub fn runs(&self) -> Vec<RunSpec> {
        let c = &self.config;
        let mut combos = Vec::new();
        for &num_agents in &c.num_agents {
            for &avg_degree in &c.avg_degree {
                for &tolerance in &c.tolerance {
                    for &num_recommended in &c.num_recommended {
                        for &num_neighbor_conn in &c.num_neighbor_conn {
                            for &radical in &c.radical {
                                for &schedule in &c.schedule {
                                    combos.push(ModelParams {
                                        num_agents,
                                        avg_degree,
                                        tolerance,
                                        agent_tolerances: None,
                                        num_recommended,
                                        num_neighbor_conn,
                                        schedule,
                                        radical,
                                        seed: 0,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        combos
            .into_iter()
            .flat_map(|params| (0..c.iterations).map(move |iteration| (params.clone(), iteration)))
            .enumerate()
            .map(|(run_index, (params, iteration))| RunSpec {
                run_index,
                iteration,
                params: params.with_seed(c.base_seed.wrapping_add(run_index as u64)),
            })
            .collect()
    }

    /// Execute every run on the current thread.
    pub fn run(&self) -> Result<BatchReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let runs = self.runs();
        tracing::info!(runs = runs.len(), "starting sweep");

        let mut rows = Vec::new();
        for spec in &runs {
            rows.extend(execute_run(
                spec,
                self.config.max_steps,
                self.config.data_collection_period,
            )?);
        }

        tracing::info!(
            runs = runs.len(),
            rows = rows.len(),
            elapsed_ms = clock.elapsed().as_millis() as u64,
            "sweep complete"
        );
        Ok(BatchReport {
            started_at,
            finished_at: Utc::now(),
            runs: runs.len(),
            rows,
        })
    }

    /// Execute every run on the tokio blocking pool.
    pub async fn run_concurrent(&self) -> Result<BatchReport> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let runs = self.runs();
        let total = runs.len();
        tracing::info!(runs = total, "starting concurrent sweep");

        let max_steps = self.config.max_steps;
        let period = self.config.data_collection_period;
        let mut tasks = tokio::task::JoinSet::new();
        for spec in runs {
            tasks.spawn_blocking(move || {
                execute_run(&spec, max_steps, period).map(|rows| (spec.run_index, rows))
            });
        }

        let mut finished = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            finished.push(joined??);
        }
        finished.sort_by_key(|(index, _)| *index);
        let rows: Vec<BatchRow> = finished.into_iter().flat_map(|(_, rows)| rows).collect();

        tracing::info!(
            runs = total,
            rows = rows.len(),
            elapsed_ms = clock.elapsed().as_millis() as u64,
            "concurrent sweep complete"
        );
        Ok(BatchReport {
            started_at,
            finished_at: Utc::now(),
            runs: total,
            rows,
        })
    }
}
