//! Echo chamber simulation CLI.
//!
//! # Commands
//!
//! - `run` - Run one simulation and print its metrics series
//! - `sweep` - Run a parameter sweep and write the results table as CSV
//!
//! Parameters are layered: defaults, then the TOML config file, then `ECHO_*`
//! environment variables, then command-line flags.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use echo_chamber::{
    ActivationPolicy, BatchRunner, Config, EchoChamberModel, MetricsSnapshot, ModelParams,
    VERSION,
};

#[derive(Parser)]
#[command(name = "echo-chamber")]
#[command(version = VERSION)]
#[command(about = "Echo chamber formation on adaptive social networks", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation
    Run {
        /// TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of agents
        #[arg(long)]
        agents: Option<usize>,

        /// Average degree of the initial graph
        #[arg(long)]
        avg_degree: Option<f64>,

        /// Tolerance shared by all agents (0.0 - 1.0)
        #[arg(long)]
        tolerance: Option<f64>,

        /// Recommender draws per activation
        #[arg(long)]
        recommended: Option<usize>,

        /// Neighbor samples per activation
        #[arg(long)]
        neighbor_conn: Option<usize>,

        /// Activation policy (sequential, random, simultaneous)
        #[arg(long)]
        schedule: Option<ActivationPolicy>,

        /// Restrict recommendations to the agent's own side
        #[arg(long)]
        radical: bool,

        /// Seed for the run
        #[arg(long)]
        seed: Option<u64>,

        /// Steps to simulate
        #[arg(short, long, default_value = "20")]
        steps: u64,

        /// Print snapshots as JSON
        #[arg(long)]
        json: bool,

        /// Write the final network as Graphviz DOT
        #[arg(long)]
        export_graph: Option<PathBuf>,
    },

    /// Run a parameter sweep
    Sweep {
        /// TOML config file with a [sweep] table
        #[arg(short, long)]
        config: PathBuf,

        /// CSV output path
        #[arg(short, long, default_value = "echo_chamber_results.csv")]
        output: PathBuf,

        /// Run independent runs on a thread pool
        #[arg(long)]
        concurrent: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            agents,
            avg_degree,
            tolerance,
            recommended,
            neighbor_conn,
            schedule,
            radical,
            seed,
            steps,
            json,
            export_graph,
        } => {
            let mut params = load_config(config)?.model;
            if let Some(n) = agents {
                params.num_agents = n;
            }
            if let Some(d) = avg_degree {
                params.avg_degree = d;
            }
            if let Some(t) = tolerance {
                params.tolerance = t;
            }
            if let Some(k) = recommended {
                params.num_recommended = k;
            }
            if let Some(k) = neighbor_conn {
                params.num_neighbor_conn = k;
            }
            if let Some(s) = schedule {
                params.schedule = s;
            }
            if radical {
                params.radical = true;
            }
            if let Some(s) = seed {
                params.seed = s;
            }
            cmd_run(params, steps, json, export_graph)
        },
        Commands::Sweep {
            config,
            output,
            concurrent,
        } => cmd_sweep(config, output, concurrent),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?.with_env()?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn cmd_run(
    params: ModelParams,
    steps: u64,
    json: bool,
    export_graph: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut model = EchoChamberModel::initialize(params)?;
    model.run(steps);

    if json {
        println!("{}", serde_json::to_string_pretty(model.snapshots())?);
    } else {
        print_table(model.snapshots());
    }

    if let Some(path) = export_graph {
        std::fs::write(&path, model.graph_view().to_dot())?;
        tracing::info!("Graph written to {}", path.display());
    }

    Ok(())
}

fn print_table(snapshots: &[MetricsSnapshot]) {
    println!(
        "{:>5}  {:>8}  {:>10}  {:>10}  {:>10}  {:>14}",
        "step", "clusters", "clustering", "homophily", "modularity", "radicalization"
    );
    for s in snapshots {
        let radicalization = s
            .radicalization
            .map_or_else(|| "-".to_string(), |r| format!("{r:.4}"));
        println!(
            "{:>5}  {:>8}  {:>10.4}  {:>10.4}  {:>10.4}  {:>14}",
            s.step,
            s.num_clusters,
            s.opinion_clustering_coefficient,
            s.opinion_homophily,
            s.opinion_modularity,
            radicalization
        );
    }
}

fn cmd_sweep(config: PathBuf, output: PathBuf, concurrent: bool) -> anyhow::Result<()> {
    let config = Config::from_file(config)?;
    let runner = BatchRunner::new(config.sweep)?;

    let report = if concurrent {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(runner.run_concurrent())?
    } else {
        runner.run()?
    };

    report.write_csv(&output)?;
    println!("Sweep finished:");
    println!("  Runs:     {}", report.runs);
    println!("  Rows:     {}", report.rows.len());
    println!("  Started:  {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!("  Output:   {}", output.display());

    Ok(())
}
