//! evalboard - multi-run robustness statistics for LLM evaluation runs
//!
//! The `evalboard` command reads a filesystem Run Store snapshot
//! (`<store>/runs/*.json`) and reports how reliably a model passes each item
//! across K repeated runs.
//!
//! ## Commands
//!
//! - `groups`: List (task, dataset, model) run groups
//! - `aggregate`: Pass@K, Pass^K, Max@K and friends for one group
//! - `compare`: Markdown comparison of every model on a task and dataset

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use evalboard_core::{
    init_tracing, render_comparison_md, write_report_json, AggregationReport, EvalboardConfig,
    FsRunStore, GroupAggregation, RobustnessService, RunGroupKey, RunSelection, METRICS,
};

#[derive(Parser)]
#[command(name = "evalboard")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-run robustness statistics for LLM evaluations", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run Store snapshot root (overrides `store_root` from the config file)
    #[arg(long, global = true, env = "EVALBOARD_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List run groups in the store
    Groups,

    /// Aggregate one metric over the runs of one group
    Aggregate {
        #[arg(long)]
        task: String,

        #[arg(long)]
        dataset: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        metric: String,

        /// Pass threshold in [0, 1] (ignored for boolean metrics)
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of most recent runs to use
        #[arg(short)]
        k: Option<usize>,

        /// Explicit run ids, comma separated (overrides -k)
        #[arg(long, value_delimiter = ',')]
        runs: Vec<String>,

        /// Skip the correct-count distribution
        #[arg(long)]
        no_distribution: bool,

        /// Write the report artifact (JSON plus digest sidecar) here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Compare every model evaluated on a task and dataset
    Compare {
        #[arg(long)]
        task: String,

        #[arg(long)]
        dataset: String,

        #[arg(long)]
        metric: String,

        #[arg(long)]
        threshold: Option<f64>,

        /// Number of most recent runs per model
        #[arg(short)]
        k: Option<usize>,

        /// Write the markdown table here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let mut config = EvalboardConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load evalboard configuration")?;
    if let Some(store) = cli.store {
        config.store_root = store;
    }

    let outcome = match cli.command {
        Commands::Groups => cmd_groups(&service(config)).await,
        Commands::Aggregate {
            task,
            dataset,
            model,
            metric,
            threshold,
            k,
            runs,
            no_distribution,
            out,
        } => {
            if no_distribution {
                config.track_distribution = false;
            }
            let selection = if runs.is_empty() {
                RunSelection::MostRecent(k.unwrap_or(config.default_k))
            } else {
                RunSelection::Explicit(runs)
            };
            let key = RunGroupKey::new(task, dataset, model);
            cmd_aggregate(
                &service(config),
                &key,
                &metric,
                threshold,
                &selection,
                out.as_deref(),
            )
            .await
        }
        Commands::Compare {
            task,
            dataset,
            metric,
            threshold,
            k,
            out,
        } => {
            cmd_compare(
                &service(config),
                &task,
                &dataset,
                &metric,
                threshold,
                k,
                out.as_deref(),
            )
            .await
        }
    };

    METRICS.flush();
    outcome
}

fn service(config: EvalboardConfig) -> RobustnessService<FsRunStore> {
    info!(store = %config.store_root.display(), "opening run store");
    RobustnessService::new(FsRunStore::new(&config.store_root), config)
}

async fn cmd_groups(service: &RobustnessService<FsRunStore>) -> Result<()> {
    let groups = service.groups().await.context("Failed to list run groups")?;

    if groups.is_empty() {
        println!(
            "No runs found under {:?}",
            service.config().store_root.join("runs")
        );
        return Ok(());
    }

    for group in groups {
        println!(
            "{}  runs={}  latest={}  metrics={}",
            group.key,
            group.run_count,
            group.latest_timestamp.to_rfc3339(),
            group.metric_names.join(",")
        );
    }
    Ok(())
}

async fn cmd_aggregate(
    service: &RobustnessService<FsRunStore>,
    key: &RunGroupKey,
    metric: &str,
    threshold: Option<f64>,
    selection: &RunSelection,
    out: Option<&Path>,
) -> Result<()> {
    let aggregation = service
        .aggregate_group(key, metric, threshold, selection)
        .await
        .with_context(|| format!("Failed to aggregate {} on {}", metric, key))?;

    match out {
        Some(path) => {
            let report = AggregationReport::new(vec![aggregation]);
            write_report_json(path, &report)?;
            println!("Wrote report to {:?}", path);
        }
        None => print_summary(&aggregation),
    }
    Ok(())
}

fn print_summary(aggregation: &GroupAggregation) {
    let r = &aggregation.result;
    println!("{}  {}", aggregation.key, aggregation.metric);
    println!("  runs         {} ({})", r.k, aggregation.run_ids.join(", "));
    if r.boolean_metric {
        println!(
            "  threshold    {} (boolean metric, requested {})",
            r.effective_threshold, aggregation.requested_threshold
        );
    } else {
        println!("  threshold    {}", r.effective_threshold);
    }
    println!(
        "  items        {} ({} seen in 2+ runs)",
        r.total_items, r.items_with_multiple_runs
    );
    println!("  pass@k       {:.1}%", r.pass_at_k * 100.0);
    println!("  pass^k       {:.1}%", r.pass_hat_k * 100.0);
    println!("  max@k        {:.1}%", r.max_at_k * 100.0);
    println!("  consistency  {:.1}%", r.consistency * 100.0);
    println!("  reliability  {:.1}%", r.reliability * 100.0);
    println!("  avg score    {:.3}", r.avg_score);
    println!("  avg latency  {:.1} ms", r.avg_latency);
    if let Some(distribution) = &r.distribution {
        let slots = distribution
            .iter()
            .enumerate()
            .map(|(passes, items)| format!("{}/{}: {}", passes, r.k, items))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  distribution {}", slots);
    }
}

async fn cmd_compare(
    service: &RobustnessService<FsRunStore>,
    task: &str,
    dataset: &str,
    metric: &str,
    threshold: Option<f64>,
    k: Option<usize>,
    out: Option<&Path>,
) -> Result<()> {
    let rows = service
        .compare_models(task, dataset, metric, threshold, k)
        .await
        .with_context(|| format!("Failed to compare models on {}/{}", task, dataset))?;

    let markdown = render_comparison_md(&format!("{}/{}: {}", task, dataset, metric), &rows);
    match out {
        Some(path) => {
            std::fs::write(path, &markdown).with_context(|| format!("write {:?}", path))?;
            println!("Wrote comparison for {} models to {:?}", rows.len(), path);
        }
        None => print!("{}", markdown),
    }
    Ok(())
}
