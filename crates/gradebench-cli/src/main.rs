//! CLI for gradebench - a multi-benchmark evaluation harness for LLM
//! agents.

mod agent;

use agent::CommandAgent;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use gradebench_core::config::{load_config_with_overrides, CliOverrides, EvalConfig};
use gradebench_core::datasets::{get_dataset_loader, DatasetContext};
use gradebench_core::export::{write_json, write_report, write_submission};
use gradebench_core::harness::{Command as HarnessCommand, Harness};
use gradebench_core::reporter::{NullReporter, PrintReporter, ProgressReporter};
use gradebench_core::{benchmarks, EvalResult, GradebenchError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gradebench",
    about = "A multi-benchmark evaluation harness for LLM agents"
)]
struct Cli {
    /// Path to the evaluation configuration file.
    #[arg(short, long, default_value = "gradebench.yaml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and print the parsed configuration.
    ShowConfig,

    /// Run one benchmark against one agent.
    Run {
        /// Benchmark name from the config (defaults to the first one).
        #[arg(long, short = 'b')]
        benchmark: Option<String>,
        /// Agent name from the config (defaults to the first one).
        #[arg(long, short = 'a')]
        agent: Option<String>,
        /// Cap on the number of samples.
        #[arg(long)]
        limit: Option<usize>,
        /// Override per-sample timeout in seconds.
        #[arg(long)]
        timeout: Option<f64>,
        /// Override the output directory.
        #[arg(long)]
        output_dir: Option<String>,
        /// Print each sample's outcome.
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = PathBuf::from(&cli.config);

    let overrides = match &cli.command {
        Some(Command::Run {
            limit,
            timeout,
            output_dir,
            verbose,
            ..
        }) => CliOverrides {
            timeout_seconds: *timeout,
            max_samples: *limit,
            verbose: verbose.then_some(true),
            output_dir: output_dir.clone(),
        },
        _ => CliOverrides::default(),
    };

    let config = load_config_with_overrides(&config_path, overrides)?;

    match cli.command {
        Some(Command::ShowConfig) => {
            println!(
                "Loaded evaluation '{}': {} agent(s), {} benchmark(s).",
                config.name,
                config.agents.len(),
                config.benchmarks.len()
            );
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(Command::Run {
            benchmark, agent, ..
        }) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run(&config, &config_path, benchmark, agent))?;
        }
        None => {
            println!(
                "Loaded evaluation '{}': {} agent(s), {} benchmark(s).",
                config.name,
                config.agents.len(),
                config.benchmarks.len()
            );
            println!("\nUse --help to see available commands.");
        }
    }

    Ok(())
}

async fn run(
    config: &EvalConfig,
    config_path: &std::path::Path,
    benchmark_name: Option<String>,
    agent_name: Option<String>,
) -> Result<()> {
    let bench_config = match &benchmark_name {
        Some(name) => config
            .benchmark(name)
            .ok_or_else(|| anyhow!("no benchmark named '{name}' in config"))?,
        None => config
            .benchmarks
            .first()
            .ok_or_else(|| anyhow!("no benchmarks in config"))?,
    };
    let agent_config = match &agent_name {
        Some(name) => config
            .agent(name)
            .ok_or_else(|| anyhow!("no agent named '{name}' in config"))?,
        None => config
            .agents
            .first()
            .ok_or_else(|| anyhow!("no agents in config"))?,
    };

    let root_dir = config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let loader = get_dataset_loader(
        bench_config.clone(),
        DatasetContext {
            root_dir: root_dir.clone(),
        },
    );
    let samples = loader.load(config.config.max_samples)?;
    if samples.is_empty() {
        return Err(anyhow!("benchmark '{}' has no samples", bench_config.name));
    }

    let benchmark = benchmarks::get_benchmark(bench_config, &config.config);
    let agent = CommandAgent::new(agent_config.clone());

    let reporter: Arc<dyn ProgressReporter> = if config.config.verbose {
        Arc::new(PrintReporter)
    } else {
        Arc::new(NullReporter)
    };
    let mut harness = Harness::with_reporter(config.config.clone(), reporter);

    // Ctrl-C stops after the in-flight sample and keeps partial results.
    let cmd_tx = harness.command_sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cmd_tx.send(HarnessCommand::Stop {
                reason: "interrupted".to_string(),
            });
        }
    });

    let output_dir = root_dir.join(&config.output.directory);
    match harness.run(benchmark.as_ref(), &agent, &samples).await {
        Ok(result) => {
            export(&result, &output_dir)?;
            Ok(())
        }
        Err(GradebenchError::Cancelled { reason, partial }) => {
            println!("Run cancelled ({reason}); exporting partial results.");
            export(&partial, &output_dir)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn export(result: &EvalResult, output_dir: &std::path::Path) -> Result<()> {
    println!(
        "{}: {}/{} passed ({:.1}% accuracy)",
        result.benchmark_name,
        result.success_count,
        result.total_samples,
        result.overall_accuracy * 100.0
    );

    let stem = format!("{}_{}", result.benchmark_name, result.agent_name);
    let json_path = output_dir.join(format!("{stem}.json"));
    let report_path = output_dir.join(format!("{stem}.md"));
    let submission_path = output_dir.join(format!("{stem}_submission.jsonl"));

    write_json(result, &json_path)?;
    write_report(result, &report_path)?;
    write_submission(result, &submission_path)?;

    println!(
        "\nResults: {} | Report: {} | Submission: {}",
        json_path.display(),
        report_path.display(),
        submission_path.display()
    );
    Ok(())
}
