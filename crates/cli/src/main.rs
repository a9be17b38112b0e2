mod backend;
mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use evharness_report::ReportProducer;
use evharness_seeder::Seeder;
use evharness_verifier::{RunStatusView, Verifier};
use tracing::info;

use crate::backend::Backends;
use crate::config::HarnessConfig;

/// Command-line driver for the integration-test harness: plays the role of
/// the external scheduler the core state machine assumes (seed, poll
/// status, verify, report), exposing each verb individually as well as a
/// convenience `run-all` that drives a run start to finish.
#[derive(Parser, Debug)]
#[command(name = "evharness", about = "Event-driven integration-test harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Use in-process backends instead of AWS. Skips all `EVHARNESS_*`
    /// environment variable requirements.
    #[arg(long, global = true)]
    local: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new run: publish a scenario's events and write its RunMeta.
    Seed {
        /// Service name to seed (case-insensitive). Defaults to `"all"`.
        service: Option<String>,
    },
    /// Poll a run's readiness.
    Status {
        run_id: String,
    },
    /// Reconcile observed events against expectations and render a verdict.
    Verify {
        run_id: String,
    },
    /// Render and archive a run's HTML report.
    Report {
        run_id: String,
    },
    /// Enable or disable the bus rule that routes traffic to the Collector.
    Rule {
        #[command(subcommand)]
        action: RuleAction,
    },
    /// Seed a run, poll until ready or timed out, verify, then report.
    RunAll {
        service: Option<String>,
        /// Seconds between status polls.
        #[arg(long, default_value_t = 2)]
        poll_interval_secs: u64,
    },
}

#[derive(Subcommand, Debug)]
enum RuleAction {
    Enable,
    Disable,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let backends = if cli.local {
        info!("running with in-process backends (--local)");
        backend::local_backends()
    } else {
        let config = HarnessConfig::from_env()?;
        backend::aws_backends(&config).await?
    };

    match cli.command {
        Command::Seed { service } => {
            let seeder = Seeder::new(backends.store, backends.archive, backends.bus);
            let result = seeder.seed(service.as_deref()).await?;
            print_json(&result)?;
        }
        Command::Status { run_id } => {
            let verifier = Verifier::new(backends.store, backends.archive);
            let result = verifier.status(&run_id).await?;
            print_json(&result)?;
        }
        Command::Verify { run_id } => {
            let verifier = Verifier::new(backends.store, backends.archive);
            let result = verifier.verify(&run_id).await?;
            print_json(&result)?;
        }
        Command::Report { run_id } => {
            let producer = ReportProducer::new(backends.store, backends.archive);
            let result = producer.generate(&run_id, None).await?;
            print_json(&result)?;
        }
        Command::Rule { action } => {
            let enabled = matches!(action, RuleAction::Enable);
            let result = backends.rule_controller.set_enabled(enabled).await?;
            print_json(&result)?;
        }
        Command::RunAll {
            service,
            poll_interval_secs,
        } => {
            run_all(backends, service.as_deref(), Duration::from_secs(poll_interval_secs)).await?;
        }
    }

    Ok(())
}

/// Drives seed -> status-poll-until-terminal -> verify -> report, printing
/// each stage's result as it completes.
async fn run_all(backends: Backends, service: Option<&str>, poll_interval: Duration) -> anyhow::Result<()> {
    let Backends {
        store,
        archive,
        bus,
        rule_controller: _,
    } = backends;

    let seeder = Seeder::new(Arc::clone(&store), Arc::clone(&archive), bus);
    let seed_result = seeder.seed(service).await?;
    print_json(&seed_result)?;

    let verifier = Verifier::new(Arc::clone(&store), Arc::clone(&archive));
    loop {
        let status = verifier.status(&seed_result.run_id).await?;
        info!(run_id = %seed_result.run_id, status = %status.status, "polled status");
        if matches!(status.status, RunStatusView::Ready | RunStatusView::Timeout) {
            print_json(&status)?;
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    let verify_result = verifier.verify(&seed_result.run_id).await?;
    print_json(&verify_result)?;

    let producer = ReportProducer::new(store, archive);
    let report = producer.generate(&seed_result.run_id, Some(&verify_result)).await?;
    print_json(&report)?;

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
