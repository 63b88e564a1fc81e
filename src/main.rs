//! trackerctl - query a work-item tracker from the command line
//!
//! Prints each tracker outcome as JSON on stdout. Logs go to stderr and are
//! controlled with `RUST_LOG`.

use std::process;

use clap::Parser;
use futures::future::join_all;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use trackerctl::cli::{Cli, Command};
use trackerctl::tracker::{RequestOutcome, TrackerClient, TrackerService};

/// Installs the stderr log subscriber, defaulting to warnings only
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one subcommand against the client
async fn run(service: &TrackerService, client: &TrackerClient, command: &Command) -> Value {
    match command {
        Command::Projects { page, page_size } => {
            outcome_json(client.list_projects(*page, *page_size).await)
        }
        Command::Items {
            tracker_id,
            max_items,
        } => outcome_json(client.tracker_items(*tracker_id, *max_items).await),
        Command::Item { ids } => {
            let outcomes = join_all(ids.iter().map(|id| client.item(*id))).await;
            Value::Array(outcomes.into_iter().map(outcome_json).collect())
        }
        Command::Query { max_results, .. } => {
            let filter = command.item_filter().unwrap_or_default();
            outcome_json(client.query_items(&filter, *max_results).await)
        }
        Command::Search { label } => match client.search_by_name(label).await {
            Ok(Some(item)) => item,
            Ok(None) => json!({ "label": label, "error": "No item found" }),
            Err(failed) => outcome_json(failed),
        },
        Command::Check => {
            serde_json::to_value(service.check_connection().await).unwrap_or(Value::Null)
        }
    }
}

fn outcome_json(outcome: RequestOutcome) -> Value {
    serde_json::to_value(outcome).unwrap_or(Value::Null)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();

    let config = match cli.service_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("trackerctl: {}", err);
            process::exit(2);
        }
    };

    let service = TrackerService::with_config(config)?;
    let Some(client) = service.current() else {
        return Err("tracker client was not configured".into());
    };

    let output = run(&service, &client, &cli.command).await;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if cli.stats {
        eprintln!("{}", client.stats());
    }

    Ok(())
}
