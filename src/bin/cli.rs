//! permhound CLI - filesystem permission graph builder.
//!
//! Usage:
//!   permhound --path /usr --stdout          # Graph JSON on stdout
//!   permhound --path /etc -o etc            # Graph JSON in etc.json
//!   permhound --base-collection --stdout    # Users, groups, raw entries
//!   permhound --human --path /opt           # One line per entry
//!   find / -perm -4000 | permhound --stdin  # Inspect listed paths only
//!   permhound --path /usr --summary         # Plus escalation paths on stderr

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use permhound::cli::{Cli, OutputMode};
use permhound::graph::{AccessGraph, GraphEnvelope};
use permhound::output::{write_json, Destination};
use permhound::pipeline::{Identities, Pipeline};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.scan_config().context("loading configuration")?;
    let identities = Identities::load(&config)?;

    let pipeline = Pipeline::new(cli.source(), cli.inspector(&config))
        .capacity(config.channel_capacity);
    let destination = Destination::new(cli.stdout, &cli.output, "json");

    match cli.mode() {
        OutputMode::Human => {
            let stats = pipeline.human(std::io::stdout())?;
            info!(%stats, "listing finished");
            return Ok(());
        }
        OutputMode::Collection => {
            let (collection, stats) = pipeline.collection(identities)?;
            info!(%stats, "collection finished");
            write_json(&collection, destination.open()?)?;
        }
        OutputMode::Graph => {
            let (graph, stats) = pipeline.graph(&identities)?;
            info!(%stats, "graph finished");

            let envelope = GraphEnvelope { graph };
            write_json(&envelope, destination.open()?)?;
            if cli.summary {
                print_summary(&AccessGraph::from_graph(&envelope.graph));
            }
        }
    }

    if !destination.is_stdout() {
        println!("Graph created and output!");
    }
    Ok(())
}

fn print_summary(access: &AccessGraph) {
    eprintln!("permhound - Graph Summary");
    eprintln!("═════════════════════════");
    eprintln!("{}", access.stats());

    let paths = access.escalation_paths();
    eprintln!();
    if paths.is_empty() {
        eprintln!("No escalation paths.");
        return;
    }
    eprintln!("Escalation paths ({}):", paths.len());
    for path in paths {
        eprintln!("  {}", path);
    }
}
