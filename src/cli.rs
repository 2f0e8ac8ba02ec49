use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;

use testboard::auth::FeedToken;
use testboard::events::OutboundEvent;
use testboard::report::ReportSettings;
use testboard::store::{run_event_loop, ReportStore};
use testboard::transport::{forward_events, EventSource, Subscription};
use testboard::window::DEFAULT_WINDOW_DAYS;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Parser)]
#[command(name = "testboard")]
#[command(author, version, about = "CI test results dashboard aggregator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an event stream and print the settled dashboard snapshot
    Replay {
        /// Event source: a file path, "-" for stdin, or an http(s) URL
        #[arg(short, long, env = "TESTBOARD_INPUT", default_value = "-")]
        input: String,

        /// Bearer token for HTTP event sources
        #[arg(short, long, env = "TESTBOARD_TOKEN")]
        token: Option<String>,

        /// Days of history kept behind each item's latest run
        #[arg(long, env = "TESTBOARD_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
        window_days: u32,

        /// Reference time for stability labels (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Print an outbound request for the collector
    Request {
        #[command(subcommand)]
        request: RequestCommand,
    },
}

#[derive(Subcommand)]
enum RequestCommand {
    /// Ask for the current snapshot
    Get,
    /// Start monitoring a pipeline
    Add { pipeline: String },
    /// Stop monitoring a report
    Remove { id: String },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Replay {
                input,
                token,
                window_days,
                now,
            } => {
                let source = EventSource::parse(input)?;
                let token = token.as_deref().and_then(FeedToken::parse);
                info!("Replaying events from {source:?}");

                let mut store = ReportStore::new(ReportSettings {
                    window_days: *window_days,
                });
                if let Some(now) = now {
                    store = store.with_fixed_now(*now);
                }

                let (outbound_tx, mut outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
                let relay = tokio::spawn(async move {
                    while let Some(event) = outbound_rx.recv().await {
                        match serde_json::to_string(&event) {
                            Ok(line) => info!("Outbound request: {line}"),
                            Err(e) => debug!("Could not encode outbound request: {e}"),
                        }
                    }
                });
                let subscription = Subscription::start(outbound_tx).await?;

                let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
                let feed = tokio::spawn(async move {
                    forward_events(&source, token, inbound_tx).await
                });

                run_event_loop(&mut store, inbound_rx).await;
                feed.await??;
                drop(subscription);
                relay.await?;

                let snapshot = store.snapshot();
                for report in snapshot.ordered_reports() {
                    debug!(
                        "{}: {} ({})",
                        report.title,
                        if report.is_failing { "failing" } else { "passing" },
                        report.stability_label
                    );
                }
                info!(
                    "Settled on {} reports, {} pipelines available",
                    snapshot.reports.len(),
                    snapshot.pipeline_names.len()
                );

                self.write_output(&*snapshot)
            }
            Commands::Request { request } => {
                let event = match request {
                    RequestCommand::Get => OutboundEvent::Get,
                    RequestCommand::Add { pipeline } => OutboundEvent::Add(pipeline.clone()),
                    RequestCommand::Remove { id } => OutboundEvent::Remove(id.clone()),
                };

                self.write_output(&event)
            }
        }
    }

    fn write_output<T: Serialize>(&self, value: &T) -> Result<()> {
        // Serialize to JSON
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        // Write to output
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Output written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}
