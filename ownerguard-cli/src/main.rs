use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use ownerguard_cli::config::{Cli, Config};
use ownerguard_cli::github::GitHubClient;
use ownerguard_cli::interpreter::{run, ReconcilerContext};
use ownerguard_cli::payload::{classify, Classification, EventPayload};
use ownerguard_core::machine::Event;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();
    let config = Config::from_env(&cli)?;

    let raw_payload = tokio::fs::read_to_string(&config.event_path)
        .await
        .with_context(|| {
            format!(
                "failed to read event payload from {}",
                config.event_path.display()
            )
        })?;
    let payload: EventPayload =
        serde_json::from_str(&raw_payload).context("failed to parse event payload")?;

    let client = GitHubClient::new(config.token.clone())?;

    let (pr_number, event) = match classify(&config.event_name, &payload, &config.ownership) {
        Classification::Reconcile { pr_number, event } => (pr_number, event),
        Classification::Skip { reason } => {
            info!("Nothing to do: {reason}");
            return Ok(());
        }
        // Unsupported kinds still go through the machine so the warning
        // outcome is reported uniformly; they emit no API effects, so the
        // pull request number is never consulted.
        Classification::Unsupported { kind } => (0, Event::UnsupportedEvent { kind }),
    };

    let ctx = ReconcilerContext {
        client: &client,
        config: &config,
        pr_number,
    };

    let outcome = run(&ctx, event).await?;
    info!("Reconciliation finished: {outcome}");

    Ok(())
}
