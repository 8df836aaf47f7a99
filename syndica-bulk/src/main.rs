//! syndica-bulk - batch scheduling, editing, deletion and CSV export
//!
//! Reads CSV from a file or stdin for imports; writes CSV to a file or
//! stdout for exports, so it composes with shell pipelines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use libsyndica::config::Config;
use libsyndica::db::Database;
use libsyndica::platforms::{AdapterCore, AdapterRegistry, HttpRemoteClient, RemoteClient};
use libsyndica::rate_limit::{RateLimiter, SqliteStore};
use libsyndica::retry::RetryPolicy;
use libsyndica::service::{
    BulkDeleteRequest, BulkEditRequest, BulkOutcome, BulkService, PublishingService,
};
use libsyndica::types::PostStatus;

#[derive(Parser)]
#[command(name = "syndica-bulk")]
#[command(about = "Bulk operations over posts: CSV import, edit, delete, export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tenant the accounts belong to
    #[arg(long, global = true, default_value = "default")]
    tenant: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create posts from a CSV file ("-" reads stdin)
    Import {
        /// CSV file with columns text,platforms,accountIds (plus optional
        /// scheduledAt,hashtags,mentions,link,firstComment,mediaIds,campaignId,tags)
        file: PathBuf,
    },

    /// Edit many posts at once
    Edit {
        /// Post ids
        #[arg(required = true)]
        post_ids: Vec<String>,

        /// New schedule time
        #[arg(long)]
        schedule: Option<String>,

        /// Replace tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,

        /// Move to a campaign
        #[arg(long)]
        campaign: Option<String>,
    },

    /// Delete many posts at once
    Delete {
        /// Post ids
        #[arg(required = true)]
        post_ids: Vec<String>,

        /// Required confirmation flag
        #[arg(long)]
        yes: bool,
    },

    /// Export posts as CSV ("-" writes stdout)
    Export {
        #[arg(long, default_value = "-")]
        output: PathBuf,

        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value = "1000")]
        limit: usize,
    },
}

fn build_services(config: &Config, db: Database) -> Result<BulkService> {
    let client: Arc<dyn RemoteClient> = Arc::new(HttpRemoteClient::new(&config.http)?);
    let limiter = RateLimiter::new(
        Arc::new(SqliteStore::new(db.pool().clone())),
        config.rate_limit.fail_open,
    );
    let core = Arc::new(AdapterCore::new(
        limiter,
        RetryPolicy::from(&config.retry),
        client,
        config.rate_limit.clone(),
    ));
    let publishing = Arc::new(PublishingService::new(
        db,
        Arc::new(AdapterRegistry::new(core)),
    ));
    Ok(BulkService::new(publishing))
}

fn report(outcome: &BulkOutcome) {
    for item in &outcome.results {
        match (&item.post_id, &item.error) {
            (Some(post_id), None) => println!("{}: ok {post_id}", item.item),
            (_, Some(e)) => println!("{}: FAILED {e}", item.item),
            _ => {}
        }
    }
    info!(
        "{} succeeded, {} failed",
        outcome.success_count, outcome.failure_count
    );
}

async fn run(cli: Cli, bulk: &BulkService) -> Result<()> {
    match cli.command {
        Commands::Import { file } => {
            let csv_text = if file.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read stdin")?;
                buf
            } else {
                std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?
            };

            let outcome = bulk.bulk_schedule_csv(&cli.tenant, &csv_text).await?;
            report(&outcome);
            anyhow::ensure!(
                outcome.failure_count == 0,
                "{} rows failed",
                outcome.failure_count
            );
        }

        Commands::Edit {
            post_ids,
            schedule,
            tags,
            campaign,
        } => {
            let tags = tags.map(|t| {
                t.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });
            let outcome = bulk
                .bulk_edit(BulkEditRequest {
                    post_ids,
                    scheduled_at: schedule,
                    targets: None,
                    status: None,
                    tags,
                    campaign_id: campaign,
                })
                .await?;
            report(&outcome);
        }

        Commands::Delete { post_ids, yes } => {
            let outcome = bulk
                .bulk_delete(BulkDeleteRequest {
                    post_ids,
                    confirmed: yes,
                })
                .await?;
            report(&outcome);
        }

        Commands::Export {
            output,
            status,
            limit,
        } => {
            let status = status.as_deref().map(PostStatus::parse);
            let csv_text = bulk.export_csv(status, limit).await?;
            if output.as_os_str() == "-" {
                print!("{csv_text}");
            } else {
                std::fs::write(&output, csv_text)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
                info!("Exported to {}", output.display());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    libsyndica::logging::LoggingConfig::new(
        libsyndica::logging::LogFormat::Text,
        level.to_string(),
        cli.verbose,
    )
    .init();

    let config = Config::load().context("Failed to load configuration")?;
    let db = Database::new(&config.database.path)
        .await
        .context("Failed to initialize database")?;
    let bulk = build_services(&config, db)?;

    if let Err(e) = run(cli, &bulk).await {
        error!("{e:#}");
        let code = e
            .downcast_ref::<libsyndica::SyndicaError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
    Ok(())
}
