//! syndica-post - create, publish and manage posts from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

use libsyndica::config::Config;
use libsyndica::db::Database;
use libsyndica::platforms::{AdapterCore, AdapterRegistry, HttpRemoteClient, RemoteClient};
use libsyndica::rate_limit::{RateLimiter, SqliteStore};
use libsyndica::retry::RetryPolicy;
use libsyndica::scheduling;
use libsyndica::service::{CreatePostRequest, PublishingService};
use libsyndica::types::{PlatformKind, PlatformTarget, PostStatus, PublishContent, SocialAccount};

#[derive(Parser)]
#[command(name = "syndica-post")]
#[command(about = "Create and publish posts across social platforms", long_about = None)]
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
    /// Create a post (draft, or scheduled with --schedule)
    Create {
        /// Post body text
        text: String,

        /// Comma-separated platforms, e.g. "twitter,linkedin"
        #[arg(long)]
        platforms: String,

        /// Comma-separated account ids, same order and count as --platforms
        #[arg(long)]
        accounts: String,

        /// When to publish: "2h", "tomorrow 9am", RFC 3339
        #[arg(long)]
        schedule: Option<String>,

        /// Comma-separated hashtags (without #)
        #[arg(long)]
        hashtags: Option<String>,

        /// Destination link
        #[arg(long)]
        link: Option<String>,

        /// First comment, where the platform supports it
        #[arg(long)]
        first_comment: Option<String>,

        /// Campaign id
        #[arg(long)]
        campaign: Option<String>,

        /// Comma-separated stored media-asset ids
        #[arg(long)]
        media: Option<String>,
    },

    /// Publish a post to all its targets now
    Publish {
        post_id: String,
    },

    /// Delete a post locally and best-effort remotely
    Delete {
        post_id: String,
    },

    /// List posts
    List {
        /// Filter by status: draft, scheduled, publishing, published, failed
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Register or update a social account
    AddAccount {
        /// Account id
        id: String,

        #[arg(long)]
        platform: PlatformKind,

        #[arg(long)]
        display_name: String,

        #[arg(long)]
        access_token: String,
    },
}

fn split_csv_arg(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn build_service(config: &Config, db: Database) -> Result<PublishingService> {
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
    Ok(PublishingService::new(db, Arc::new(AdapterRegistry::new(core))))
}

async fn run(cli: Cli, service: &PublishingService) -> Result<()> {
    match cli.command {
        Commands::Create {
            text,
            platforms,
            accounts,
            schedule,
            hashtags,
            link,
            first_comment,
            campaign,
            media,
        } => {
            let platforms: Vec<PlatformKind> = split_csv_arg(&platforms)
                .iter()
                .map(|p| p.parse().map_err(anyhow::Error::msg))
                .collect::<Result<_>>()?;
            let accounts = split_csv_arg(&accounts);
            anyhow::ensure!(
                platforms.len() == accounts.len(),
                "--platforms and --accounts must have the same count"
            );

            let targets = platforms
                .into_iter()
                .zip(accounts)
                .map(|(platform, account_id)| PlatformTarget::new(platform, account_id))
                .collect();

            let scheduled_at = schedule
                .as_deref()
                .map(scheduling::parse_future_schedule)
                .transpose()?
                .map(|dt| dt.timestamp());

            let content = PublishContent {
                body: text,
                media: Vec::new(),
                hashtags: hashtags.as_deref().map(split_csv_arg).unwrap_or_default(),
                mentions: Vec::new(),
                link,
                first_comment,
            };

            let post = service
                .create_post(CreatePostRequest {
                    tenant_id: cli.tenant,
                    content,
                    media_ids: media.as_deref().map(split_csv_arg).unwrap_or_default(),
                    targets,
                    scheduled_at,
                    campaign_id: campaign,
                    tags: vec![],
                    ai_generated: false,
                })
                .await?;

            println!("{}", post.id);
            info!("Created post {} ({})", post.id, post.status);
        }

        Commands::Publish { post_id } => {
            let outcome = service.publish_post(&post_id).await?;
            for result in &outcome.results {
                match (&result.success, &result.remote_url, &result.error_message) {
                    (true, Some(url), _) => {
                        println!("{} {}: ok {url}", result.platform, result.account_id)
                    }
                    (_, _, Some(e)) => {
                        println!("{} {}: FAILED {e}", result.platform, result.account_id)
                    }
                    _ => {}
                }
            }
            info!(
                "Post {post_id}: {} succeeded, {} failed, final status {}",
                outcome.success_count(),
                outcome.failure_count(),
                outcome.post.status
            );
            anyhow::ensure!(
                outcome.success_count() > 0,
                "all {} targets failed",
                outcome.failure_count()
            );
        }

        Commands::Delete { post_id } => {
            service.delete_post(&post_id).await?;
            info!("Deleted post {post_id}");
        }

        Commands::List { status, limit } => {
            let status = status.as_deref().map(PostStatus::parse);
            for post in service.db().list_posts(status, limit).await? {
                let platforms = post
                    .targets
                    .iter()
                    .map(|t| t.platform.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                println!("{}\t{}\t{}\t{}", post.id, post.status, platforms, post.content.body);
            }
        }

        Commands::AddAccount {
            id,
            platform,
            display_name,
            access_token,
        } => {
            service
                .db()
                .upsert_account(&SocialAccount {
                    id: id.clone(),
                    tenant_id: cli.tenant,
                    platform,
                    display_name,
                    access_token,
                    active: true,
                })
                .await?;
            info!("Registered account {id} on {platform}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.verbose {
        libsyndica::logging::LoggingConfig::new(
            libsyndica::logging::LogFormat::Text,
            "debug".to_string(),
            true,
        )
    } else {
        libsyndica::logging::LoggingConfig::new(
            libsyndica::logging::LogFormat::Text,
            "info".to_string(),
            false,
        )
    };
    format.init();

    let config = Config::load().context("Failed to load configuration")?;
    let db = Database::new(&config.database.path)
        .await
        .context("Failed to initialize database")?;
    let service = build_service(&config, db)?;

    if let Err(e) = run(cli, &service).await {
        error!("{e:#}");
        let code = e
            .downcast_ref::<libsyndica::SyndicaError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
    Ok(())
}
