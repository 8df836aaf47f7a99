//! End-to-end pipeline tests over a file-backed database
//!
//! These drive the full stack (service, adapters, rate limiter, persistence)
//! with the scripted remote client standing in for platform APIs.

use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;

use libsyndica::config::Config;
use libsyndica::error::PlatformError;
use libsyndica::platforms::{AdapterCore, AdapterRegistry, MockRemoteClient, RemoteClient};
use libsyndica::rate_limit::{RateLimiter, SqliteStore};
use libsyndica::retry::RetryPolicy;
use libsyndica::service::{
    BulkDeleteRequest, BulkService, CreatePostRequest, PublishingService,
};
use libsyndica::types::{
    PlatformKind, PlatformTarget, PostStatus, PublishContent, SocialAccount,
};
use libsyndica::Database;

struct Harness {
    _temp: TempDir,
    publishing: Arc<PublishingService>,
    bulk: BulkService,
    client: Arc<MockRemoteClient>,
}

async fn harness() -> Result<Harness> {
    let temp = TempDir::new()?;
    let db_path = temp.path().join("posts.db");
    let db = Database::new(db_path.to_str().unwrap()).await?;

    let config = Config::default_config();
    let client = Arc::new(MockRemoteClient::new());
    let limiter = RateLimiter::new(
        Arc::new(SqliteStore::new(db.pool().clone())),
        config.rate_limit.fail_open,
    );
    // Same attempt budget as the default policy, millisecond delays
    let retry = RetryPolicy {
        max_attempts: config.retry.max_attempts,
        initial_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(4),
        backoff_multiplier: 2.0,
    };
    let core = Arc::new(AdapterCore::new(
        limiter,
        retry,
        Arc::clone(&client) as Arc<dyn RemoteClient>,
        config.rate_limit.clone(),
    ));
    let registry = Arc::new(AdapterRegistry::new(core));
    let publishing = Arc::new(PublishingService::new(db, registry));

    Ok(Harness {
        _temp: temp,
        bulk: BulkService::new(Arc::clone(&publishing)),
        publishing,
        client,
    })
}

async fn seed_account(h: &Harness, id: &str, platform: PlatformKind) -> Result<()> {
    h.publishing
        .db()
        .upsert_account(&SocialAccount {
            id: id.to_string(),
            tenant_id: "tenant-1".to_string(),
            platform,
            display_name: format!("{platform} brand"),
            access_token: "token".to_string(),
            active: true,
        })
        .await?;
    Ok(())
}

fn simple_request(targets: Vec<PlatformTarget>, body: &str) -> CreatePostRequest {
    CreatePostRequest {
        tenant_id: "tenant-1".to_string(),
        content: PublishContent::text(body),
        media_ids: vec![],
        targets,
        scheduled_at: None,
        campaign_id: None,
        tags: vec![],
        ai_generated: false,
    }
}

#[tokio::test]
async fn test_create_publish_export_delete_cycle() -> Result<()> {
    let h = harness().await?;
    seed_account(&h, "acct-tw", PlatformKind::Twitter).await?;
    seed_account(&h, "acct-fb", PlatformKind::Facebook).await?;

    let post = h
        .publishing
        .create_post(simple_request(
            vec![
                PlatformTarget::new(PlatformKind::Twitter, "acct-tw"),
                PlatformTarget::new(PlatformKind::Facebook, "acct-fb"),
            ],
            "integration run",
        ))
        .await?;

    let outcome = h.publishing.publish_post(&post.id).await?;
    assert_eq!(outcome.success_count(), 2);
    assert_eq!(outcome.post.status, PostStatus::Published);

    let exported = h.bulk.export_csv(None, 10).await?;
    assert!(exported.contains("integration run"));
    assert!(exported.contains("twitter,facebook") || exported.contains("\"twitter,facebook\""));
    assert!(exported.contains("facebook brand"));

    h.publishing.delete_post(&post.id).await?;
    assert!(h.publishing.db().get_post(&post.id).await?.is_none());
    assert_eq!(h.client.deleted_ids().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_transient_remote_failure_is_retried_to_success() -> Result<()> {
    let h = harness().await?;
    seed_account(&h, "acct-tw", PlatformKind::Twitter).await?;

    // Default retry policy allows 3 attempts; two transient failures then
    // the scripted queue is empty and the mock succeeds.
    h.client
        .push_failures(PlatformError::Transient("503".to_string()), 2);

    let post = h
        .publishing
        .create_post(simple_request(
            vec![PlatformTarget::new(PlatformKind::Twitter, "acct-tw")],
            "retry me",
        ))
        .await?;

    let outcome = h.publishing.publish_post(&post.id).await?;
    assert_eq!(outcome.success_count(), 1);
    assert_eq!(h.client.request_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_fatal_remote_failure_not_retried() -> Result<()> {
    let h = harness().await?;
    seed_account(&h, "acct-tw", PlatformKind::Twitter).await?;
    h.client.fail_platform_with(
        PlatformKind::Twitter,
        PlatformError::Fatal("401 Unauthorized".to_string()),
    );

    let post = h
        .publishing
        .create_post(simple_request(
            vec![PlatformTarget::new(PlatformKind::Twitter, "acct-tw")],
            "doomed",
        ))
        .await?;

    let outcome = h.publishing.publish_post(&post.id).await?;
    assert_eq!(outcome.success_count(), 0);
    assert_eq!(outcome.post.status, PostStatus::Failed);
    assert_eq!(h.client.request_count(), 1, "fatal errors get one attempt");
    Ok(())
}

#[tokio::test]
async fn test_bulk_csv_import_then_publish() -> Result<()> {
    let h = harness().await?;
    seed_account(&h, "acct-tw", PlatformKind::Twitter).await?;

    let csv_text = "text,platforms,accountIds\n\
                    one,twitter,acct-tw\n\
                    two,twitter,acct-tw\n";
    let outcome = h.bulk.bulk_schedule_csv("tenant-1", csv_text).await?;
    assert_eq!(outcome.success_count, 2);

    for item in &outcome.results {
        let post_id = item.post_id.as_ref().unwrap();
        let publish = h.publishing.publish_post(post_id).await?;
        assert_eq!(publish.post.status, PostStatus::Published);
    }
    Ok(())
}

#[tokio::test]
async fn test_bulk_delete_cleans_database() -> Result<()> {
    let h = harness().await?;
    seed_account(&h, "acct-tw", PlatformKind::Twitter).await?;

    let csv_text = "text,platforms,accountIds\n\
                    a,twitter,acct-tw\n\
                    b,twitter,acct-tw\n\
                    c,twitter,acct-tw\n";
    let created = h.bulk.bulk_schedule_csv("tenant-1", csv_text).await?;
    let ids: Vec<String> = created
        .results
        .iter()
        .filter_map(|r| r.post_id.clone())
        .collect();
    assert_eq!(ids.len(), 3);

    let deleted = h
        .bulk
        .bulk_delete(BulkDeleteRequest {
            post_ids: ids,
            confirmed: true,
        })
        .await?;
    assert_eq!(deleted.success_count, 3);
    assert!(h.publishing.db().list_posts(None, 10).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_rate_limit_store_enforces_quota() -> Result<()> {
    let temp = TempDir::new()?;
    let db = Database::new(temp.path().join("rl.db").to_str().unwrap()).await?;

    let mut config = Config::default_config();
    config.rate_limit.max_requests = 2;
    let limiter = RateLimiter::new(
        Arc::new(SqliteStore::new(db.pool().clone())),
        config.rate_limit.fail_open,
    );
    let client = Arc::new(MockRemoteClient::new());
    let core = Arc::new(AdapterCore::new(
        limiter,
        RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        },
        Arc::clone(&client) as Arc<dyn RemoteClient>,
        config.rate_limit.clone(),
    ));
    let registry = AdapterRegistry::new(core);
    let adapter = registry.get(PlatformKind::Twitter);

    let account = SocialAccount {
        id: "acct-rl".to_string(),
        tenant_id: "tenant-1".to_string(),
        platform: PlatformKind::Twitter,
        display_name: "RL".to_string(),
        access_token: "token".to_string(),
        active: true,
    };
    let content = PublishContent::text("rate limited");

    assert!(adapter.publish_post(&account, &content).await.is_ok());
    assert!(adapter.publish_post(&account, &content).await.is_ok());

    let err = adapter.publish_post(&account, &content).await.unwrap_err();
    assert!(err.to_string().contains("Rate limit"));
    assert_eq!(client.request_count(), 2, "denied call never reaches the remote");
    Ok(())
}
