//! The publishing orchestrator
//!
//! Owns the post lifecycle: draft → scheduled → publishing → published or
//! failed. Creation fails fast (nothing persisted on any validation error);
//! publishing fans out per target and aggregates partial failure instead of
//! short-circuiting.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Result, SyndicaError};
use crate::platforms::AdapterRegistry;
use crate::types::{
    PlatformTarget, Post, PostStatus, PublishContent, PublishResult, SocialAccount,
};

pub struct CreatePostRequest {
    pub tenant_id: String,
    pub content: PublishContent,
    /// Stored media-asset ids, resolved and appended to the content's media.
    pub media_ids: Vec<String>,
    pub targets: Vec<PlatformTarget>,
    pub scheduled_at: Option<i64>,
    pub campaign_id: Option<String>,
    pub tags: Vec<String>,
    pub ai_generated: bool,
}

#[derive(Default)]
pub struct UpdatePostRequest {
    pub content: Option<PublishContent>,
    pub targets: Option<Vec<PlatformTarget>>,
    pub scheduled_at: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub campaign_id: Option<String>,
    /// Only `draft` and `scheduled` may be set directly; publish outcomes own
    /// the other states.
    pub status: Option<PostStatus>,
}

/// What one publish run produced: the post's final state plus one result per
/// target.
#[derive(Debug)]
pub struct PublishOutcome {
    pub post: Post,
    pub results: Vec<PublishResult>,
}

impl PublishOutcome {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}

pub struct PublishingService {
    db: Database,
    registry: Arc<AdapterRegistry>,
}

impl PublishingService {
    pub fn new(db: Database, registry: Arc<AdapterRegistry>) -> Self {
        Self { db, registry }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Validate and persist a new post. Any validation error on any target
    /// rejects the whole creation; nothing is persisted.
    pub async fn create_post(&self, request: CreatePostRequest) -> Result<Post> {
        if request.targets.is_empty() {
            return Err(SyndicaError::InvalidInput(
                "A post needs at least one platform target".to_string(),
            ));
        }
        if let Some(at) = request.scheduled_at {
            Self::ensure_future(at)?;
        }

        let mut content = request.content;
        for media_id in &request.media_ids {
            let asset = self
                .db
                .get_media_asset(media_id)
                .await?
                .ok_or_else(|| {
                    SyndicaError::InvalidInput(format!("Unknown media asset: {media_id}"))
                })?;
            content.media.push(asset.to_media_item());
        }

        if let Some(campaign_id) = &request.campaign_id {
            if self.db.get_campaign(campaign_id).await?.is_none() {
                return Err(SyndicaError::InvalidInput(format!(
                    "Unknown campaign: {campaign_id}"
                )));
            }
        }

        let mut errors = Vec::new();
        for target in &request.targets {
            if let Err(e) = self.resolve_account(target, &request.tenant_id).await {
                errors.push(e.to_string());
                continue;
            }
            let adapter = self.registry.get(target.platform);
            errors.extend(adapter.validate_content(&target.effective_content(&content)));
        }
        if !errors.is_empty() {
            return Err(SyndicaError::InvalidInput(errors.join("; ")));
        }

        let mut post = Post::new(content, request.targets);
        post.campaign_id = request.campaign_id;
        post.tags = request.tags;
        post.ai_generated = request.ai_generated;
        if let Some(at) = request.scheduled_at {
            post.scheduled_at = Some(at);
            post.status = PostStatus::Scheduled;
        }

        self.db.create_post(&post).await?;
        info!("Created post {} with {} targets", post.id, post.targets.len());
        Ok(post)
    }

    /// Publish a post to every target now.
    ///
    /// Targets are attempted independently and concurrently; one target's
    /// failure never blocks another's attempt. The post ends `published` if
    /// at least one target succeeded, `failed` only if all did.
    pub async fn publish_post(&self, post_id: &str) -> Result<PublishOutcome> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| SyndicaError::InvalidInput(format!("Unknown post: {post_id}")))?;

        if post.status == PostStatus::Published {
            return Err(SyndicaError::InvalidInput(format!(
                "Post {post_id} is already published"
            )));
        }

        self.db
            .update_post_status(post_id, PostStatus::Publishing, None)
            .await?;

        let attempts = post.targets.iter().map(|target| {
            let target = target.clone();
            let content = post.content.clone();
            let post_id = post.id.clone();
            async move { self.publish_one_target(&post_id, &target, &content).await }
        });
        let results = join_all(attempts).await;

        for result in &results {
            self.db.record_result(result).await?;
        }

        let any_success = results.iter().any(|r| r.success);
        let status = if any_success {
            PostStatus::Published
        } else {
            PostStatus::Failed
        };
        let published_at = any_success.then(|| chrono::Utc::now().timestamp());
        self.db
            .update_post_status(post_id, status, published_at)
            .await?;

        info!(
            "Post {post_id}: {} succeeded, {} failed",
            results.iter().filter(|r| r.success).count(),
            results.iter().filter(|r| !r.success).count()
        );

        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| SyndicaError::InvalidInput(format!("Unknown post: {post_id}")))?;
        Ok(PublishOutcome { post, results })
    }

    async fn publish_one_target(
        &self,
        post_id: &str,
        target: &PlatformTarget,
        content: &PublishContent,
    ) -> PublishResult {
        let account = match self.db.get_account(&target.account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                return PublishResult::failed(
                    post_id,
                    target.platform,
                    &target.account_id,
                    format!("Unknown account: {}", target.account_id),
                )
            }
            Err(e) => {
                return PublishResult::failed(
                    post_id,
                    target.platform,
                    &target.account_id,
                    e.to_string(),
                )
            }
        };

        let adapter = self.registry.get(target.platform);
        let effective = target.effective_content(content);
        match adapter.publish_post(&account, &effective).await {
            Ok(remote) => PublishResult::succeeded(
                post_id,
                target.platform,
                &target.account_id,
                remote.id,
                remote.url,
            ),
            Err(e) => {
                warn!(
                    "Post {post_id} target {}:{} failed: {e}",
                    target.platform, target.account_id
                );
                PublishResult::failed(post_id, target.platform, &target.account_id, e.to_string())
            }
        }
    }

    /// Apply edits to a post. Rejected once the post is published; content
    /// becomes append-only at that point.
    pub async fn update_post(&self, post_id: &str, request: UpdatePostRequest) -> Result<Post> {
        let mut post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| SyndicaError::InvalidInput(format!("Unknown post: {post_id}")))?;

        if post.status == PostStatus::Published {
            return Err(SyndicaError::InvalidInput(format!(
                "Post {post_id} is published and can no longer be edited"
            )));
        }

        if let Some(content) = request.content {
            post.content = content;
        }
        if let Some(targets) = request.targets {
            if targets.is_empty() {
                return Err(SyndicaError::InvalidInput(
                    "A post needs at least one platform target".to_string(),
                ));
            }
            post.targets = targets;
        }
        if let Some(at) = request.scheduled_at {
            Self::ensure_future(at)?;
            post.scheduled_at = Some(at);
            post.status = PostStatus::Scheduled;
        }
        if let Some(tags) = request.tags {
            post.tags = tags;
        }
        if let Some(campaign_id) = request.campaign_id {
            post.campaign_id = Some(campaign_id);
        }
        if let Some(status) = request.status {
            if !matches!(status, PostStatus::Draft | PostStatus::Scheduled) {
                return Err(SyndicaError::InvalidInput(format!(
                    "Status cannot be set to '{status}' directly"
                )));
            }
            post.status = status;
        }

        let mut errors = Vec::new();
        for target in &post.targets {
            let adapter = self.registry.get(target.platform);
            errors.extend(adapter.validate_content(&target.effective_content(&post.content)));
        }
        if !errors.is_empty() {
            return Err(SyndicaError::InvalidInput(errors.join("; ")));
        }

        post.updated_at = chrono::Utc::now().timestamp();
        self.db.update_post(&post).await?;
        Ok(post)
    }

    /// Delete a post. Remote copies of successfully-published targets are
    /// removed best-effort; a remote failure is logged and never blocks the
    /// local deletion. Local state is the source of truth.
    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| SyndicaError::InvalidInput(format!("Unknown post: {post_id}")))?;

        for result in self.db.results_for_post(post_id).await? {
            let Some(remote_post_id) = result.remote_post_id.as_deref() else {
                continue;
            };
            if !result.success {
                continue;
            }

            let account = match self.db.get_account(&result.account_id).await {
                Ok(Some(account)) => account,
                _ => {
                    warn!(
                        "Post {post_id}: skipping remote deletion on {}: account {} unavailable",
                        result.platform, result.account_id
                    );
                    continue;
                }
            };

            let adapter = self.registry.get(result.platform);
            if let Err(e) = adapter.delete_post(&account, remote_post_id).await {
                warn!(
                    "Post {post_id}: remote deletion failed on {}: {e}",
                    result.platform
                );
            }
        }

        self.db.delete_post(&post.id).await?;
        info!("Deleted post {post_id}");
        Ok(())
    }

    /// A post is `scheduled` only for a future instant; past timestamps are
    /// rejected no matter which surface supplied them.
    fn ensure_future(at: i64) -> Result<()> {
        if at <= chrono::Utc::now().timestamp() {
            return Err(SyndicaError::InvalidInput(format!(
                "Scheduled time must be in the future: {at}"
            )));
        }
        Ok(())
    }

    async fn resolve_account(
        &self,
        target: &PlatformTarget,
        tenant_id: &str,
    ) -> Result<SocialAccount> {
        let account = self
            .db
            .get_account(&target.account_id)
            .await?
            .ok_or_else(|| {
                SyndicaError::InvalidInput(format!("Unknown account: {}", target.account_id))
            })?;

        if account.tenant_id != tenant_id {
            return Err(SyndicaError::InvalidInput(format!(
                "Account {} does not belong to this tenant",
                target.account_id
            )));
        }
        if !account.active {
            return Err(SyndicaError::InvalidInput(format!(
                "Account {} is inactive",
                target.account_id
            )));
        }
        if account.platform != target.platform {
            return Err(SyndicaError::InvalidInput(format!(
                "Account {} is a {} account, target says {}",
                target.account_id, account.platform, target.platform
            )));
        }

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::PlatformError;
    use crate::platforms::{AdapterCore, MockRemoteClient, RemoteClient};
    use crate::types::PlatformKind;

    async fn test_service() -> (PublishingService, Arc<MockRemoteClient>) {
        let db = Database::new(":memory:").await.unwrap();
        let client = Arc::new(MockRemoteClient::new());
        let core = Arc::new(AdapterCore::in_process(
            Arc::clone(&client) as Arc<dyn RemoteClient>,
            &Config::default_config(),
        ));
        let registry = Arc::new(AdapterRegistry::new(core));
        (PublishingService::new(db, registry), client)
    }

    async fn seed_account(service: &PublishingService, id: &str, platform: PlatformKind) {
        service
            .db()
            .upsert_account(&SocialAccount {
                id: id.to_string(),
                tenant_id: "tenant-1".to_string(),
                platform,
                display_name: format!("{platform} account"),
                access_token: "token".to_string(),
                active: true,
            })
            .await
            .unwrap();
    }

    fn request(targets: Vec<PlatformTarget>) -> CreatePostRequest {
        CreatePostRequest {
            tenant_id: "tenant-1".to_string(),
            content: PublishContent::text("hello from syndica"),
            media_ids: vec![],
            targets,
            scheduled_at: None,
            campaign_id: None,
            tags: vec![],
            ai_generated: false,
        }
    }

    #[tokio::test]
    async fn test_create_post_persists_draft() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let post = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-tw",
            )]))
            .await
            .unwrap();

        assert_eq!(post.status, PostStatus::Draft);
        let loaded = service.db().get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(loaded.content.body, "hello from syndica");
    }

    #[tokio::test]
    async fn test_create_post_future_time_means_scheduled() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-fb", PlatformKind::Facebook).await;

        let mut req = request(vec![PlatformTarget::new(PlatformKind::Facebook, "acct-fb")]);
        req.scheduled_at = Some(chrono::Utc::now().timestamp() + 3600);
        let post = service.create_post(req).await.unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_create_rejects_past_schedule() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-fb", PlatformKind::Facebook).await;

        let mut req = request(vec![PlatformTarget::new(PlatformKind::Facebook, "acct-fb")]);
        req.scheduled_at = Some(chrono::Utc::now().timestamp() - 3600);
        let err = service.create_post(req).await.unwrap_err();
        assert!(err.to_string().contains("future"));

        let posts = service.db().list_posts(None, 10).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_past_schedule() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let post = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-tw",
            )]))
            .await
            .unwrap();

        let err = service
            .update_post(
                &post.id,
                UpdatePostRequest {
                    scheduled_at: Some(chrono::Utc::now().timestamp() - 60),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("future"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_content_nothing_persisted() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let mut req = request(vec![PlatformTarget::new(PlatformKind::Twitter, "acct-tw")]);
        req.content = PublishContent::text("x".repeat(300));
        assert!(service.create_post(req).await.is_err());

        let posts = service.db().list_posts(None, 10).await.unwrap();
        assert!(posts.is_empty(), "failed creation must persist nothing");
    }

    #[tokio::test]
    async fn test_create_rejects_inactive_and_foreign_accounts() {
        let (service, _) = test_service().await;
        service
            .db()
            .upsert_account(&SocialAccount {
                id: "acct-inactive".to_string(),
                tenant_id: "tenant-1".to_string(),
                platform: PlatformKind::Twitter,
                display_name: "Old".to_string(),
                access_token: "token".to_string(),
                active: false,
            })
            .await
            .unwrap();
        service
            .db()
            .upsert_account(&SocialAccount {
                id: "acct-other".to_string(),
                tenant_id: "tenant-2".to_string(),
                platform: PlatformKind::Twitter,
                display_name: "Foreign".to_string(),
                access_token: "token".to_string(),
                active: true,
            })
            .await
            .unwrap();

        let err = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-inactive",
            )]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("inactive"));

        let err = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-other",
            )]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tenant"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_media() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let mut req = request(vec![PlatformTarget::new(PlatformKind::Twitter, "acct-tw")]);
        req.media_ids = vec!["media-missing".to_string()];
        let err = service.create_post(req).await.unwrap_err();
        assert!(err.to_string().contains("media"));
    }

    #[tokio::test]
    async fn test_publish_partial_failure_still_publishes() {
        let (service, client) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;
        seed_account(&service, "acct-li", PlatformKind::LinkedIn).await;
        seed_account(&service, "acct-fb", PlatformKind::Facebook).await;
        client.fail_platform_with(
            PlatformKind::LinkedIn,
            PlatformError::Fatal("401 Unauthorized".to_string()),
        );

        let post = service
            .create_post(request(vec![
                PlatformTarget::new(PlatformKind::Twitter, "acct-tw"),
                PlatformTarget::new(PlatformKind::LinkedIn, "acct-li"),
                PlatformTarget::new(PlatformKind::Facebook, "acct-fb"),
            ]))
            .await
            .unwrap();

        let outcome = service.publish_post(&post.id).await.unwrap();
        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.post.status, PostStatus::Published);
        assert!(outcome.post.published_at.is_some());

        let failed: Vec<_> = outcome.results.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].platform, PlatformKind::LinkedIn);
        assert!(failed[0].error_message.as_ref().unwrap().contains("401"));

        // Every per-target outcome is persisted
        let stored = service.db().results_for_post(&post.id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_publish_all_failures_marks_failed() {
        let (service, client) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;
        client.fail_platform_with(
            PlatformKind::Twitter,
            PlatformError::Fatal("400 rejected".to_string()),
        );

        let post = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-tw",
            )]))
            .await
            .unwrap();

        let outcome = service.publish_post(&post.id).await.unwrap();
        assert_eq!(outcome.success_count(), 0);
        assert_eq!(outcome.post.status, PostStatus::Failed);
        assert!(outcome.post.published_at.is_none());
    }

    #[tokio::test]
    async fn test_publish_twice_rejected() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let post = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-tw",
            )]))
            .await
            .unwrap();
        service.publish_post(&post.id).await.unwrap();

        let err = service.publish_post(&post.id).await.unwrap_err();
        assert!(err.to_string().contains("already published"));
    }

    #[tokio::test]
    async fn test_update_blocked_after_publish() {
        let (service, _) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let post = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-tw",
            )]))
            .await
            .unwrap();

        // Editable while draft
        let updated = service
            .update_post(
                &post.id,
                UpdatePostRequest {
                    content: Some(PublishContent::text("edited")),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content.body, "edited");

        service.publish_post(&post.id).await.unwrap();
        let err = service
            .update_post(
                &post.id,
                UpdatePostRequest {
                    content: Some(PublishContent::text("too late")),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no longer be edited"));
    }

    #[tokio::test]
    async fn test_delete_attempts_remote_cleanup_and_always_removes_local() {
        let (service, client) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;
        seed_account(&service, "acct-fb", PlatformKind::Facebook).await;

        let post = service
            .create_post(request(vec![
                PlatformTarget::new(PlatformKind::Twitter, "acct-tw"),
                PlatformTarget::new(PlatformKind::Facebook, "acct-fb"),
            ]))
            .await
            .unwrap();
        service.publish_post(&post.id).await.unwrap();

        // Remote deletion failing must not block local deletion
        client.fail_deletes_with(PlatformError::Fatal("410 Gone".to_string()));
        service.delete_post(&post.id).await.unwrap();

        assert!(service.db().get_post(&post.id).await.unwrap().is_none());
        assert_eq!(client.deleted_ids().len(), 2, "both remote copies attempted");
    }

    #[tokio::test]
    async fn test_delete_unpublished_skips_remote() {
        let (service, client) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let post = service
            .create_post(request(vec![PlatformTarget::new(
                PlatformKind::Twitter,
                "acct-tw",
            )]))
            .await
            .unwrap();
        service.delete_post(&post.id).await.unwrap();

        assert!(client.deleted_ids().is_empty());
        assert!(service.db().get_post(&post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_per_target_override_reaches_remote() {
        let (service, client) = test_service().await;
        seed_account(&service, "acct-tw", PlatformKind::Twitter).await;

        let mut target = PlatformTarget::new(PlatformKind::Twitter, "acct-tw");
        target.content_override = Some(crate::types::ContentOverride {
            body: Some("tweet-sized".to_string()),
            ..Default::default()
        });
        let post = service.create_post(request(vec![target])).await.unwrap();
        service.publish_post(&post.id).await.unwrap();

        let calls = client.recorded_calls();
        assert_eq!(calls.len(), 1);
        match &calls[0].request {
            crate::platforms::RemoteRequest::Status { body, .. } => {
                assert_eq!(body, "tweet-sized")
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }
}
