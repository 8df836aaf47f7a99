//! Database operations for Syndica
//!
//! Posts keep their canonical content as JSON in a TEXT column; platform
//! targets and per-target publish results live in their own tables so partial
//! failure stays auditable.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result};
use crate::types::{
    Campaign, ContentOverride, MediaAsset, MediaKind, PlatformKind, PlatformTarget, Post,
    PostStatus, PublishContent, PublishResult, SocialAccount,
};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database at `db_path` and run
    /// pending migrations. `:memory:` gives a throwaway in-memory database.
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = if db_path == ":memory:" {
            // An in-memory database exists per connection, so the pool must
            // hold exactly one connection and never recycle it
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
                .map_err(DbError::SqlxError)?
        } else {
            let expanded_path = shellexpand::tilde(db_path).to_string();
            let path = Path::new(&expanded_path);

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }

            // Forward slashes keep the SQLite URL portable; mode=rwc creates
            // the file when missing
            let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));
            SqlitePool::connect(&db_url)
                .await
                .map_err(DbError::SqlxError)?
        };

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a post and its platform targets in one transaction.
    pub async fn create_post(&self, post: &Post) -> Result<()> {
        let content_json = serde_json::to_string(&post.content).map_err(DbError::from)?;
        let tags_json = serde_json::to_string(&post.tags).map_err(DbError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, content, status, scheduled_at, published_at,
                               campaign_id, tags, ai_generated, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&content_json)
        .bind(post.status.as_str())
        .bind(post.scheduled_at)
        .bind(post.published_at)
        .bind(&post.campaign_id)
        .bind(&tags_json)
        .bind(post.ai_generated as i64)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        for (position, target) in post.targets.iter().enumerate() {
            let override_json = target
                .content_override
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(DbError::from)?;

            sqlx::query(
                r#"
                INSERT INTO platform_targets (post_id, platform, account_id, content_override, position)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&post.id)
            .bind(target.platform.as_str())
            .bind(&target.account_id)
            .bind(override_json)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;
        }

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    /// Fetch a post with its targets.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, content, status, scheduled_at, published_at,
                   campaign_id, tags, ai_generated, created_at, updated_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let content: PublishContent =
            serde_json::from_str(&row.get::<String, _>("content")).map_err(DbError::from)?;
        let tags: Vec<String> =
            serde_json::from_str(&row.get::<String, _>("tags")).map_err(DbError::from)?;
        let targets = self.targets_for_post(post_id).await?;

        Ok(Some(Post {
            id: row.get("id"),
            content,
            targets,
            status: PostStatus::parse(&row.get::<String, _>("status")),
            scheduled_at: row.get("scheduled_at"),
            published_at: row.get("published_at"),
            campaign_id: row.get("campaign_id"),
            tags,
            ai_generated: row.get::<i64, _>("ai_generated") != 0,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn targets_for_post(&self, post_id: &str) -> Result<Vec<PlatformTarget>> {
        let rows = sqlx::query(
            r#"
            SELECT platform, account_id, content_override
            FROM platform_targets WHERE post_id = ? ORDER BY position
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.into_iter()
            .map(|row| {
                let platform: PlatformKind = row
                    .get::<String, _>("platform")
                    .parse()
                    .map_err(|e: String| DbError::SqlxError(sqlx::Error::Decode(e.into())))?;
                let content_override: Option<ContentOverride> = row
                    .get::<Option<String>, _>("content_override")
                    .map(|s| serde_json::from_str(&s))
                    .transpose()
                    .map_err(DbError::from)?;
                Ok(PlatformTarget {
                    platform,
                    account_id: row.get("account_id"),
                    content_override,
                })
            })
            .collect()
    }

    /// Rewrite a post's content, targets and schedule in one transaction.
    pub async fn update_post(&self, post: &Post) -> Result<()> {
        let content_json = serde_json::to_string(&post.content).map_err(DbError::from)?;
        let tags_json = serde_json::to_string(&post.tags).map_err(DbError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query(
            r#"
            UPDATE posts
            SET content = ?, status = ?, scheduled_at = ?, published_at = ?,
                campaign_id = ?, tags = ?, ai_generated = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&content_json)
        .bind(post.status.as_str())
        .bind(post.scheduled_at)
        .bind(post.published_at)
        .bind(&post.campaign_id)
        .bind(&tags_json)
        .bind(post.ai_generated as i64)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        sqlx::query("DELETE FROM platform_targets WHERE post_id = ?")
            .bind(&post.id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        for (position, target) in post.targets.iter().enumerate() {
            let override_json = target
                .content_override
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(DbError::from)?;

            sqlx::query(
                r#"
                INSERT INTO platform_targets (post_id, platform, account_id, content_override, position)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&post.id)
            .bind(target.platform.as_str())
            .bind(&target.account_id)
            .bind(override_json)
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;
        }

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    pub async fn update_post_status(
        &self,
        post_id: &str,
        status: PostStatus,
        published_at: Option<i64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            UPDATE posts
            SET status = ?, published_at = COALESCE(?, published_at), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(published_at)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// Remove a post with its targets and results.
    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        for sql in [
            "DELETE FROM publish_results WHERE post_id = ?",
            "DELETE FROM platform_targets WHERE post_id = ?",
            "DELETE FROM posts WHERE id = ?",
        ] {
            sqlx::query(sql)
                .bind(post_id)
                .execute(&mut *tx)
                .await
                .map_err(DbError::SqlxError)?;
        }

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }

    /// List posts, optionally filtered by status, newest first.
    pub async fn list_posts(&self, status: Option<PostStatus>, limit: usize) -> Result<Vec<Post>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT id FROM posts WHERE status = ? ORDER BY created_at DESC LIMIT ?")
                    .bind(status.as_str())
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT id FROM posts ORDER BY created_at DESC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::SqlxError)?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            if let Some(post) = self.get_post(&id).await? {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    pub async fn record_result(&self, result: &PublishResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO publish_results (post_id, platform, account_id, success,
                                         remote_post_id, remote_url, error_message, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&result.post_id)
        .bind(result.platform.as_str())
        .bind(&result.account_id)
        .bind(result.success as i64)
        .bind(&result.remote_post_id)
        .bind(&result.remote_url)
        .bind(&result.error_message)
        .bind(result.completed_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn results_for_post(&self, post_id: &str) -> Result<Vec<PublishResult>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, platform, account_id, success,
                   remote_post_id, remote_url, error_message, completed_at
            FROM publish_results WHERE post_id = ? ORDER BY id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.into_iter()
            .map(|row| {
                let platform: PlatformKind = row
                    .get::<String, _>("platform")
                    .parse()
                    .map_err(|e: String| DbError::SqlxError(sqlx::Error::Decode(e.into())))?;
                Ok(PublishResult {
                    id: Some(row.get("id")),
                    post_id: row.get("post_id"),
                    platform,
                    account_id: row.get("account_id"),
                    success: row.get::<i64, _>("success") != 0,
                    remote_post_id: row.get("remote_post_id"),
                    remote_url: row.get("remote_url"),
                    error_message: row.get("error_message"),
                    completed_at: row.get("completed_at"),
                })
            })
            .collect()
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<SocialAccount>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, platform, display_name, access_token, active
            FROM social_accounts WHERE id = ?
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|row| {
            let platform: PlatformKind = row
                .get::<String, _>("platform")
                .parse()
                .map_err(|e: String| DbError::SqlxError(sqlx::Error::Decode(e.into())))?;
            Ok(SocialAccount {
                id: row.get("id"),
                tenant_id: row.get("tenant_id"),
                platform,
                display_name: row.get("display_name"),
                access_token: row.get("access_token"),
                active: row.get::<i64, _>("active") != 0,
            })
        })
        .transpose()
    }

    pub async fn upsert_account(&self, account: &SocialAccount) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO social_accounts (id, tenant_id, platform, display_name, access_token, active)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                tenant_id = excluded.tenant_id,
                platform = excluded.platform,
                display_name = excluded.display_name,
                access_token = excluded.access_token,
                active = excluded.active
            "#,
        )
        .bind(&account.id)
        .bind(&account.tenant_id)
        .bind(account.platform.as_str())
        .bind(&account.display_name)
        .bind(&account.access_token)
        .bind(account.active as i64)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_media_asset(&self, asset_id: &str) -> Result<Option<MediaAsset>> {
        let row = sqlx::query(
            "SELECT id, url, kind, width, height, duration_secs FROM media_assets WHERE id = ?",
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.map(|row| {
            let kind: MediaKind = row
                .get::<String, _>("kind")
                .parse()
                .map_err(|e: String| DbError::SqlxError(sqlx::Error::Decode(e.into())))?;
            Ok(MediaAsset {
                id: row.get("id"),
                url: row.get("url"),
                kind,
                width: row.get::<Option<i64>, _>("width").map(|v| v as u32),
                height: row.get::<Option<i64>, _>("height").map(|v| v as u32),
                duration_secs: row.get::<Option<i64>, _>("duration_secs").map(|v| v as u32),
            })
        })
        .transpose()
    }

    pub async fn upsert_media_asset(&self, asset: &MediaAsset) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO media_assets (id, url, kind, width, height, duration_secs)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                url = excluded.url,
                kind = excluded.kind,
                width = excluded.width,
                height = excluded.height,
                duration_secs = excluded.duration_secs
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.url)
        .bind(asset.kind.as_str())
        .bind(asset.width.map(|v| v as i64))
        .bind(asset.height.map(|v| v as i64))
        .bind(asset.duration_secs.map(|v| v as i64))
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        let row = sqlx::query("SELECT id, name FROM campaigns WHERE id = ?")
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.map(|row| Campaign {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    pub async fn upsert_campaign(&self, campaign: &Campaign) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (id, name) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&campaign.id)
        .bind(&campaign.name)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }
}
