//! Bulk operations: CSV scheduling, batch edit, batch delete, CSV export
//!
//! Every item in a batch is processed in isolation; one row's failure is
//! recorded and the batch continues. Batches are not atomic by design.

use futures::future::join_all;
use std::sync::Arc;
use tracing::info;

use crate::csv::{self, ImportRow};
use crate::db::Database;
use crate::error::{Result, SyndicaError};
use crate::scheduling;
use crate::service::publishing::{CreatePostRequest, PublishingService, UpdatePostRequest};
use crate::types::{PlatformTarget, PostStatus, PublishContent};

/// Rows processed concurrently per chunk during CSV import.
const IMPORT_CHUNK_SIZE: usize = 5;

/// Outcome of one batch item, keyed by row number or post id.
#[derive(Debug, Clone)]
pub struct BulkItemResult {
    pub item: String,
    pub post_id: Option<String>,
    pub error: Option<String>,
}

impl BulkItemResult {
    fn ok(item: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            post_id: Some(post_id.into()),
            error: None,
        }
    }

    fn err(item: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            post_id: None,
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkOutcome {
    fn from_results(results: Vec<BulkItemResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success()).count();
        Self {
            success_count,
            failure_count: results.len() - success_count,
            results,
        }
    }
}

pub struct BulkEditRequest {
    pub post_ids: Vec<String>,
    pub scheduled_at: Option<String>,
    pub targets: Option<Vec<PlatformTarget>>,
    pub status: Option<PostStatus>,
    pub tags: Option<Vec<String>>,
    pub campaign_id: Option<String>,
}

pub struct BulkDeleteRequest {
    pub post_ids: Vec<String>,
    /// Must be true; bulk deletion without explicit confirmation is rejected
    /// outright.
    pub confirmed: bool,
}

pub struct BulkService {
    publishing: Arc<PublishingService>,
}

impl BulkService {
    pub fn new(publishing: Arc<PublishingService>) -> Self {
        Self { publishing }
    }

    fn db(&self) -> &Database {
        self.publishing.db()
    }

    /// Create one post per CSV row. Malformed rows are recorded as failures
    /// without touching the rest of the batch.
    pub async fn bulk_schedule_csv(&self, tenant_id: &str, csv_text: &str) -> Result<BulkOutcome> {
        let file = csv::parse_import(csv_text)?;
        let mut results = Vec::with_capacity(file.rows.len());

        let numbered: Vec<(usize, std::result::Result<ImportRow, String>)> =
            file.rows.into_iter().enumerate().collect();

        for chunk in numbered.chunks(IMPORT_CHUNK_SIZE) {
            let attempts = chunk.iter().map(|(index, row)| {
                let row_no = index + 1;
                async move {
                    match row {
                        Ok(row) => match self.import_row(tenant_id, row).await {
                            Ok(post_id) => BulkItemResult::ok(format!("row {row_no}"), post_id),
                            Err(e) => BulkItemResult::err(format!("row {row_no}"), e.to_string()),
                        },
                        Err(e) => BulkItemResult::err(format!("row {row_no}"), e.clone()),
                    }
                }
            });
            results.extend(join_all(attempts).await);
        }

        let outcome = BulkOutcome::from_results(results);
        info!(
            "Bulk schedule: {} created, {} failed",
            outcome.success_count, outcome.failure_count
        );
        Ok(outcome)
    }

    async fn import_row(&self, tenant_id: &str, row: &ImportRow) -> Result<String> {
        let scheduled_at = row
            .scheduled_at
            .as_deref()
            .map(scheduling::parse_future_schedule)
            .transpose()?
            .map(|dt| dt.timestamp());

        let content = PublishContent {
            body: row.text.clone(),
            media: Vec::new(),
            hashtags: row.hashtags.clone(),
            mentions: row.mentions.clone(),
            link: row.link.clone(),
            first_comment: row.first_comment.clone(),
        };

        let targets = row
            .platforms
            .iter()
            .zip(&row.account_ids)
            .map(|(platform, account_id)| PlatformTarget::new(*platform, account_id.clone()))
            .collect();

        let post = self
            .publishing
            .create_post(CreatePostRequest {
                tenant_id: tenant_id.to_string(),
                content,
                media_ids: row.media_ids.clone(),
                targets,
                scheduled_at,
                campaign_id: row.campaign_id.clone(),
                tags: row.tags.clone(),
                ai_generated: false,
            })
            .await?;

        Ok(post.id)
    }

    /// Apply the same edit to many posts, one at a time.
    pub async fn bulk_edit(&self, request: BulkEditRequest) -> Result<BulkOutcome> {
        let scheduled_at = request
            .scheduled_at
            .as_deref()
            .map(scheduling::parse_future_schedule)
            .transpose()?
            .map(|dt| dt.timestamp());

        let mut results = Vec::with_capacity(request.post_ids.len());
        for post_id in &request.post_ids {
            let update = UpdatePostRequest {
                content: None,
                targets: request.targets.clone(),
                scheduled_at,
                tags: request.tags.clone(),
                campaign_id: request.campaign_id.clone(),
                status: request.status,
            };
            match self.publishing.update_post(post_id, update).await {
                Ok(_) => results.push(BulkItemResult::ok(post_id.clone(), post_id.clone())),
                Err(e) => results.push(BulkItemResult::err(post_id.clone(), e.to_string())),
            }
        }

        Ok(BulkOutcome::from_results(results))
    }

    /// Delete many posts. `confirmed` must be set or the whole call is
    /// rejected before anything is touched.
    pub async fn bulk_delete(&self, request: BulkDeleteRequest) -> Result<BulkOutcome> {
        if !request.confirmed {
            return Err(SyndicaError::InvalidInput(
                "Bulk delete requires confirmed=true".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(request.post_ids.len());
        for post_id in &request.post_ids {
            match self.publishing.delete_post(post_id).await {
                Ok(()) => results.push(BulkItemResult::ok(post_id.clone(), post_id.clone())),
                Err(e) => results.push(BulkItemResult::err(post_id.clone(), e.to_string())),
            }
        }

        let outcome = BulkOutcome::from_results(results);
        info!(
            "Bulk delete: {} removed, {} failed",
            outcome.success_count, outcome.failure_count
        );
        Ok(outcome)
    }

    /// Export stored posts as CSV, one row per post with multi-valued fields
    /// comma-joined.
    pub async fn export_csv(&self, status: Option<PostStatus>, limit: usize) -> Result<String> {
        let posts = self.db().list_posts(status, limit).await?;
        let mut out = String::new();
        out.push_str(&csv::write_row(
            &csv::EXPORT_HEADER
                .iter()
                .map(|h| h.to_string())
                .collect::<Vec<_>>(),
        ));
        out.push('\n');

        for post in posts {
            let mut account_names = Vec::with_capacity(post.targets.len());
            for target in &post.targets {
                let name = self
                    .db()
                    .get_account(&target.account_id)
                    .await?
                    .map(|a| a.display_name)
                    .unwrap_or_default();
                account_names.push(name);
            }

            let campaign_name = match &post.campaign_id {
                Some(id) => self
                    .db()
                    .get_campaign(id)
                    .await?
                    .map(|c| c.name)
                    .unwrap_or_default(),
                None => String::new(),
            };

            let platforms = post
                .targets
                .iter()
                .map(|t| t.platform.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let account_ids = post
                .targets
                .iter()
                .map(|t| t.account_id.clone())
                .collect::<Vec<_>>()
                .join(",");

            let fields = vec![
                post.id.clone(),
                post.content.body.clone(),
                platforms,
                account_ids,
                account_names.join(","),
                post.status.to_string(),
                format_timestamp(post.scheduled_at),
                format_timestamp(post.published_at),
                post.content.hashtags.join(","),
                post.content.mentions.join(","),
                post.content.link.clone().unwrap_or_default(),
                post.content.first_comment.clone().unwrap_or_default(),
                post.content.media.len().to_string(),
                post.campaign_id.clone().unwrap_or_default(),
                campaign_name,
                post.tags.join(","),
                post.ai_generated.to_string(),
                format_timestamp(Some(post.created_at)),
                format_timestamp(Some(post.updated_at)),
            ];
            out.push_str(&csv::write_row(&fields));
            out.push('\n');
        }

        Ok(out)
    }
}

fn format_timestamp(ts: Option<i64>) -> String {
    ts.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
