//! Orchestration services over the adapter and persistence layers

mod bulk;
mod publishing;

pub use bulk::{BulkDeleteRequest, BulkEditRequest, BulkItemResult, BulkOutcome, BulkService};
pub use publishing::{CreatePostRequest, PublishOutcome, PublishingService, UpdatePostRequest};
