//! Review Board API client with caching and re-authentication
//!
//! This crate provides a trait-based Review Board client. Behavior on top of
//! the raw HTTP calls is added by decorators, so caching and the
//! re-authentication retry compose with any base client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            ReviewBoardClient trait               │
//! │  - list_review_requests()                        │
//! │  - get_file_diff_meta()                          │
//! │  - get_full_file()                               │
//! │  - create_diff_comment()                         │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┼───────────────────┐
//!        ▼               ▼                   ▼
//! ┌──────────────┐ ┌──────────────────┐ ┌──────────────┐
//! │ HttpReview-  │ │ CachedReview-    │ │ ReauthClient │
//! │ BoardClient  │◄│ BoardClient      │◄│ (decorator)  │
//! │ (direct API) │ │ (decorator)      │ │              │
//! └──────────────┘ └──────────────────┘ └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use rb_client::{
//!     CachedReviewBoardClient, CredentialPrompt, Credentials, HttpReviewBoardClient,
//!     ReauthClient, ReviewBoardClient,
//! };
//! use std::sync::Arc;
//!
//! struct Fixed;
//!
//! impl CredentialPrompt for Fixed {
//!     fn credentials(&self) -> Option<Credentials> {
//!         Some(Credentials::new("alice", "secret"))
//!     }
//! }
//!
//! # async fn example() -> rb_client::Result<()> {
//! let http = HttpReviewBoardClient::connect("http://demo.reviewboard.org").await?;
//! let client = ReauthClient::new(CachedReviewBoardClient::new(http), Arc::new(Fixed));
//!
//! let requests = client.list_review_requests(0).await?;
//! # Ok(())
//! # }
//! ```

pub mod cached_client;
pub mod client;
pub mod error;
pub mod http_client;
pub mod reauth_client;
pub mod templates;
pub mod types;

#[cfg(test)]
mod mock;

pub use cached_client::CachedReviewBoardClient;
pub use client::ReviewBoardClient;
pub use error::{ClientError, Result};
pub use http_client::{HttpClientBuilder, HttpReviewBoardClient, DIFF_DATA_MIMETYPE};
pub use reauth_client::{with_reauth, CredentialPrompt, ReauthClient};
pub use templates::{Resource, UriTemplates};
pub use types::{
    Credentials, Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, ProtocolVersion, ReviewDraft, ReviewRequest, ServerVersion,
};

// Re-export cache types for convenience
pub use rb_api_cache::{CacheStats, MemoTable};
