//! Re-authentication on expired sessions (decorator pattern)
//!
//! Every call that fails with `ClientError::Authorization` asks the shell for
//! credentials once, logs in, and retries the same call exactly once. A
//! second authorization failure becomes `ClientError::Authentication` and is
//! never retried again, so a wrong password cannot loop the prompt.

use crate::client::ReviewBoardClient;
use crate::error::{ClientError, Result};
use crate::templates::Resource;
use crate::types::{
    Credentials, Diff, DiffComment, DraftUpdate, FileDiff, FileDiffSummary, FileKey, FullFile,
    NewDiffComment, ReviewDraft, ReviewRequest, ServerVersion,
};
use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;

/// Supplies credentials when the server asks for them
///
/// Implemented by the editor shell. Returning `None` means the user
/// cancelled the prompt.
pub trait CredentialPrompt: Send + Sync {
    fn credentials(&self) -> Option<Credentials>;
}

/// Run `op`, re-prompting and retrying once on an authorization failure
pub async fn with_reauth<C, T, F, Fut>(
    client: &C,
    prompt: &dyn CredentialPrompt,
    op: F,
) -> Result<T>
where
    C: ReviewBoardClient + ?Sized,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(ClientError::Authorization(reason)) => {
            debug!("Authorization required ({}), prompting for credentials", reason);
            let creds = prompt
                .credentials()
                .ok_or_else(|| ClientError::Authentication("login cancelled".to_string()))?;

            client
                .login(&creds.username, &creds.password)
                .await
                .map_err(into_fatal)?;
            op().await.map_err(into_fatal)
        }
        other => other,
    }
}

fn into_fatal(err: ClientError) -> ClientError {
    match err {
        ClientError::Authorization(reason) => {
            warn!("Authorization failed after re-login: {}", reason);
            ClientError::Authentication(reason)
        }
        other => other,
    }
}

/// Client decorator that applies [`with_reauth`] to every call
pub struct ReauthClient<C: ReviewBoardClient> {
    inner: C,
    prompt: Arc<dyn CredentialPrompt>,
}

impl<C: ReviewBoardClient> ReauthClient<C> {
    pub fn new(inner: C, prompt: Arc<dyn CredentialPrompt>) -> Self {
        Self { inner, prompt }
    }

    async fn retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_reauth(&self.inner, self.prompt.as_ref(), op).await
    }
}

#[async_trait]
impl<C: ReviewBoardClient> ReviewBoardClient for ReauthClient<C> {
    fn server_version(&self) -> ServerVersion {
        self.inner.server_version()
    }

    fn resource_url(&self, resource: Resource) -> Result<String> {
        self.inner.resource_url(resource)
    }

    async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.inner.login(username, password).await
    }

    async fn list_review_requests(&self, start: usize) -> Result<Vec<ReviewRequest>> {
        self.retry(|| self.inner.list_review_requests(start)).await
    }

    async fn get_review_request(&self, review_request_id: u64) -> Result<ReviewRequest> {
        self.retry(|| self.inner.get_review_request(review_request_id))
            .await
    }

    async fn get_diffs(&self, review_request_id: u64) -> Result<Vec<Diff>> {
        self.retry(|| self.inner.get_diffs(review_request_id)).await
    }

    async fn get_diff_files(
        &self,
        review_request_id: u64,
        diff_revision: u32,
    ) -> Result<Vec<FileDiffSummary>> {
        self.retry(|| self.inner.get_diff_files(review_request_id, diff_revision))
            .await
    }

    async fn get_file_diff_meta(&self, key: FileKey) -> Result<FileDiff> {
        self.retry(|| self.inner.get_file_diff_meta(key)).await
    }

    async fn get_full_file(&self, key: FileKey) -> Result<FullFile> {
        self.retry(|| self.inner.get_full_file(key)).await
    }

    async fn get_review_draft(&self, review_request_id: u64) -> Result<Option<ReviewDraft>> {
        self.retry(|| self.inner.get_review_draft(review_request_id))
            .await
    }

    async fn create_review_draft(&self, review_request_id: u64) -> Result<ReviewDraft> {
        self.retry(|| self.inner.create_review_draft(review_request_id))
            .await
    }

    async fn update_review_draft(
        &self,
        review_request_id: u64,
        review_id: u64,
        update: &DraftUpdate,
    ) -> Result<ReviewDraft> {
        self.retry(|| {
            self.inner
                .update_review_draft(review_request_id, review_id, update)
        })
        .await
    }

    async fn list_diff_comments(
        &self,
        review_request_id: u64,
        review_id: u64,
    ) -> Result<Vec<DiffComment>> {
        self.retry(|| self.inner.list_diff_comments(review_request_id, review_id))
            .await
    }

    async fn create_diff_comment(
        &self,
        review_request_id: u64,
        review_id: u64,
        comment: &NewDiffComment,
    ) -> Result<DiffComment> {
        self.retry(|| {
            self.inner
                .create_diff_comment(review_request_id, review_id, comment)
        })
        .await
    }
}
