use crate::auth::AuthClient;
use crate::bookmarks::{BookmarkClient, BookmarkStore};
use crate::client::operation::{
    OperationKind, OperationOutput, OperationRequest, SummarizeOptions,
};
use crate::config::ClientConfig;
use crate::i18n::Translator;
use crate::jobs::{JobHandle, JobOutcome, JobPoller};
use crate::notify::Notifier;
use crate::transport::{HttpReply, HttpTransport};
use crate::{Error, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Client for the blog backend's AI endpoints.
///
/// A submission either completes synchronously or is deferred to a backend job
/// that is polled until terminal. The plain entry points ([`Self::submit`],
/// [`Self::translate_post`], [`Self::summarize_post`]) report failures to the
/// notifier and return `None`; the `try_*` variants return the classified
/// [`Error`] and emit no notices.
pub struct PostAiClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) poller: JobPoller,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) bookmarks: Arc<BookmarkStore>,
    pub(crate) translator: Arc<Translator>,
}

impl PostAiClient {
    pub fn builder() -> crate::client::builder::PostAiClientBuilder {
        crate::client::builder::PostAiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.transport.clone())
    }

    pub fn bookmarks(&self) -> BookmarkClient {
        BookmarkClient::new(
            self.transport.clone(),
            self.bookmarks.clone(),
            self.notifier.clone(),
        )
    }

    pub fn translator(&self) -> &Arc<Translator> {
        &self.translator
    }

    /// Translate a post. `None` on failure; the reason goes to the notifier.
    pub async fn translate_post(&self, post_id: &str) -> Option<OperationOutput> {
        self.submit(OperationRequest::translate(post_id)).await
    }

    pub async fn try_translate_post(&self, post_id: &str) -> Result<OperationOutput> {
        self.try_submit(OperationRequest::translate(post_id), &CancellationToken::new())
            .await
    }

    /// Summarize a post, or `options.source_text` when given.
    pub async fn summarize_post(
        &self,
        post_id: &str,
        options: &SummarizeOptions,
    ) -> Option<OperationOutput> {
        self.submit(OperationRequest::summarize(post_id, options)).await
    }

    pub async fn try_summarize_post(
        &self,
        post_id: &str,
        options: &SummarizeOptions,
    ) -> Result<OperationOutput> {
        self.try_submit(
            OperationRequest::summarize(post_id, options),
            &CancellationToken::new(),
        )
        .await
    }

    pub async fn submit(&self, request: OperationRequest) -> Option<OperationOutput> {
        self.submit_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`Self::submit`], abandoning the operation when `cancel` fires.
    /// A cancelled operation returns `None` without a notice.
    pub async fn submit_with_cancel(
        &self,
        request: OperationRequest,
        cancel: &CancellationToken,
    ) -> Option<OperationOutput> {
        let kind = request.kind;
        match self.try_submit(request, cancel).await {
            Ok(output) => {
                self.notifier.notify(kind.success_notice()).await;
                Some(output)
            }
            Err(Error::Cancelled) => {
                debug!(kind = kind.path_segment(), "operation cancelled by caller");
                None
            }
            Err(e) => {
                warn!(kind = kind.path_segment(), error = %e, "operation failed");
                self.notifier.notify(e.notice(kind.action())).await;
                None
            }
        }
    }

    /// Run one operation to completion and classify any failure.
    ///
    /// The only notice emitted here is the fire-and-forget "queued" info when
    /// the backend defers the work.
    pub async fn try_submit(
        &self,
        request: OperationRequest,
        cancel: &CancellationToken,
    ) -> Result<OperationOutput> {
        if !self.transport.credentials().has_token() {
            return Err(Error::Unauthenticated);
        }
        let kind = request.kind;

        let reply = self.send_submission(&request, cancel).await?;
        if reply.status == 202 {
            let handle = reply
                .json()
                .ok()
                .as_ref()
                .and_then(JobHandle::from_queue_body)
                .ok_or(Error::MalformedQueueResponse)?;
            info!(kind = kind.path_segment(), post_id = %request.post_id, job_id = %handle, "operation queued");
            self.announce_queued(kind);

            let outcome = self.poller.poll(&handle, cancel).await?;
            return self.resolve(&request, &handle, outcome, cancel).await;
        }
        if !reply.is_success() {
            return Err(Error::backend(reply.status, reply.body));
        }
        let payload = reply.json()?;
        debug!(kind = kind.path_segment(), post_id = %request.post_id, "operation completed synchronously");
        Ok(OperationOutput::immediate(kind, payload))
    }

    async fn send_submission(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpReply> {
        let segments = ["api", "posts", request.post_id.as_str(), request.kind.path_segment()];
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            r = self.transport.post_json(&segments, &request.payload) => r,
        }
    }

    fn announce_queued(&self, kind: OperationKind) {
        let notifier = self.notifier.clone();
        let notice = kind.queued_notice();
        tokio::spawn(async move {
            notifier.notify(notice).await;
        });
    }

    async fn resolve(
        &self,
        request: &OperationRequest,
        handle: &JobHandle,
        outcome: JobOutcome,
        cancel: &CancellationToken,
    ) -> Result<OperationOutput> {
        let kind = request.kind;
        match outcome {
            JobOutcome::Completed(body) => match kind.extract_result(&body) {
                Some(text) => Ok(OperationOutput::from_job(kind, &handle.job_id, text)),
                None => self.refetch(request, handle, cancel).await,
            },
            ref failed @ JobOutcome::Failed(_) => Err(Error::JobFailed(
                failed
                    .failure_detail()
                    .unwrap_or_else(|| "job failed".to_string()),
            )),
            JobOutcome::Timeout => Err(Error::JobTimeout {
                job_id: handle.job_id.clone(),
            }),
            JobOutcome::NotFound => Err(Error::JobNotFound {
                job_id: handle.job_id.clone(),
            }),
        }
    }

    /// One more submission, expecting the backend to serve the finished result
    /// from its cache.
    async fn refetch(
        &self,
        request: &OperationRequest,
        handle: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<OperationOutput> {
        let kind = request.kind;
        debug!(job_id = %handle, "completed job carried no result, refetching");
        let reply = self.send_submission(request, cancel).await?;
        if reply.is_success() && reply.status != 202 {
            if let Ok(payload) = reply.json() {
                if kind.extract_cached(&payload).is_some() {
                    return Ok(OperationOutput::refetched(kind, &handle.job_id, payload));
                }
            }
        }
        warn!(job_id = %handle, status = reply.status, "cache refetch returned no usable result");
        Err(Error::ResultUnavailable {
            job_id: handle.job_id.clone(),
        })
    }
}
