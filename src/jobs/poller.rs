use super::status::{JobHandle, JobOutcome, JobStatus};
use crate::config::{ClientConfig, UnknownStatusPolicy};
use crate::transport::HttpTransport;
use crate::{Error, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a single status request.
#[derive(Debug)]
enum PollStep {
    Done(JobOutcome),
    Waiting(JobStatus),
    /// Transport or parse failure; the loop carries on.
    Retry(String),
}

/// Polls `GET /api/jobs/{id}` until the job reaches a terminal state.
///
/// - at most `floor(job_timeout / poll_interval)` requests (min 1)
/// - never runs past `start + job_timeout`
/// - transient failures of a single request are retried, never surfaced
pub struct JobPoller {
    transport: Arc<HttpTransport>,
    interval: Duration,
    timeout: Duration,
    max_attempts: u32,
    unknown_status: UnknownStatusPolicy,
}

impl JobPoller {
    pub fn new(transport: Arc<HttpTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            interval: config.poll_interval,
            timeout: config.job_timeout,
            max_attempts: config.max_poll_attempts(),
            unknown_status: config.unknown_status,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run the poll loop for `handle`.
    ///
    /// Returns `Err(Error::Cancelled)` as soon as `cancel` fires, and
    /// `Err(Error::UnknownJobStatus)` under [`UnknownStatusPolicy::FailFast`].
    pub async fn poll(&self, handle: &JobHandle, cancel: &CancellationToken) -> Result<JobOutcome> {
        // `None` when the timeout is too large to represent; the attempt cap
        // still bounds the loop.
        let deadline = Instant::now().checked_add(self.timeout);
        let mut warned_unknown = false;

        for attempt in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                r = self.poll_before(deadline, handle) => r,
            };
            // Deadline hit while the request was in flight.
            let Some(step) = step else {
                break;
            };

            match step {
                PollStep::Done(outcome) => {
                    info!(job_id = %handle, attempt, outcome = outcome.name(), "job reached terminal state");
                    return Ok(outcome);
                }
                PollStep::Waiting(JobStatus::Unknown(raw)) => match self.unknown_status {
                    UnknownStatusPolicy::FailFast => {
                        warn!(job_id = %handle, status = %raw, "unrecognized job status, giving up");
                        return Err(Error::UnknownJobStatus {
                            job_id: handle.job_id.clone(),
                            status: raw,
                        });
                    }
                    UnknownStatusPolicy::KeepPolling => {
                        if !warned_unknown {
                            warn!(job_id = %handle, status = %raw, "unrecognized job status, still polling");
                            warned_unknown = true;
                        }
                    }
                },
                PollStep::Waiting(status) => {
                    debug!(job_id = %handle, attempt, %status, "job not finished");
                }
                PollStep::Retry(reason) => {
                    debug!(job_id = %handle, attempt, %reason, "status request failed, retrying");
                }
            }

            if attempt == self.max_attempts {
                break;
            }
            let pause = match deadline {
                Some(d) => self.interval.min(d.saturating_duration_since(Instant::now())),
                None => self.interval,
            };
            if pause.is_zero() {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(job_id = %handle, timeout_ms = self.timeout.as_millis() as u64, "job polling timed out");
        Ok(JobOutcome::Timeout)
    }

    /// One status request, no retries. `Ok(None)` when the job is unknown (404).
    pub async fn status(&self, handle: &JobHandle) -> Result<Option<serde_json::Value>> {
        let reply = self.transport.get(&["api", "jobs", &handle.job_id]).await?;
        if reply.status == 404 {
            return Ok(None);
        }
        if !reply.is_success() {
            return Err(Error::backend(reply.status, reply.body));
        }
        Ok(Some(reply.json()?))
    }

    /// `None` when `deadline` passes while the request is in flight.
    async fn poll_before(&self, deadline: Option<Instant>, handle: &JobHandle) -> Option<PollStep> {
        match deadline {
            Some(d) => tokio::time::timeout_at(d, self.poll_once(handle)).await.ok(),
            None => Some(self.poll_once(handle).await),
        }
    }

    async fn poll_once(&self, handle: &JobHandle) -> PollStep {
        let reply = match self.transport.get(&["api", "jobs", &handle.job_id]).await {
            Ok(r) => r,
            Err(e) => return PollStep::Retry(e.to_string()),
        };
        if reply.status == 404 {
            return PollStep::Done(JobOutcome::NotFound);
        }
        if !reply.is_success() {
            let outcome = match reply.json() {
                Ok(v) if v.is_object() => JobOutcome::Failed(v),
                _ => JobOutcome::Failed(json!({ "error": reply.body.clone() })),
            };
            // Keep the response text when the object names no error field.
            return match outcome.failure_detail() {
                Some(_) => PollStep::Done(outcome),
                None => PollStep::Done(JobOutcome::Failed(json!({ "error": reply.body }))),
            };
        }
        let body = match reply.json() {
            Ok(v) => v,
            Err(e) => return PollStep::Retry(e.to_string()),
        };
        match JobStatus::from_body(&body) {
            JobStatus::Completed => PollStep::Done(JobOutcome::Completed(body)),
            JobStatus::Failed => PollStep::Done(JobOutcome::Failed(body)),
            other => PollStep::Waiting(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;

    fn poller_for(base_url: &str, interval_ms: u64, timeout_ms: u64) -> JobPoller {
        let mut config = ClientConfig::new(base_url);
        config.poll_interval = Duration::from_millis(interval_ms);
        config.job_timeout = Duration::from_millis(timeout_ms);
        config.http_timeout = Duration::from_millis(100);
        let transport = HttpTransport::new(&config, Credentials::anonymous()).unwrap();
        JobPoller::new(Arc::new(transport), &config)
    }

    #[test]
    fn attempts_follow_interval_and_timeout() {
        let p = poller_for("http://127.0.0.1:1", 2_000, 120_000);
        assert_eq!(p.max_attempts(), 60);
        let p = poller_for("http://127.0.0.1:1", 500, 100);
        assert_eq!(p.max_attempts(), 1);
    }

    #[tokio::test]
    async fn unreachable_backend_ends_in_timeout() {
        let p = poller_for("http://127.0.0.1:1", 20, 150);
        let started = std::time::Instant::now();
        let outcome = p
            .poll(&JobHandle::new("j1"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, JobOutcome::Timeout);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn huge_timeout_relies_on_attempt_cap() {
        let mut config = ClientConfig::new("http://127.0.0.1:1");
        config.poll_interval = Duration::from_secs(u64::MAX / 2);
        config.job_timeout = Duration::from_secs(u64::MAX);
        config.http_timeout = Duration::from_millis(100);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_poll_attempts(), 2);

        let transport = HttpTransport::new(&config, Credentials::anonymous()).unwrap();
        let p = JobPoller::new(Arc::new(transport), &config);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });
        // Would panic on the first deadline computation if it overflowed.
        let result = p.poll(&JobHandle::new("j1"), &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_token_returns_immediately() {
        let p = poller_for("http://127.0.0.1:1", 20, 5_000);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = p.poll(&JobHandle::new("j1"), &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
