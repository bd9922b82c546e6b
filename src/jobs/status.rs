use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a deferred backend job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }

    /// Read `job_id` from a 202 body. Numeric ids are accepted; blank ids are not.
    pub fn from_queue_body(body: &serde_json::Value) -> Option<Self> {
        let id = match body.get("job_id")? {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if id.is_empty() {
            None
        } else {
            Some(Self::new(id))
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.job_id)
    }
}

/// Job status as reported by `GET /api/jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// Anything else, kept normalized (trimmed, lowercase).
    Unknown(String),
}

impl JobStatus {
    /// The one place status strings are interpreted.
    pub fn normalize(raw: &str) -> Self {
        let s = raw.trim().to_ascii_lowercase();
        match s.as_str() {
            "pending" | "queued" => JobStatus::Pending,
            "running" | "in_progress" | "processing" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unknown(s),
        }
    }

    /// Status of a job-status body; a missing or non-string field is `Unknown("")`.
    pub fn from_body(body: &serde_json::Value) -> Self {
        match body.get("status").and_then(|v| v.as_str()) {
            Some(raw) => Self::normalize(raw),
            None => JobStatus::Unknown(String::new()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown(s) => s,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Status body of the completed job.
    Completed(serde_json::Value),
    /// Status body, or `{"error": <response text>}` for a non-2xx status reply.
    Failed(serde_json::Value),
    Timeout,
    NotFound,
}

impl JobOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            JobOutcome::Completed(_) => "completed",
            JobOutcome::Failed(_) => "failed",
            JobOutcome::Timeout => "timeout",
            JobOutcome::NotFound => "not_found",
        }
    }

    /// Backend-supplied failure message, if any.
    pub fn failure_detail(&self) -> Option<String> {
        let body = match self {
            JobOutcome::Failed(body) => body,
            _ => return None,
        };
        ["error", "detail", "message"]
            .iter()
            .filter_map(|k| body.get(*k).and_then(|v| v.as_str()))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from)
    }
}
