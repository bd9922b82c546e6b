//! Operation descriptors and outputs for the AI endpoints.

use crate::notify::Notice;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Which AI endpoint an operation targets. Each kind fixes the submission
/// path, the result-field priority and the cache-refetch field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Translate,
    Summarize,
}

impl OperationKind {
    /// Last path segment of `POST /api/posts/{id}/<segment>`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            OperationKind::Translate => "translate",
            OperationKind::Summarize => "summarize",
        }
    }

    /// Fields of a completed job body that may carry the result, best first.
    pub fn result_fields(&self) -> &'static [&'static str] {
        match self {
            OperationKind::Translate => &["body_trans_md", "translated_text", "result"],
            OperationKind::Summarize => &["summary_md", "summary", "result"],
        }
    }

    /// Field of a synchronous reply that carries the result.
    pub fn cache_field(&self) -> &'static str {
        match self {
            OperationKind::Translate => "translated_text",
            OperationKind::Summarize => "summary",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            OperationKind::Translate => "Translation",
            OperationKind::Summarize => "Summarization",
        }
    }

    pub(crate) fn success_notice(&self) -> Notice {
        match self {
            OperationKind::Translate => Notice::ok("Post translated").with_key("toast.translated"),
            OperationKind::Summarize => Notice::ok("Post summarized").with_key("toast.summarized"),
        }
    }

    pub(crate) fn queued_notice(&self) -> Notice {
        match self {
            OperationKind::Translate => {
                Notice::info("Translation queued, this can take a moment")
                    .with_key("toast.translate_queued")
            }
            OperationKind::Summarize => {
                Notice::info("Summarization queued, this can take a moment")
                    .with_key("toast.summarize_queued")
            }
        }
    }

    pub fn extract_result(&self, body: &serde_json::Value) -> Option<String> {
        self.result_fields()
            .iter()
            .find_map(|field| non_empty_str(body, field))
    }

    /// Non-empty [`Self::cache_field`] of a synchronous reply.
    pub fn extract_cached(&self, body: &serde_json::Value) -> Option<String> {
        non_empty_str(body, self.cache_field())
    }
}

fn non_empty_str(body: &serde_json::Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// Options for summarization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeOptions {
    /// Summarize this text instead of the stored post body, e.g. a translation
    /// obtained earlier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl SummarizeOptions {
    pub fn from_source_text(text: impl Into<String>) -> Self {
        Self {
            source_text: Some(text.into()),
        }
    }
}

/// One submission: kind, target post and JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub post_id: String,
    pub payload: serde_json::Value,
}

impl OperationRequest {
    pub fn translate(post_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Translate,
            post_id: post_id.into(),
            payload: json!({}),
        }
    }

    pub fn summarize(post_id: impl Into<String>, options: &SummarizeOptions) -> Self {
        let payload = match options.source_text.as_deref() {
            Some(text) if !text.trim().is_empty() => json!({ "source_text": text }),
            _ => json!({}),
        };
        Self {
            kind: OperationKind::Summarize,
            post_id: post_id.into(),
            payload,
        }
    }
}

/// Where an operation's result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    /// Synchronous 2xx reply to the submission.
    Immediate,
    /// Result field of a completed job.
    Job,
    /// Second submission after the job completed without a result field.
    CacheRefetch,
}

/// Successful operation result.
///
/// `payload` is the synchronous reply body unchanged, or `{translated_text}` /
/// `{summary}` built from a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutput {
    pub kind: OperationKind,
    pub origin: ResultOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub payload: serde_json::Value,
}

impl OperationOutput {
    pub(crate) fn immediate(kind: OperationKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            origin: ResultOrigin::Immediate,
            job_id: None,
            payload,
        }
    }

    pub(crate) fn from_job(kind: OperationKind, job_id: &str, text: String) -> Self {
        let mut payload = serde_json::Map::new();
        payload.insert(kind.cache_field().to_string(), serde_json::Value::String(text));
        Self {
            kind,
            origin: ResultOrigin::Job,
            job_id: Some(job_id.to_string()),
            payload: serde_json::Value::Object(payload),
        }
    }

    pub(crate) fn refetched(kind: OperationKind, job_id: &str, payload: serde_json::Value) -> Self {
        Self {
            kind,
            origin: ResultOrigin::CacheRefetch,
            job_id: Some(job_id.to_string()),
            payload,
        }
    }

    /// The translated text or summary, when the payload carries one.
    pub fn text(&self) -> Option<&str> {
        self.payload.get(self.kind.cache_field()).and_then(|v| v.as_str())
    }
}
