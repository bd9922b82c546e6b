use crate::notify::Notice;
use thiserror::Error;

/// Structured error context for configuration and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "auth_client")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the client.
///
/// The first group mirrors the failure taxonomy of an AI operation; the rest
/// are plumbing errors shared by every module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not signed in")]
    Unauthenticated,

    #[error("session expired")]
    SessionExpired,

    #[error("queued response did not carry a job id")]
    MalformedQueueResponse,

    #[error("backend error: HTTP {status}: {detail}")]
    BackendError { status: u16, detail: String },

    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("job {job_id} timed out")]
    JobTimeout { job_id: String },

    #[error("job {job_id} not found")]
    JobNotFound { job_id: String },

    #[error("job {job_id} completed without a usable result")]
    ResultUnavailable { job_id: String },

    #[error("job {job_id} reported unrecognized status {status:?}")]
    UnknownJobStatus { job_id: String, status: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn backend(status: u16, detail: impl Into<String>) -> Self {
        Error::BackendError {
            status,
            detail: detail.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether the error stems from missing or rejected credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Unauthenticated | Error::SessionExpired)
    }

    /// The user-visible notice for this error, prefixed with the failed action
    /// (e.g. "Translation failed").
    ///
    /// Auth problems are warnings; everything else is an error notice. Every
    /// notice carries a `toast.*` key with `action` (and `detail` or `status`
    /// where known) as parameters.
    pub fn notice(&self, action: &str) -> Notice {
        let notice = match self {
            Error::Unauthenticated => {
                Notice::warn(format!("Sign in to use {}", action.to_lowercase()))
                    .with_key("toast.login_required")
            }
            Error::SessionExpired => {
                Notice::warn("Session expired. Please sign in again").with_key("toast.session_expired")
            }
            Error::JobTimeout { .. } => {
                Notice::err(format!("{} timed out", action)).with_key("toast.job_timeout")
            }
            Error::JobNotFound { .. } => {
                Notice::err(format!("{} failed: job no longer exists", action))
                    .with_key("toast.job_not_found")
            }
            Error::ResultUnavailable { .. } => {
                Notice::err(format!("{} failed: result unavailable", action))
                    .with_key("toast.result_unavailable")
            }
            Error::JobFailed(detail) => Notice::err(format!("{} failed: {}", action, detail))
                .with_key("toast.job_failed")
                .with_param("detail", detail.as_str()),
            Error::BackendError { detail, status } => {
                let detail = detail.trim();
                let notice = if detail.is_empty() {
                    Notice::err(format!("{} failed: HTTP {}", action, status))
                } else {
                    Notice::err(format!("{} failed: {}", action, detail))
                        .with_param("detail", detail)
                };
                notice
                    .with_key("toast.request_failed")
                    .with_param("status", status.to_string())
            }
            other => Notice::err(format!("{} failed: {}", action, other))
                .with_key("toast.error")
                .with_param("detail", other.to_string()),
        };
        notice.with_param("action", action)
    }
}
