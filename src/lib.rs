//! # post-ai-client
//!
//! Async client for the blog backend: AI translation and summarization of
//! posts, authentication, bookmarks and runtime translations.
//!
//! ## Overview
//!
//! The AI endpoints answer either synchronously or with `202 Accepted` and a
//! job id. [`PostAiClient`] hides the difference: deferred work is polled at a
//! fixed interval until the job completes, fails, disappears or runs past its
//! deadline, with a one-shot cache refetch when a finished job carries no
//! result. Callers get a result or `None`; failure detail goes to a
//! [`Notifier`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use post_ai_client::{MemoryTokenStore, PostAiClient, SummarizeOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> post_ai_client::Result<()> {
//!     let client = PostAiClient::builder()
//!         .base_url("https://blog.example")
//!         .token_store(Arc::new(MemoryTokenStore::with_token("jwt")))
//!         .build()?;
//!
//!     if let Some(out) = client.translate_post("42").await {
//!         let opts = out
//!             .text()
//!             .map(SummarizeOptions::from_source_text)
//!             .unwrap_or_default();
//!         let summary = client.summarize_post("42", &opts).await;
//!         println!("{:?}", summary.and_then(|s| s.text().map(String::from)));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Submission, job resolution and the client builder |
//! | [`jobs`] | Job status normalization and the poll loop |
//! | [`auth`] | Token stores, CSRF and `/auth/*` calls |
//! | [`bookmarks`] | Bookmark registry and toggle/lookup calls |
//! | [`i18n`] | Runtime dictionaries and interpolation |
//! | [`notify`] | User-visible notices |
//! | [`config`] | Client configuration |
//! | [`transport`] | Shared HTTP transport |

pub mod auth;
pub mod bookmarks;
pub mod client;
pub mod config;
pub mod i18n;
pub mod jobs;
pub mod notify;
pub mod transport;

// Re-export main types for convenience
pub use auth::{
    AuthClient, Credentials, KeyringTokenStore, MemoryTokenStore, StaticCsrf, TokenStore,
};
pub use bookmarks::{BookmarkClient, BookmarkKey, BookmarkState, BookmarkStore, ToggleOutcome};
pub use client::{
    OperationKind, OperationOutput, OperationRequest, PostAiClient, PostAiClientBuilder,
    ResultOrigin, SummarizeOptions,
};
pub use config::{ClientConfig, UnknownStatusPolicy};
pub use jobs::{JobHandle, JobOutcome, JobPoller, JobStatus};
pub use notify::{
    InMemoryNotifier, LocalizedNotifier, Notice, NoticeLevel, Notifier, TracingNotifier,
};
pub use tokio_util::sync::CancellationToken;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
