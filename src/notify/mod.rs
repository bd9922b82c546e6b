//! User-visible notices.
//!
//! The client never returns failure detail to UI callers; it reports a short,
//! typed [`Notice`] to a [`Notifier`] instead. What a notifier does with it
//! (toast, status bar, log line) is up to the application.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Notifier`] | Trait for notice destinations |
//! | [`NoopNotifier`] | Drops everything |
//! | [`TracingNotifier`] | Emits notices as tracing events |
//! | [`InMemoryNotifier`] | Bounded buffer, for tests and polling UIs |
//! | [`CompositeNotifier`] | Fans out to several notifiers |
//! | [`LocalizedNotifier`] | Resolves `toast.*` keys before delivery |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};

mod localized;

pub use localized::LocalizedNotifier;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Ok,
    Warn,
    Err,
    Info,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Ok => "ok",
            NoticeLevel::Warn => "warn",
            NoticeLevel::Err => "err",
            NoticeLevel::Info => "info",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, NoticeLevel::Warn | NoticeLevel::Err)
    }
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient message for the user.
///
/// `message` is always displayable English. A notice may also carry a
/// dictionary `key` (`toast.*`) and `params` for its `{name}` placeholders;
/// [`LocalizedNotifier`] uses them to swap in the active language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            key: None,
            params: BTreeMap::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Ok, message)
    }
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warn, message)
    }
    pub fn err(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Err, message)
    }
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }
}

/// Notice destination. Delivery is best effort; nothing is returned.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice);
}

/// Drops every notice.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _: Notice) {}
}

/// Returns a no-op notifier.
pub fn noop_notifier() -> Arc<dyn Notifier> {
    Arc::new(NoopNotifier)
}

/// Emits notices as `tracing` events under the `post_ai_client::notice` target.
#[derive(Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Err => {
                tracing::error!(target: "post_ai_client::notice", level = %notice.level, "{}", notice.message)
            }
            NoticeLevel::Warn => {
                tracing::warn!(target: "post_ai_client::notice", level = %notice.level, "{}", notice.message)
            }
            NoticeLevel::Ok | NoticeLevel::Info => {
                tracing::info!(target: "post_ai_client::notice", level = %notice.level, "{}", notice.message)
            }
        }
    }
}

/// In-memory notifier keeping the most recent `max` notices.
pub struct InMemoryNotifier {
    notices: RwLock<VecDeque<Notice>>,
    max_notices: usize,
}

impl InMemoryNotifier {
    pub fn new(max: usize) -> Self {
        Self {
            notices: RwLock::new(VecDeque::new()),
            max_notices: max.max(1),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        let guard = self.notices.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().cloned().collect()
    }

    pub fn count_level(&self, level: NoticeLevel) -> usize {
        let guard = self.notices.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().filter(|n| n.level == level).count()
    }

    /// Notices at `warn` or `err`.
    pub fn failures(&self) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.level.is_failure())
            .collect()
    }

    /// Removes and returns every buffered notice.
    pub fn drain(&self) -> Vec<Notice> {
        let mut guard = self.notices.write().unwrap_or_else(|e| e.into_inner());
        guard.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, notice: Notice) {
        let mut guard = self.notices.write().unwrap_or_else(|e| e.into_inner());
        guard.push_back(notice);
        while guard.len() > self.max_notices {
            guard.pop_front();
        }
    }
}

/// Composite notifier for multiple destinations.
pub struct CompositeNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }
    pub fn add(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }
}

impl Default for CompositeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    async fn notify(&self, notice: Notice) {
        for n in &self.notifiers {
            n.notify(notice.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_keeps_latest() {
        let sink = InMemoryNotifier::new(2);
        sink.notify(Notice::info("one")).await;
        sink.notify(Notice::ok("two")).await;
        sink.notify(Notice::err("three")).await;
        let msgs: Vec<_> = sink.notices().into_iter().map(|n| n.message).collect();
        assert_eq!(msgs, vec!["two", "three"]);
        assert_eq!(sink.failures().len(), 1);
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn composite_fans_out() {
        let a = Arc::new(InMemoryNotifier::default());
        let b = Arc::new(InMemoryNotifier::default());
        let composite = CompositeNotifier::new()
            .add(a.clone())
            .add(b.clone())
            .add(noop_notifier());
        composite.notify(Notice::warn("careful")).await;
        assert_eq!(a.count_level(NoticeLevel::Warn), 1);
        assert_eq!(b.count_level(NoticeLevel::Warn), 1);
    }

    #[test]
    fn level_serializes_lowercase() {
        let json = serde_json::to_string(&Notice::ok("done")).unwrap();
        assert_eq!(json, r#"{"level":"ok","message":"done"}"#);

        let keyed = Notice::err("Saved").with_key("toast.saved").with_param("n", "1");
        let json = serde_json::to_string(&keyed).unwrap();
        assert_eq!(
            json,
            r#"{"level":"err","message":"Saved","key":"toast.saved","params":{"n":"1"}}"#
        );
    }

    #[test]
    fn shared_sink_through_trait_object() {
        let sink = Arc::new(InMemoryNotifier::default());
        let notifier: Arc<dyn Notifier> = sink.clone();
        tokio_test::block_on(async {
            notifier.notify(Notice::err("boom")).await;
            TracingNotifier.notify(Notice::info("logged only")).await;
        });
        assert_eq!(sink.failures().len(), 1);
    }
}
