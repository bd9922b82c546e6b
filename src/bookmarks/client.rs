use super::store::{BookmarkKey, BookmarkState, BookmarkStore};
use crate::notify::{Notice, Notifier};
use crate::transport::{HttpReply, HttpTransport};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a toggle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added(BookmarkState),
    Removed,
    /// Another toggle of the same key was still running; nothing was sent.
    Busy,
}

#[derive(Debug, Deserialize)]
struct LookupItem {
    target_id: serde_json::Value,
    #[serde(default)]
    bookmark_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LookupReply {
    #[serde(default)]
    items: Vec<LookupItem>,
}

/// Bookmark calls against `/bookmarks`, keeping a [`BookmarkStore`] in sync
/// with the server.
#[derive(Clone)]
pub struct BookmarkClient {
    transport: Arc<HttpTransport>,
    store: Arc<BookmarkStore>,
    notifier: Arc<dyn Notifier>,
}

impl BookmarkClient {
    pub fn new(
        transport: Arc<HttpTransport>,
        store: Arc<BookmarkStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            store,
            notifier,
        }
    }

    pub fn store(&self) -> &Arc<BookmarkStore> {
        &self.store
    }

    /// Flip the bookmark for `key`, reporting the result to the notifier.
    /// `None` on failure.
    pub async fn toggle(&self, key: &BookmarkKey) -> Option<ToggleOutcome> {
        match self.try_toggle(key).await {
            Ok(outcome) => {
                let notice = match &outcome {
                    ToggleOutcome::Added(_) => {
                        Some(Notice::ok("Bookmarked").with_key("toast.bookmarked"))
                    }
                    ToggleOutcome::Removed => {
                        Some(Notice::ok("Removed from bookmarks").with_key("toast.bookmark_removed"))
                    }
                    ToggleOutcome::Busy => None,
                };
                if let Some(notice) = notice {
                    self.notifier.notify(notice).await;
                }
                Some(outcome)
            }
            Err(e) => {
                warn!(%key, error = %e, "bookmark toggle failed");
                let notice = match e {
                    Error::Unauthenticated => {
                        Notice::warn("Sign in to manage bookmarks").with_key("toast.login_to_bookmark")
                    }
                    ref other => other.notice("Bookmark action"),
                };
                self.notifier.notify(notice).await;
                None
            }
        }
    }

    pub async fn try_toggle(&self, key: &BookmarkKey) -> Result<ToggleOutcome> {
        if !self.transport.credentials().has_token() {
            return Err(Error::Unauthenticated);
        }
        let Some(_guard) = self.store.begin(key) else {
            debug!(%key, "toggle already in flight");
            return Ok(ToggleOutcome::Busy);
        };

        if self.store.is_bookmarked(key) {
            let reply = self
                .transport
                .delete(
                    &["bookmarks"],
                    &[("target_type", key.target_type()), ("target_id", key.target_id())],
                )
                .await?;
            check(reply, "Failed to remove bookmark")?;
            self.store.remove(key);
            Ok(ToggleOutcome::Removed)
        } else {
            let body = json!({ "target_type": key.target_type(), "target_id": key.target_id() });
            let reply = self.transport.post_json(&["bookmarks"], &body).await?;
            let reply = check(reply, "Failed to bookmark")?;
            let data = reply.json().unwrap_or(serde_json::Value::Null);
            let state = BookmarkState {
                bookmark_id: data.get("id").and_then(value_to_string),
                tags: data
                    .get("tags")
                    .and_then(|v| v.as_array())
                    .map(|tags| {
                        tags.iter()
                            .filter_map(|t| t.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default(),
                created_at: data
                    .get("created_at")
                    .and_then(|v| v.as_str())
                    .map(String::from),
            };
            self.store.set(key, state.clone());
            Ok(ToggleOutcome::Added(state))
        }
    }

    /// Refresh the state of `keys` from the server.
    ///
    /// Signed out: every given key is cleared. Keys missing from a lookup reply
    /// are cleared; failed lookups are logged and leave state as it was.
    pub async fn sync(&self, keys: &[BookmarkKey]) {
        if !self.transport.credentials().has_token() {
            for key in keys {
                self.store.remove(key);
            }
            return;
        }

        let mut by_type: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for key in keys {
            let ids = by_type.entry(key.target_type()).or_default();
            if !ids.contains(&key.target_id()) {
                ids.push(key.target_id());
            }
        }

        let lookups = by_type
            .into_iter()
            .map(|(target_type, ids)| self.sync_type(target_type, ids));
        futures::future::join_all(lookups).await;
    }

    /// Sync every key that has a registered observer.
    pub async fn sync_registered(&self) {
        let keys = self.store.registered_keys();
        self.sync(&keys).await;
    }

    async fn sync_type(&self, target_type: &str, ids: Vec<&str>) {
        if ids.is_empty() {
            return;
        }
        let joined = ids.join(",");
        let reply = match self
            .transport
            .get_query(
                &["bookmarks", "lookup"],
                &[("target_type", target_type), ("target_ids", joined.as_str())],
            )
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(target_type, error = %e, "bookmark lookup error");
                return;
            }
        };

        let keys = ids.iter().filter_map(|id| BookmarkKey::new(target_type, id));
        if reply.status == 401 {
            for key in keys {
                self.store.remove(&key);
            }
            return;
        }
        if !reply.is_success() {
            warn!(target_type, status = reply.status, body = %reply.body, "bookmark lookup failed");
            return;
        }

        let data: LookupReply = serde_json::from_str(&reply.body).unwrap_or_default();
        let mut seen = HashSet::new();
        for item in data.items {
            let Some(id) = value_to_string(&item.target_id) else {
                continue;
            };
            let Some(key) = BookmarkKey::new(target_type, &id) else {
                continue;
            };
            self.store.set(
                &key,
                BookmarkState {
                    bookmark_id: item.bookmark_id,
                    tags: item.tags,
                    created_at: item.created_at,
                },
            );
            seen.insert(key);
        }
        for key in keys {
            if !seen.contains(&key) {
                self.store.remove(&key);
            }
        }
    }
}

fn check(reply: HttpReply, fallback: &str) -> Result<HttpReply> {
    if reply.status == 401 {
        return Err(Error::SessionExpired);
    }
    if !reply.is_success() {
        let detail = if reply.body.trim().is_empty() {
            fallback.to_string()
        } else {
            reply.body
        };
        return Err(Error::backend(reply.status, detail));
    }
    Ok(reply)
}

fn value_to_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
