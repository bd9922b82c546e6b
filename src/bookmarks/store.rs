use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const KEY_DELIMITER: &str = "::";

/// Bookmark target, e.g. `post::42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookmarkKey {
    target_type: String,
    target_id: String,
}

impl BookmarkKey {
    /// Trims both parts and lowercases the type. `None` if either part is empty.
    pub fn new(target_type: &str, target_id: &str) -> Option<Self> {
        let target_type = target_type.trim().to_lowercase();
        let target_id = target_id.trim().to_string();
        if target_type.is_empty() || target_id.is_empty() {
            return None;
        }
        Some(Self {
            target_type,
            target_id,
        })
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

impl fmt::Display for BookmarkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.target_type, KEY_DELIMITER, self.target_id)
    }
}

/// Server-side facts about an existing bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkState {
    #[serde(default)]
    pub bookmark_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Something that renders the bookmark state of one key, such as a toggle button.
pub trait ToggleObserver: Send + Sync {
    /// Called with `Some` when bookmarked, `None` otherwise.
    fn apply(&self, key: &BookmarkKey, state: Option<&BookmarkState>);
}

/// Minimal observer recording the last applied state.
#[derive(Debug, Default)]
pub struct ToggleFlag {
    active: AtomicBool,
    bookmark_id: Mutex<Option<String>>,
}

impl ToggleFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn bookmark_id(&self) -> Option<String> {
        self.bookmark_id
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ToggleObserver for ToggleFlag {
    fn apply(&self, _key: &BookmarkKey, state: Option<&BookmarkState>) {
        self.active.store(state.is_some(), Ordering::SeqCst);
        *self.bookmark_id.lock().unwrap_or_else(|e| e.into_inner()) =
            state.and_then(|s| s.bookmark_id.clone());
    }
}

#[derive(Default)]
struct Inner {
    states: HashMap<BookmarkKey, BookmarkState>,
    observers: HashMap<BookmarkKey, Vec<Arc<dyn ToggleObserver>>>,
    in_flight: HashSet<BookmarkKey>,
}

/// Owned registry of bookmark state and the observers of each key.
///
/// Every mutation re-applies the new state to all observers of the key.
/// Observers are called after the internal lock is released.
#[derive(Default)]
pub struct BookmarkStore {
    inner: Mutex<Inner>,
}

impl BookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an observer for `key` and apply the current state to it.
    /// Registering the same observer twice has no effect.
    pub fn register(&self, key: &BookmarkKey, observer: Arc<dyn ToggleObserver>) {
        let state = {
            let mut inner = self.lock();
            let list = inner.observers.entry(key.clone()).or_default();
            if !list.iter().any(|o| Arc::ptr_eq(o, &observer)) {
                list.push(observer.clone());
            }
            inner.states.get(key).cloned()
        };
        observer.apply(key, state.as_ref());
    }

    pub fn observer_count(&self, key: &BookmarkKey) -> usize {
        self.lock().observers.get(key).map(Vec::len).unwrap_or(0)
    }

    /// Keys that have at least one observer.
    pub fn registered_keys(&self) -> Vec<BookmarkKey> {
        let mut keys: Vec<_> = self.lock().observers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn is_bookmarked(&self, key: &BookmarkKey) -> bool {
        self.lock().states.contains_key(key)
    }

    pub fn state(&self, key: &BookmarkKey) -> Option<BookmarkState> {
        self.lock().states.get(key).cloned()
    }

    pub fn set(&self, key: &BookmarkKey, state: BookmarkState) {
        let observers = {
            let mut inner = self.lock();
            inner.states.insert(key.clone(), state.clone());
            inner.observers.get(key).cloned().unwrap_or_default()
        };
        for o in observers {
            o.apply(key, Some(&state));
        }
    }

    pub fn remove(&self, key: &BookmarkKey) {
        let observers = {
            let mut inner = self.lock();
            inner.states.remove(key);
            inner.observers.get(key).cloned().unwrap_or_default()
        };
        for o in observers {
            o.apply(key, None);
        }
    }

    /// Mark `key` busy. `None` if an operation on it is already running.
    pub(crate) fn begin(&self, key: &BookmarkKey) -> Option<InFlight<'_>> {
        if self.lock().in_flight.insert(key.clone()) {
            Some(InFlight {
                store: self,
                key: key.clone(),
            })
        } else {
            None
        }
    }

    pub fn is_busy(&self, key: &BookmarkKey) -> bool {
        self.lock().in_flight.contains(key)
    }
}

/// Clears the busy mark on drop.
pub(crate) struct InFlight<'a> {
    store: &'a BookmarkStore,
    key: BookmarkKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.store.lock().in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> BookmarkKey {
        BookmarkKey::new("Post", id).unwrap()
    }

    #[test]
    fn key_normalization() {
        let k = BookmarkKey::new("  POST ", " 42 ").unwrap();
        assert_eq!(k.to_string(), "post::42");
        assert!(BookmarkKey::new("", "1").is_none());
        assert!(BookmarkKey::new("post", "  ").is_none());
    }

    #[test]
    fn mutations_reach_every_observer() {
        let store = BookmarkStore::new();
        let a = Arc::new(ToggleFlag::new());
        let b = Arc::new(ToggleFlag::new());
        store.register(&key("1"), a.clone());
        store.register(&key("1"), b.clone());
        store.register(&key("1"), a.clone());
        assert_eq!(store.observer_count(&key("1")), 2);

        store.set(
            &key("1"),
            BookmarkState {
                bookmark_id: Some("bm-9".into()),
                ..Default::default()
            },
        );
        assert!(a.is_active() && b.is_active());
        assert_eq!(b.bookmark_id().as_deref(), Some("bm-9"));

        store.remove(&key("1"));
        assert!(!a.is_active() && !b.is_active());
        assert_eq!(a.bookmark_id(), None);
    }

    #[test]
    fn late_observer_sees_current_state() {
        let store = BookmarkStore::new();
        store.set(&key("2"), BookmarkState::default());
        let flag = Arc::new(ToggleFlag::new());
        store.register(&key("2"), flag.clone());
        assert!(flag.is_active());
    }

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let store = BookmarkStore::new();
        let k = key("3");
        let guard = store.begin(&k).unwrap();
        assert!(store.begin(&k).is_none());
        assert!(store.is_busy(&k));
        drop(guard);
        assert!(!store.is_busy(&k));
        assert!(store.begin(&k).is_some());
    }
}
