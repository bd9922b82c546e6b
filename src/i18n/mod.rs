//! Runtime translations.
//!
//! Two flat `key -> string` dictionaries are kept: the active language and an
//! English fallback. Lookups go active, then fallback, then the key itself.
//! Dictionaries are swapped atomically, so lookups never wait on a reload.

use crate::transport::HttpTransport;
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const FALLBACK_LANGUAGE: &str = "en";

pub type Dictionary = HashMap<String, String>;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Replace `{name}` with `params[name]`; unknown names become empty.
pub fn interpolate(template: &str, params: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            params.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Handle returned by [`Translator::on_language_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

struct Dictionaries {
    language: String,
    active: Dictionary,
    fallback: Dictionary,
}

pub struct Translator {
    transport: Option<Arc<HttpTransport>>,
    dicts: ArcSwap<Dictionaries>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl Translator {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self::build(Some(transport), FALLBACK_LANGUAGE, Dictionary::new(), Dictionary::new())
    }

    /// A translator with fixed dictionaries and no network access.
    pub fn with_dictionaries(language: &str, active: Dictionary, fallback: Dictionary) -> Self {
        Self::build(None, language, active, fallback)
    }

    fn build(
        transport: Option<Arc<HttpTransport>>,
        language: &str,
        active: Dictionary,
        fallback: Dictionary,
    ) -> Self {
        Self {
            transport,
            dicts: ArcSwap::from_pointee(Dictionaries {
                language: language.to_string(),
                active,
                fallback,
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    pub fn language(&self) -> String {
        self.dicts.load().language.clone()
    }

    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &HashMap::new())
    }

    pub fn t_with(&self, key: &str, params: &HashMap<&str, String>) -> String {
        let dicts = self.dicts.load();
        let raw = dicts
            .active
            .get(key)
            .or_else(|| dicts.fallback.get(key))
            .map(String::as_str)
            .unwrap_or(key);
        interpolate(raw, params)
    }

    /// Translate `key`, using `default` when neither dictionary has it.
    pub fn t_or(&self, key: &str, default: &str) -> String {
        self.t_or_with(key, default, &HashMap::new())
    }

    /// Like [`Self::t_or`], interpolating `params` into a found entry.
    /// `default` is returned as is.
    pub fn t_or_with(&self, key: &str, default: &str, params: &HashMap<&str, String>) -> String {
        let dicts = self.dicts.load();
        match dicts.active.get(key).or_else(|| dicts.fallback.get(key)) {
            Some(raw) => interpolate(raw, params),
            None => default.to_string(),
        }
    }

    /// Load `/i18n/{lang}.json` and the fallback dictionary, swap them in and
    /// notify listeners. A dictionary that fails to load is treated as empty.
    pub async fn set_language(&self, lang: &str) {
        let lang = lang.trim();
        let (active, fallback) = match &self.transport {
            Some(t) => {
                futures::join!(
                    fetch_dictionary(t, lang),
                    fetch_dictionary(t, FALLBACK_LANGUAGE)
                )
            }
            None => (Dictionary::new(), Dictionary::new()),
        };
        self.replace(lang, active, fallback);
    }

    /// Swap in new dictionaries and notify listeners.
    pub fn replace(&self, lang: &str, active: Dictionary, fallback: Dictionary) {
        self.dicts.store(Arc::new(Dictionaries {
            language: lang.to_string(),
            active,
            fallback,
        }));
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for l in listeners {
            l(lang);
        }
    }

    pub fn on_language_changed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }
}

async fn fetch_dictionary(transport: &HttpTransport, lang: &str) -> Dictionary {
    let file = format!("{}.json", lang);
    match transport.get(&["i18n", &file]).await {
        Ok(reply) if reply.is_success() => match serde_json::from_str::<Dictionary>(&reply.body) {
            Ok(dict) => {
                debug!(lang, entries = dict.len(), "dictionary loaded");
                dict
            }
            Err(e) => {
                warn!(lang, error = %e, "dictionary is not a flat string map");
                Dictionary::new()
            }
        },
        Ok(reply) => {
            warn!(lang, status = reply.status, "dictionary request failed");
            Dictionary::new()
        }
        Err(e) => {
            warn!(lang, error = %e, "dictionary request failed");
            Dictionary::new()
        }
    }
}
