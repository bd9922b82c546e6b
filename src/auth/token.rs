//! Token and CSRF sources.

use crate::{Error, Result};
use keyring::Entry;
use std::sync::RwLock;

/// Owner of the single active auth token.
///
/// Reads never fail: a store that cannot be read reports no token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;

    fn has_token(&self) -> bool {
        self.get().is_some()
    }
}

fn non_empty(token: String) -> Option<String> {
    let t = token.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Process-local token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(non_empty(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = non_empty(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Token persisted in the platform keyring, surviving restarts.
pub struct KeyringTokenStore {
    service: String,
    account: String,
}

impl KeyringTokenStore {
    pub const DEFAULT_SERVICE: &'static str = "post-ai-client";

    pub fn new(account: impl Into<String>) -> Self {
        Self {
            service: Self::DEFAULT_SERVICE.to_string(),
            account: account.into(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, &self.account).map_err(|e| Error::TokenStore(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Option<String> {
        let entry = self.entry().ok()?;
        entry.get_password().ok().and_then(non_empty)
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token.trim())
            .map_err(|e| Error::TokenStore(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::TokenStore(e.to_string())),
        }
    }
}

/// Source of the anti-forgery token sent as `X-CSRF-Token`.
pub trait CsrfSource: Send + Sync {
    fn csrf_token(&self) -> Option<String>;
}

/// A CSRF value captured once, e.g. from the `csrf_token` cookie.
pub struct StaticCsrf(Option<String>);

impl StaticCsrf {
    pub fn new(value: impl Into<String>) -> Self {
        Self(non_empty(value.into()))
    }

    /// Pick `csrf_token` out of a `Cookie` header value (`a=1; csrf_token=xyz`).
    pub fn from_cookie_header(header: &str) -> Self {
        let value = header
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix("csrf_token="))
            .map(|v| v.to_string());
        Self(value.and_then(non_empty))
    }
}

impl CsrfSource for StaticCsrf {
    fn csrf_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(!store.has_token());
        store.save("abc").unwrap();
        assert_eq!(store.get().as_deref(), Some("abc"));
        store.save("def").unwrap();
        assert_eq!(store.get().as_deref(), Some("def"));
        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn blank_token_counts_as_absent() {
        let store = MemoryTokenStore::with_token("   ");
        assert!(!store.has_token());
    }

    #[test]
    fn csrf_from_cookie_header() {
        let csrf = StaticCsrf::from_cookie_header("theme=dark; csrf_token=tok123; x=y");
        assert_eq!(csrf.csrf_token().as_deref(), Some("tok123"));
        let none = StaticCsrf::from_cookie_header("theme=dark");
        assert!(none.csrf_token().is_none());
    }
}
