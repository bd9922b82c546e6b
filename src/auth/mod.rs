//! Authentication plumbing: token persistence, CSRF, request headers and the
//! `/auth/*` endpoints.

mod client;
mod token;

pub use client::{Account, AuthClient};
pub use token::{CsrfSource, KeyringTokenStore, MemoryTokenStore, StaticCsrf, TokenStore};

use std::sync::Arc;

pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Token store plus optional CSRF source, shared by every request.
#[derive(Clone)]
pub struct Credentials {
    tokens: Arc<dyn TokenStore>,
    csrf: Option<Arc<dyn CsrfSource>>,
}

impl Credentials {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens, csrf: None }
    }

    pub fn with_csrf(mut self, csrf: Arc<dyn CsrfSource>) -> Self {
        self.csrf = Some(csrf);
        self
    }

    /// Credentials with an empty in-memory store.
    pub fn anonymous() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    pub fn has_token(&self) -> bool {
        self.tokens.has_token()
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Headers for the current request: `Authorization: Bearer <token>` and
    /// `X-CSRF-Token`, each only when a value is available.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::with_capacity(2);
        if let Some(t) = self.tokens.get() {
            headers.push(("Authorization", format!("Bearer {}", t)));
        }
        if let Some(csrf) = self.csrf.as_ref().and_then(|c| c.csrf_token()) {
            headers.push((CSRF_HEADER, csrf));
        }
        headers
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_only_include_present_values() {
        let creds = Credentials::anonymous();
        assert!(creds.headers().is_empty());

        let creds = Credentials::new(Arc::new(MemoryTokenStore::with_token("t0k")))
            .with_csrf(Arc::new(StaticCsrf::new("c5rf")));
        let headers = creds.headers();
        assert_eq!(
            headers,
            vec![
                ("Authorization", "Bearer t0k".to_string()),
                (CSRF_HEADER, "c5rf".to_string()),
            ]
        );
    }
}
