use crate::auth::{Credentials, CsrfSource, MemoryTokenStore, TokenStore};
use crate::bookmarks::BookmarkStore;
use crate::client::core::PostAiClient;
use crate::config::{ClientConfig, UnknownStatusPolicy};
use crate::i18n::Translator;
use crate::jobs::JobPoller;
use crate::notify::{LocalizedNotifier, Notifier};
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`PostAiClient`].
///
/// Starts from [`ClientConfig::from_env`] unless a config is given; explicit
/// setters win over both.
pub struct PostAiClientBuilder {
    config: Option<ClientConfig>,
    base_url: Option<String>,
    poll_interval: Option<Duration>,
    job_timeout: Option<Duration>,
    unknown_status: Option<UnknownStatusPolicy>,
    tokens: Option<Arc<dyn TokenStore>>,
    csrf: Option<Arc<dyn CsrfSource>>,
    notifier: Option<Arc<dyn Notifier>>,
    localize_notices: bool,
}

impl PostAiClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            base_url: None,
            poll_interval: None,
            job_timeout: None,
            unknown_status: None,
            tokens: None,
            csrf: None,
            notifier: None,
            localize_notices: true,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    pub fn unknown_status(mut self, policy: UnknownStatusPolicy) -> Self {
        self.unknown_status = Some(policy);
        self
    }

    /// Token store. Default is an empty in-memory store.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    pub fn csrf(mut self, csrf: Arc<dyn CsrfSource>) -> Self {
        self.csrf = Some(csrf);
        self
    }

    /// Notice sink. Default is [`crate::notify::TracingNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Resolve `toast.*` notice keys through the client's translator before
    /// they reach the notifier. On by default.
    pub fn localize_notices(mut self, enabled: bool) -> Self {
        self.localize_notices = enabled;
        self
    }

    pub fn build(self) -> Result<PostAiClient> {
        let mut config = self.config.unwrap_or_else(ClientConfig::from_env);
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }
        if let Some(timeout) = self.job_timeout {
            config.job_timeout = timeout;
        }
        if let Some(policy) = self.unknown_status {
            config.unknown_status = policy;
        }
        config.validate()?;

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let mut credentials = Credentials::new(tokens);
        if let Some(csrf) = self.csrf {
            credentials = credentials.with_csrf(csrf);
        }

        let transport = Arc::new(HttpTransport::new(&config, credentials)?);
        let poller = JobPoller::new(transport.clone(), &config);
        let translator = Arc::new(Translator::new(transport.clone()));
        let mut notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(crate::notify::TracingNotifier));
        if self.localize_notices {
            notifier = Arc::new(LocalizedNotifier::new(notifier, translator.clone()));
        }

        Ok(PostAiClient {
            config,
            transport,
            poller,
            notifier,
            bookmarks: Arc::new(BookmarkStore::new()),
            translator,
        })
    }
}

impl Default for PostAiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
