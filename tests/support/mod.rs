//! Mock backend setup for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use post_ai_client::{ClientConfig, InMemoryNotifier, MemoryTokenStore, PostAiClient};
use std::sync::Arc;
use std::time::Duration;

pub const TOKEN: &str = "test-token";
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Test fixture that owns a mock server and the notices a client emitted.
pub struct MockBackend {
    pub server: ServerGuard,
    pub notices: Arc<InMemoryNotifier>,
}

impl MockBackend {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
            notices: Arc::new(InMemoryNotifier::default()),
        }
    }

    pub fn config(&self) -> ClientConfig {
        let mut cfg = ClientConfig::new(self.server.url());
        cfg.poll_interval = POLL_INTERVAL;
        cfg.job_timeout = Duration::from_secs(2);
        cfg
    }

    /// Signed-in client with a 20 ms poll interval and a 2 s job deadline.
    pub fn client(&self) -> PostAiClient {
        self.client_with(self.config(), Some(TOKEN))
    }

    pub fn anonymous_client(&self) -> PostAiClient {
        self.client_with(self.config(), None)
    }

    pub fn client_with(&self, config: ClientConfig, token: Option<&str>) -> PostAiClient {
        let store = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        PostAiClient::builder()
            .config(config)
            .token_store(Arc::new(store))
            .notifier(self.notices.clone())
            .build()
            .expect("client builds")
    }

    /// JSON reply to `method path`, expected exactly `hits` times.
    pub async fn json(&mut self, method: &str, path: &str, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Status reply for job `job_id`, expected exactly `hits` times.
    pub async fn job_status(&mut self, job_id: &str, body: &str, hits: usize) -> Mock {
        let path = format!("/api/jobs/{}", job_id);
        self.json("GET", &path, 200, body, hits).await
    }

    /// Guard asserting that no job status request is made at all.
    pub async fn no_job_requests(&mut self) -> Mock {
        self.server
            .mock("GET", Matcher::Regex(r"^/api/jobs/.*$".to_string()))
            .expect(0)
            .create_async()
            .await
    }
}
