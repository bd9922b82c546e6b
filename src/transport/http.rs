use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use reqwest::{Method, Proxy};
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Status code and raw body of a backend reply.
///
/// Non-2xx replies are values, not errors; callers decide what a status means.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, credentials: Credentials) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::configuration_with_context(
                e.to_string(),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_source("http_transport"),
            )
        })?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy url: {}", e),
                    ErrorContext::new().with_field_path("proxy_url"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::configuration("base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get(&self, segments: &[&str]) -> Result<HttpReply> {
        self.send(Method::GET, segments, &[], None).await
    }

    pub async fn get_query(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<HttpReply> {
        self.send(Method::GET, segments, query, None).await
    }

    pub async fn post_json(&self, segments: &[&str], body: &serde_json::Value) -> Result<HttpReply> {
        self.send(Method::POST, segments, &[], Some(body)).await
    }

    pub async fn delete(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<HttpReply> {
        self.send(Method::DELETE, segments, query, None).await
    }

    /// Send one request with the current auth headers and a fresh
    /// `x-request-id`, and read the whole body as text.
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<HttpReply> {
        let url = self.url(segments)?;
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, %url, request_id = %request_id, "sending request");

        let mut req = self
            .client
            .request(method, url)
            .header("x-request-id", &request_id);
        if !query.is_empty() {
            req = req.query(query);
        }
        for (name, value) in self.credentials.headers() {
            req = req.header(name, value);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        debug!(status, request_id = %request_id, "received reply");
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_segments_and_keeps_prefix() {
        let cfg = ClientConfig::new("https://blog.example/app/");
        let t = HttpTransport::new(&cfg, Credentials::anonymous()).unwrap();
        let url = t.url(&["api", "jobs", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://blog.example/app/api/jobs/a%20b%2Fc");
    }

    #[test]
    fn reply_success_range() {
        let ok = HttpReply { status: 202, body: String::new() };
        assert!(ok.is_success());
        let bad = HttpReply { status: 404, body: String::new() };
        assert!(!bad.is_success());
    }
}
