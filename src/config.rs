//! Client configuration: defaults, environment overrides and YAML files.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// What the poller does with a status string it does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatusPolicy {
    /// Log once per job and keep polling until a terminal state or the deadline.
    #[default]
    KeepPolling,
    /// Stop polling and fail with [`Error::UnknownJobStatus`].
    FailFast,
}

/// Runtime configuration for [`crate::PostAiClient`] and friends.
///
/// Durations are given in milliseconds in YAML (`poll_interval_ms`,
/// `job_timeout_ms`, `http_timeout_ms`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(rename = "http_timeout_ms", with = "millis")]
    pub http_timeout: Duration,
    #[serde(rename = "poll_interval_ms", with = "millis")]
    pub poll_interval: Duration,
    #[serde(rename = "job_timeout_ms", with = "millis")]
    pub job_timeout: Duration,
    pub unknown_status: UnknownStatusPolicy,
    pub pool_max_idle_per_host: usize,
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            job_timeout: DEFAULT_JOB_TIMEOUT,
            unknown_status: UnknownStatusPolicy::default(),
            pool_max_idle_per_host: 32,
            proxy_url: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `POST_AI_*` environment variables.
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Load a YAML file, then apply environment overrides on top.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut cfg = Self::from_yaml_str(&raw).map_err(|e| {
            Error::configuration_with_context(
                e.to_string(),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var("POST_AI_BASE_URL") {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        if let Some(secs) = env_parse::<u64>("POST_AI_HTTP_TIMEOUT_SECS") {
            self.http_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_parse::<u64>("POST_AI_POLL_INTERVAL_MS") {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("POST_AI_JOB_TIMEOUT_SECS") {
            self.job_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_parse::<usize>("POST_AI_POOL_MAX_IDLE_PER_HOST") {
            self.pool_max_idle_per_host = n;
        }
        if let Ok(v) = env::var("POST_AI_FAIL_ON_UNKNOWN_STATUS") {
            if matches!(v.trim(), "1" | "true" | "yes") {
                self.unknown_status = UnknownStatusPolicy::FailFast;
            }
        }
        if let Ok(proxy) = env::var("POST_AI_PROXY_URL") {
            if !proxy.trim().is_empty() {
                self.proxy_url = Some(proxy.trim().to_string());
            }
        }
    }

    /// Check the values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base url: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                "base url must be http or https",
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(parsed.scheme().to_string()),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::configuration_with_context(
                "poll interval must be positive",
                ErrorContext::new().with_field_path("poll_interval_ms"),
            ));
        }
        if self.job_timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "job timeout must be positive",
                ErrorContext::new().with_field_path("job_timeout_ms"),
            ));
        }
        Ok(())
    }

    /// Maximum number of status requests one poll loop may issue:
    /// `floor(job_timeout / poll_interval)`, at least one.
    pub fn max_poll_attempts(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let attempts = self.job_timeout.as_millis() / interval;
        attempts.clamp(1, u32::MAX as u128) as u32
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
