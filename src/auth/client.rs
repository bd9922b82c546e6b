//! Calls against the `/auth/*` endpoints.

use crate::transport::{HttpReply, HttpTransport};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// The signed-in account as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Account {
    /// Display name when set, otherwise the handle.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.handle)
    }
}

#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<HttpTransport>,
}

impl AuthClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn is_signed_in(&self) -> bool {
        self.transport.credentials().has_token()
    }

    /// Sign in and store the returned `access_token`.
    pub async fn login(&self, handle_or_email: &str, password: &str) -> Result<serde_json::Value> {
        let body = json!({ "handle_or_email": handle_or_email, "password": password });
        let reply = self.transport.post_json(&["auth", "login"], &body).await?;
        self.store_session(reply)
    }

    /// Create an account and store the returned `access_token`.
    pub async fn register(
        &self,
        handle: &str,
        email: &str,
        password: &str,
    ) -> Result<serde_json::Value> {
        let body = json!({ "handle": handle, "email": email, "password": password });
        let reply = self.transport.post_json(&["auth", "register"], &body).await?;
        self.store_session(reply)
    }

    pub async fn me(&self) -> Result<Account> {
        let reply = self.transport.get(&["auth", "me"]).await?;
        let reply = expect_success(reply)?;
        Ok(serde_json::from_str(&reply.body)?)
    }

    pub async fn confirm_email(&self, token: &str) -> Result<serde_json::Value> {
        let reply = self
            .transport
            .post_json(&["auth", "confirm-email"], &json!({ "token": token }))
            .await?;
        Ok(lenient_json(&expect_success(reply)?))
    }

    pub async fn resend_confirmation(&self) -> Result<serde_json::Value> {
        let reply = self
            .transport
            .post_json(&["auth", "resend-confirmation"], &json!({}))
            .await?;
        Ok(lenient_json(&expect_success(reply)?))
    }

    /// Forget the stored token. No request is sent.
    pub fn logout(&self) -> Result<()> {
        self.transport.credentials().store().clear()?;
        info!("signed out");
        Ok(())
    }

    fn store_session(&self, reply: HttpReply) -> Result<serde_json::Value> {
        // Bad credentials on login also answer 401; that is not an expired session.
        if !reply.is_success() {
            return Err(Error::backend(reply.status, reply.body));
        }
        let data: serde_json::Value = serde_json::from_str(&reply.body)?;
        if let Some(token) = data.get("access_token").and_then(|v| v.as_str()) {
            self.transport.credentials().store().save(token)?;
            info!("session token stored");
        }
        Ok(data)
    }
}

fn expect_success(reply: HttpReply) -> Result<HttpReply> {
    if reply.status == 401 {
        return Err(Error::SessionExpired);
    }
    if !reply.is_success() {
        return Err(Error::backend(reply.status, reply.body));
    }
    Ok(reply)
}

/// Bodies of confirmation endpoints may be empty; treat that as `{}`.
fn lenient_json(reply: &HttpReply) -> serde_json::Value {
    reply.json().unwrap_or_else(|_| json!({}))
}
