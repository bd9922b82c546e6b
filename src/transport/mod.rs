//! HTTP transport shared by every client in the crate.

mod http;

pub use http::{HttpReply, HttpTransport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
