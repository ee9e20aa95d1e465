//! The transport seam: how encoded ceremony payloads reach the relying party.
//!
//! The core never performs networking itself. Implementations of
//! [`Transport`] own the HTTP client, TLS, and any socket-level retry policy;
//! the orchestrator only sees a status line, a body, and the session cookie.

use std::fmt;

use async_trait::async_trait;

use crate::api::Endpoint;

#[cfg(feature = "reqwest")]
mod reqwest_transport;
#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;

/// A network or I/O failure below the ceremony protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// A raw response from the relying party.
///
/// The body is carried even for non-success status codes: this relying party
/// reports ceremony failures inside a decodable JSON body, so the codec,
/// not the transport, decides what a response means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
    /// Value of the `set-cookie` header, when the server sent one. The codec
    /// extracts the session id from it.
    pub set_cookie: Option<String>,
}

/// Delivers an encoded ceremony payload to one of the relying party's
/// endpoints as an `application/json` POST.
#[async_trait]
pub trait Transport {
    /// POST `body` to `endpoint` and return the raw response. Implementations
    /// must not interpret the body or treat non-2xx statuses as failures.
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: String,
    ) -> Result<TransportResponse, TransportError>;
}
