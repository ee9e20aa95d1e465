use reqwest::header::{CONTENT_TYPE, SET_COOKIE};
use url::Url;

use super::{Transport, TransportError, TransportResponse};
use crate::api::Endpoint;

/// A [`Transport`] backed by [`reqwest::Client`].
///
/// `base_url` is the relying party's API root and should end with a `/` so
/// that endpoint paths join onto it, e.g. `https://auth.example.org/api/`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport for the given API root with a default client.
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a transport reusing an existing client, e.g. one configured
    /// with a cookie store or custom TLS settings.
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: String,
    ) -> Result<TransportResponse, TransportError> {
        let url = self
            .base_url
            .join(endpoint.path())
            .map_err(|err| TransportError::new(format!("invalid endpoint url: {err}")))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| TransportError::new(err.to_string()))?;

        let status = response.status().as_u16();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response
            .text()
            .await
            .map_err(|err| TransportError::new(err.to_string()))?;

        Ok(TransportResponse {
            status,
            body,
            set_cookie,
        })
    }
}
