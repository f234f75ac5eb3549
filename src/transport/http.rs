//! reqwest-backed [`Transport`]

use async_trait::async_trait;
use url::Url;

use crate::protocol::error::{CodecError, CodecResult};

use super::{Method, Transport, TransportRequest, TransportResponse};

/// Platform API client over HTTP
///
/// Endpoints are joined onto the regional API base, e.g.
/// `https://api.mypurecloud.com`. A bearer token, when set, is sent on
/// every request.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self {
            client,
            base_url,
            token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint against the base URL
    pub fn url_for(&self, endpoint: &str) -> CodecResult<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|err| CodecError::invalid("endpoint", err, "a path relative to the API base"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> CodecResult<TransportResponse> {
        let url = self.url_for(&request.endpoint)?;
        tracing::debug!(method = %request.method, %url, "platform request");

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        for (key, value) in request.headers {
            builder = builder.header(key, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response.bytes().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_onto_base() {
        let transport = HttpTransport::new(Url::parse("https://api.mypurecloud.com").unwrap())
            .with_bearer_token("secret");
        assert_eq!(
            transport
                .url_for("/api/v2/notifications/channels/abc/subscriptions")
                .unwrap()
                .as_str(),
            "https://api.mypurecloud.com/api/v2/notifications/channels/abc/subscriptions"
        );
        assert_eq!(transport.base_url().as_str(), "https://api.mypurecloud.com/");
    }
}
