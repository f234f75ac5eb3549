//! The network boundary: platform API requests and notification frames
//!
//! Two seams are defined here. [`Transport`] carries the REST calls a
//! notification channel makes to keep its subscriptions in sync with the
//! platform. [`FrameReader`] yields the raw frames pushed on the
//! notification WebSocket.

pub mod frame;
pub mod http;
pub mod websocket;

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use async_trait::async_trait;
use bytes::Bytes;
use tower_service::Service;

use crate::protocol::error::{CodecError, CodecResult};

pub use frame::{ChannelFrameReader, FrameReader};
pub use http::HttpTransport;
pub use websocket::WebSocketFrameReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform API call
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// Path relative to the API base, e.g. `/api/v2/notifications/channels`
    pub endpoint: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl TransportRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Set a JSON body and its content type
    pub fn json<T: serde::Serialize + ?Sized>(self, body: &T) -> CodecResult<Self> {
        let body = serde_json::to_vec(body).map_err(CodecError::marshal)?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(Bytes::from(body)))
    }
}

/// The platform's answer to a [`TransportRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx status into a transport error
    ///
    /// The platform reports failures as `{"message": ..., "code": ...}`, the
    /// message is kept when present.
    pub fn error_for_status(self) -> CodecResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = serde_json::from_slice::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|json| json.get("message").and_then(|m| m.as_str()).map(str::to_string));
        Err(match message {
            Some(message) => CodecError::Transport(format!("HTTP {}: {}", self.status, message)),
            None => CodecError::Transport(format!("HTTP {}", self.status)),
        })
    }

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> CodecResult<T> {
        serde_json::from_slice(&self.body).map_err(CodecError::unmarshal)
    }
}

/// Executes platform API calls
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> CodecResult<TransportResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: TransportRequest) -> CodecResult<TransportResponse> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: TransportRequest) -> CodecResult<TransportResponse> {
        (**self).execute(request).await
    }
}

/// Verb helpers over any [`Transport`], failing on non-2xx statuses
#[async_trait]
pub trait TransportExt: Transport {
    async fn get(&self, endpoint: &str) -> CodecResult<TransportResponse> {
        self.execute(TransportRequest::new(Method::Get, endpoint))
            .await?
            .error_for_status()
    }

    async fn post<B>(&self, endpoint: &str, body: &B) -> CodecResult<TransportResponse>
    where
        B: serde::Serialize + Sync + ?Sized,
    {
        let request = TransportRequest::new(Method::Post, endpoint).json(body)?;
        self.execute(request).await?.error_for_status()
    }

    async fn put<B>(&self, endpoint: &str, body: &B) -> CodecResult<TransportResponse>
    where
        B: serde::Serialize + Sync + ?Sized,
    {
        let request = TransportRequest::new(Method::Put, endpoint).json(body)?;
        self.execute(request).await?.error_for_status()
    }

    async fn delete(&self, endpoint: &str) -> CodecResult<TransportResponse> {
        self.execute(TransportRequest::new(Method::Delete, endpoint))
            .await?
            .error_for_status()
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

/// A tower [`Service`] over a [`Transport`]
///
/// Lets callers stack tower middleware (timeouts, rate limits, retries) in
/// front of platform calls. Non-2xx responses are errors.
pub struct TransportService<T> {
    transport: Arc<T>,
}

impl<T> TransportService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }
}

impl<T> Clone for TransportService<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T> Service<TransportRequest> for TransportService<T>
where
    T: Transport + 'static,
{
    type Response = TransportResponse;
    type Error = CodecError;
    type Future = Pin<Box<dyn Future<Output = CodecResult<TransportResponse>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: TransportRequest) -> Self::Future {
        let transport = self.transport.clone();
        Box::pin(async move { transport.execute(request).await?.error_for_status() })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockall::predicate::eq;
    use serde_json::json;
    use tower::{ServiceBuilder, ServiceExt};

    use super::*;

    #[test]
    fn test_error_for_status_keeps_platform_message() {
        let response = TransportResponse::new(404)
            .body(Bytes::from_static(br#"{"message":"channel not found","code":"not.found"}"#));
        let err = response.error_for_status().unwrap_err();
        assert_eq!(err.to_string(), "Transport error: HTTP 404: channel not found");

        let err = TransportResponse::new(503).error_for_status().unwrap_err();
        assert!(matches!(err, CodecError::Transport(message) if message == "HTTP 503"));

        assert!(TransportResponse::new(204).error_for_status().is_ok());
    }

    #[tokio::test]
    async fn test_post_sends_json() {
        let mut transport = MockTransport::new();
        let expected = TransportRequest::new(Method::Post, "/api/v2/notifications/channels/abc/subscriptions")
            .json(&json!([{"id": "v2.users.1.presence"}]))
            .unwrap();
        transport
            .expect_execute()
            .with(eq(expected))
            .times(1)
            .returning(|_| Ok(TransportResponse::new(200)));

        transport
            .post(
                "/api/v2/notifications/channels/abc/subscriptions",
                &json!([{"id": "v2.users.1.presence"}]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_helpers_fail_on_error_status() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(TransportResponse::new(401)));
        let err = transport.delete("/api/v2/notifications/channels/abc/subscriptions").await.unwrap_err();
        assert!(matches!(err, CodecError::Transport(_)));
    }

    #[tokio::test]
    async fn test_transport_service_with_tower_layers() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request| request.method == Method::Get)
            .returning(|_| {
                Ok(TransportResponse::new(200).body(Bytes::from_static(br#"{"entities":[]}"#)))
            });

        let service = ServiceBuilder::new()
            .timeout(Duration::from_secs(1))
            .service(TransportService::new(transport));
        let response = service
            .oneshot(TransportRequest::new(Method::Get, "/api/v2/notifications/channels"))
            .await
            .unwrap();
        assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"entities": []}));
    }
}
