//! Transport abstraction for outbound backend calls
//!
//! Everything that talks to the CRM backend goes through a [`Transport`].
//! Decorators such as the call tracker wrap a transport and are themselves
//! transports, so callers never see the difference.

use crate::{EgressError, HttpClientConfig, Result, create_client};
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Body of an outbound request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Textual body, sent as-is
    Text(String),
    /// Structured body, serialized as JSON
    Json(serde_json::Value),
    /// Opaque binary body
    Bytes(Bytes),
}

/// Descriptor of an outbound request
#[derive(Debug, Clone, Default)]
pub struct OutboundRequest {
    /// HTTP method; `None` means GET
    pub method: Option<Method>,
    /// Request target, used verbatim
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

impl OutboundRequest {
    /// Request with no explicit method (sent as GET)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url).with_method(Method::GET)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url).with_method(Method::POST)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_text(self, body: impl Into<String>) -> Self {
        self.with_body(RequestBody::Text(body.into()))
    }

    pub fn with_json(self, body: serde_json::Value) -> Self {
        self.with_body(RequestBody::Json(body))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Method that will actually be sent
    pub fn effective_method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }
}

/// Fully buffered response from a transport
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// An outbound call primitive
///
/// Non-2xx statuses are successful transport outcomes; only failures to
/// obtain a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and buffer its response
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse>;

    /// Identity of this transport, used to detect existing decorators
    fn name(&self) -> &'static str {
        "transport"
    }
}

/// Transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport with its own client
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse> {
        let method = request.effective_method();

        if request.url.is_empty() {
            return Err(EgressError::InvalidRequest("empty url".to_string()));
        }

        let mut builder = self
            .client
            .request(method.clone(), &request.url)
            .headers(request.headers);

        builder = match request.body {
            Some(RequestBody::Text(text)) => builder.body(text),
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Bytes(bytes)) => builder.body(bytes),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!(
            method = %method,
            url = %request.url,
            status = status.as_u16(),
            body_len = body.len(),
            "Transport call completed"
        );

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
