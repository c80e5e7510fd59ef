use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};

/// Where a request goes: a path under the org-level `_apis/`, or a URL that
/// was already built (usually project-scoped, possibly with a query string).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Org(String),
    Url(Url),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContentType {
    Json,
    JsonPatch,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::JsonPatch => "application/json-patch+json",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub target: Target,
    pub content_type: ContentType,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            content_type: ContentType::Json,
            body: None,
        }
    }

    pub fn get(target: Target) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }
}

/// A successful (status < 400) round trip with the body fully read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            error!("Failed to parse JSON response: {}", e);
            ApiError::InvalidResponse(e.to_string())
        })
    }
}

/// One authenticated request per call. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    async fn execute(&self, request: Request) -> Result<Response>;
}

/// Execute a request and decode the body.
pub async fn send<T: DeserializeOwned>(transport: &dyn Transport, request: Request) -> Result<T> {
    transport.execute(request).await?.json()
}
