pub mod endpoint;
pub mod error;
pub mod fields;
pub mod identity;
pub mod models;
pub mod patch;
pub mod pullrequests;
pub mod repositories;
pub mod transport;
pub mod wiql;
pub mod workitems;

#[cfg(test)]
pub(crate) mod stub;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

pub use endpoint::Endpoint;
pub use error::{ApiError, Result};
pub use transport::{ContentType, Request, Response, Target, Transport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Personal access token. Sent as basic auth with an empty username.
#[derive(Clone)]
pub enum AuthMethod {
    Pat { token: String },
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Pat { .. } => f.write_str("Pat { token: <redacted> }"),
        }
    }
}

/// reqwest-backed [`Transport`]. Immutable once built; reuse it for every
/// call of a command.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    endpoint: Endpoint,
    auth: Option<AuthMethod>,
}

impl ApiClient {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        Ok(Self {
            client: build_http_client(DEFAULT_TIMEOUT)?,
            endpoint,
            auth: None,
        })
    }

    pub fn with_pat(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Pat {
            token: token.into(),
        });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_http_client(timeout)?;
        Ok(self)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(AuthMethod::Pat { token }) => request.basic_auth("", Some(token)),
            None => request,
        }
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(format!("ado-cli/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

#[async_trait]
impl Transport for ApiClient {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let url = self.endpoint.resolve(&request.target)?;

        debug!(method = %request.method, url = %url, "Sending request");

        let mut req = self
            .client
            .request(request.method.clone(), url.clone())
            .header(CONTENT_TYPE, request.content_type.as_str());
        req = self.apply_auth(req);

        if let Some(body) = &request.body {
            req = req.body(serde_json::to_vec(body)?);
        }

        let response = req.send().await?;
        let status = response.status();
        // Reading the body to the end releases the connection on every path.
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            warn!(status = status.as_u16(), url = %url, "Request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(Response {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let client = ApiClient::new(Endpoint::for_organization("contoso").unwrap())
            .unwrap()
            .with_pat("super-secret-token");
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_endpoint_is_exposed() {
        let client = ApiClient::new(Endpoint::for_organization("contoso").unwrap()).unwrap();
        assert_eq!(
            client.endpoint().org_base().as_str(),
            "https://dev.azure.com/contoso/"
        );
    }
}
