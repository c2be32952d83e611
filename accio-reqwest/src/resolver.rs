//! Resolver sending requests with a reqwest client.

use accio_core::{Context, FetchOptions, Method, ResolveError, Resolver};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

/// Resolver performing HTTP requests and parsing JSON responses.
///
/// Endpoints are used as-is, or appended to the base URL when one is set.
/// The resolver context is not sent.
#[derive(Debug, Clone, Default)]
pub struct HttpResolver {
    client: Client,
    base_url: Option<String>,
}

impl HttpResolver {
    /// Creates a resolver with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver sending requests through `client`.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Prefixes every endpoint with `base_url`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn url(&self, endpoint: &str) -> String {
        match &self.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ),
            None => endpoint.to_owned(),
        }
    }
}

fn http_method(method: Option<Method>) -> reqwest::Method {
    match method.unwrap_or_default() {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
    }
}

#[async_trait]
impl Resolver<Value> for HttpResolver {
    async fn resolve(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        _context: &Context,
    ) -> Result<Value, ResolveError> {
        let url = self.url(endpoint);
        let method = http_method(options.method);
        debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, url);
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Some(payload) = options.payload() {
            let body = serde_json::to_vec(payload).map_err(ResolveError::parse)?;
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(ResolveError::transport)?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "unexpected response status");
            return Err(ResolveError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(ResolveError::transport)?;
        serde_json::from_slice(&body).map_err(ResolveError::parse)
    }
}
