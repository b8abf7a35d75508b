use std::time::Duration;

use async_trait::async_trait;
use relay_core::{Transport, TransportError, TransportResponse};
use relay_domain::{ClientConfig, HttpMethod, RelayError, RequestContext};
use reqwest::{Client as ReqwestClient, Method};
use tracing::{debug, warn};
use url::Url;

/// [`Transport`] backed by a shared reqwest client.
///
/// Performs exactly one attempt per dispatch; retries live in the pipeline.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    base_url: Option<String>,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Transport using the base URL, timeout and user agent of `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, RelayError> {
        let mut builder = Self::builder().base_url(&config.base_url).timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent);
        }
        builder.build()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Absolute URLs pass through; anything else is appended to the base URL.
    fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }

        let base = self.base_url.as_deref().ok_or_else(|| {
            TransportError::InvalidRequest(format!("relative URL without a base URL: {url}"))
        })?;
        let joined = format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'));

        Url::parse(&joined)
            .map_err(|err| TransportError::InvalidRequest(format!("invalid URL {joined}: {err}")))
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(err.to_string());
    }
    if err.is_builder() {
        return TransportError::InvalidRequest(err.to_string());
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return TransportError::Connect(err.to_string());
        }
    }
    TransportError::Aborted(err.to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(&self, request: &RequestContext) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(&request.url)?;
        let method = to_reqwest_method(request.method);

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let built = builder.build().map_err(|err| classify_error(&err))?;

        debug!(%method, %url, retry = request.retry_count, "sending HTTP request");

        let response = self.client.execute(built).await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            classify_error(&err)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // The server has answered at this point; a failed body read is not a
        // missing response.
        let (body, body_error) = match response.bytes().await {
            Ok(bytes) => (bytes.to_vec(), None),
            Err(err) => {
                warn!(%method, %url, status, error = %err, "response body could not be read");
                (Vec::new(), Some(err.to_string()))
            }
        };

        debug!(%method, %url, status, "received HTTP response");

        Ok(TransportResponse { status, headers, body, body_error })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    base_url: Option<String>,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), base_url: None, user_agent: None, default_headers: None }
    }
}

impl ReqwestTransportBuilder {
    /// Per-attempt timeout covering connect, send and body download.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, RelayError> {
        if let Some(base) = &self.base_url {
            Url::parse(base)
                .map_err(|err| RelayError::Config(format!("invalid base URL {base}: {err}")))?;
        }

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| RelayError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(ReqwestTransport { client, base_url: self.base_url })
    }
}
