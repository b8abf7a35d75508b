//! Refresh-endpoint client

use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{normalize_response, parse_body, TokenRefresher, Transport};
use relay_domain::{RequestContext, StructuredError, TokenPair};
use serde_json::json;
use tracing::debug;

/// Exchanges a refresh token at the configured refresh endpoint.
///
/// Sends `{"refresh": "<token>"}` straight through the transport: the call
/// never passes through the request pipeline, so a failing refresh cannot
/// trigger another refresh.
pub struct HttpTokenRefresher {
    transport: Arc<dyn Transport>,
    refresh_path: String,
}

impl HttpTokenRefresher {
    pub fn new(transport: Arc<dyn Transport>, refresh_path: impl Into<String>) -> Self {
        Self { transport, refresh_path: refresh_path.into() }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, StructuredError> {
        let request = RequestContext::post(&self.refresh_path, json!({ "refresh": refresh_token }));

        let response =
            self.transport.dispatch(&request).await.map_err(|err| err.to_structured())?;
        if !response.is_success() {
            return Err(normalize_response(&response));
        }

        let body = parse_body(&response)
            .map_err(|reason| StructuredError::malformed(response.status, reason))?;
        let pair: TokenPair = serde_json::from_value(body).map_err(|err| {
            StructuredError::malformed(response.status, format!("invalid token response: {err}"))
        })?;

        debug!(expires_in = pair.expires_in_seconds, "refresh endpoint issued new tokens");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use relay_domain::ErrorKind;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::ReqwestTransport;

    fn refresher_for(server: &MockServer) -> HttpTokenRefresher {
        let transport = ReqwestTransport::builder().base_url(server.uri()).build().unwrap();
        HttpTokenRefresher::new(Arc::new(transport), "/auth/refresh/")
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh/"))
            .and(body_json(json!({ "refresh": "r1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "a2" })))
            .expect(1)
            .mount(&server)
            .await;

        let pair = refresher_for(&server).refresh("r1").await.unwrap();

        assert_eq!(pair.access_token, "a2");
        assert!(!pair.has_refresh_token());
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Token is invalid or expired",
                "code": "token_not_valid",
            })))
            .mount(&server)
            .await;

        let err = refresher_for(&server).refresh("r1").await.unwrap_err();

        assert_eq!(err.status(), 401);
        assert_eq!(err.message(), "Token is invalid or expired");
        assert_eq!(err.code(), Some("token_not_valid"));
    }

    #[tokio::test]
    async fn test_refresh_response_without_access_token_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let err = refresher_for(&server).refresh("r1").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.status(), 200);
    }
}
