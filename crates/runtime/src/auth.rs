//! Token exchange against `/operator_authentication/tokens`

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ACCEPT_MEDIA_TYPE;
use crate::deps::Authenticator;
use crate::environment::Environment;
use crate::error::{GliaError, Result};
use crate::types::{Credentials, Session, TokenRequest};

/// Authenticator backed by the Glia HTTP API
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl HttpAuthenticator {
    /// Authenticator that routes by environment
    pub const fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: None,
        }
    }

    /// Authenticator pinned to one base URL, for tests and proxies
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: Some(base_url.into()),
        }
    }

    fn token_url(&self, environment: Environment) -> String {
        let base = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| environment.base_url());
        format!(
            "{}/operator_authentication/tokens",
            base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(
        &self,
        credentials: &Credentials,
        environment: Environment,
    ) -> Result<Session> {
        if credentials.api_key_id.is_empty() || credentials.api_key_secret.is_empty() {
            return Err(GliaError::Authentication(
                "API key id and secret must both be set".to_string(),
            ));
        }

        let url = self.token_url(environment);
        tracing::debug!(
            "Requesting token from {} for key {}",
            url,
            credentials.masked_key_id()
        );

        let body = TokenRequest {
            api_key_secret: &credentials.api_key_secret,
            api_key_id: &credentials.api_key_id,
            site_ids: &credentials.site_ids,
        };

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, ACCEPT_MEDIA_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| GliaError::Authentication(format!("could not reach {url}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GliaError::Authentication(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::debug!("Token request rejected with {}: {}", status, text);
            return Err(GliaError::Authentication(format!(
                "token request returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            GliaError::Authentication(format!("token response is not valid JSON: {e}"))
        })?;

        let token = json
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                GliaError::Authentication("token response has no 'token' field".to_string())
            })?;

        tracing::info!("Authenticated against {}", environment);
        Ok(Session {
            token: token.to_string(),
            environment,
            site_ids: credentials.site_ids.clone(),
        })
    }
}
