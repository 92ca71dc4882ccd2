//! HTTP client for the Glia Functions management API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::{ACCEPT_MEDIA_TYPE, DEFAULT_API_TIMEOUT_SECS};
use crate::deps::FunctionsApi;
use crate::error::{GliaError, Result};
use crate::types::{
    CreateFunctionRequest, DeploymentTask, FunctionList, KvBulkResponse, KvListResponse,
    KvOperation, LogRange, LogsPage, MetadataUpdate, Session, StatsResponse, VersionList,
    VersionQuery, VersionRequest,
};

/// Build the shared HTTP client
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_API_TIMEOUT_SECS))
        .user_agent(concat!("glia-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(GliaError::from)
}

/// `FunctionsApi` implementation over reqwest
#[derive(Debug, Clone)]
pub struct HttpFunctionsApi {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl HttpFunctionsApi {
    /// Client that routes each call by the session's environment
    pub const fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: None,
        }
    }

    /// Client pinned to one base URL, for tests and proxies
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: Some(base_url.into()),
        }
    }

    fn base<'a>(&'a self, session: &Session) -> &'a str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| session.base_url())
            .trim_end_matches('/')
    }

    fn url(&self, session: &Session, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let separator = if path.starts_with('/') { "" } else { "/" };
        format!("{}{separator}{path}", self.base(session))
    }

    fn request(&self, session: &Session, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(session, path);
        tracing::debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .header(reqwest::header::ACCEPT, ACCEPT_MEDIA_TYPE)
            .bearer_auth(&session.token)
    }

    async fn send_text(request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            tracing::debug!("Request failed with {}: {}", status, body);
            Err(GliaError::Remote {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let body = Self::send_text(request).await?;
        let text = if body.trim().is_empty() { "null" } else { &body };
        Ok(serde_json::from_str(text)?)
    }
}

#[async_trait]
impl FunctionsApi for HttpFunctionsApi {
    async fn create_function(
        &self,
        session: &Session,
        site_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Value> {
        let body = CreateFunctionRequest {
            site_id,
            name,
            description,
        };
        Self::send_json(self.request(session, Method::POST, "/functions/").json(&body)).await
    }

    async fn create_version(
        &self,
        session: &Session,
        function_id: &str,
        request: &VersionRequest,
    ) -> Result<Value> {
        let path = format!("/functions/{function_id}/versions");
        Self::send_json(self.request(session, Method::POST, &path).json(request)).await
    }

    async fn get_task(&self, session: &Session, reference: &str) -> Result<DeploymentTask> {
        let raw: Value = Self::send_json(self.request(session, Method::GET, reference)).await?;
        Ok(DeploymentTask::from_value(raw))
    }

    async fn get_function_task(
        &self,
        session: &Session,
        function_id: &str,
        task_id: &str,
    ) -> Result<Value> {
        let path = format!("/functions/{function_id}/tasks/{task_id}");
        Self::send_json(self.request(session, Method::GET, &path)).await
    }

    async fn deploy_version(
        &self,
        session: &Session,
        function_id: &str,
        version_id: &str,
    ) -> Result<Value> {
        let path = format!("/functions/{function_id}/deployments");
        let body = json!({ "version_id": version_id });
        Self::send_json(self.request(session, Method::POST, &path).json(&body)).await
    }

    async fn get_function(&self, session: &Session, function_id: &str) -> Result<Value> {
        let path = format!("/functions/{function_id}");
        Self::send_json(self.request(session, Method::GET, &path)).await
    }

    async fn get_version(
        &self,
        session: &Session,
        function_id: &str,
        version_id: &str,
    ) -> Result<Value> {
        let path = format!("/functions/{function_id}/versions/{version_id}");
        Self::send_json(self.request(session, Method::GET, &path)).await
    }

    async fn get_version_code(
        &self,
        session: &Session,
        function_id: &str,
        version_id: &str,
    ) -> Result<String> {
        let path = format!("/functions/{function_id}/versions/{version_id}/code");
        Self::send_text(self.request(session, Method::GET, &path)).await
    }

    async fn get_logs(
        &self,
        session: &Session,
        function_id: &str,
        range: &LogRange,
    ) -> Result<LogsPage> {
        let path = format!("/functions/{function_id}/logs");
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(start) = range.start.as_deref() {
            params.push(("from", start));
        }
        if let Some(end) = range.end.as_deref() {
            params.push(("to", end));
        }
        Self::send_json(self.request(session, Method::GET, &path).query(&params)).await
    }

    async fn list_functions(&self, session: &Session, site_ids: &[String]) -> Result<FunctionList> {
        let params: Vec<(&str, &str)> = site_ids
            .iter()
            .map(|id| ("site_ids[]", id.as_str()))
            .collect();
        Self::send_json(self.request(session, Method::GET, "/functions").query(&params)).await
    }

    async fn list_versions(
        &self,
        session: &Session,
        function_id: &str,
        query: &VersionQuery,
    ) -> Result<VersionList> {
        let path = format!("/functions/{function_id}/versions");
        let per_page = query.per_page.to_string();
        let params = [
            ("per_page", per_page.as_str()),
            ("order", query.order.as_str()),
            ("order_by", "created_at"),
        ];
        Self::send_json(self.request(session, Method::GET, &path).query(&params)).await
    }

    async fn get_stats(
        &self,
        session: &Session,
        function_ids: &[String],
    ) -> Result<StatsResponse> {
        let body = if function_ids.is_empty() {
            json!({})
        } else {
            json!({ "function_ids": function_ids })
        };
        Self::send_json(self.request(session, Method::POST, "/functions/stats").json(&body)).await
    }

    async fn update_metadata(
        &self,
        session: &Session,
        function_id: &str,
        update: &MetadataUpdate,
    ) -> Result<Value> {
        if update.is_empty() {
            return Err(GliaError::validation(
                "Either name or description must be provided",
            ));
        }
        let path = format!("/functions/{function_id}");
        Self::send_json(self.request(session, Method::PATCH, &path).json(update)).await
    }

    async fn invoke(&self, session: &Session, endpoint: &str, payload: &Value) -> Result<Value> {
        let url = self.url(session, endpoint);
        tracing::debug!("POST {}", url);
        let request = self
            .http
            .post(url)
            .bearer_auth(&session.token)
            .json(payload);
        Self::send_json(request).await
    }

    async fn kv_bulk(
        &self,
        session: &Session,
        namespace: &str,
        operations: &[KvOperation],
    ) -> Result<KvBulkResponse> {
        let path = format!("/api/v2/functions/storage/kv/namespaces/{namespace}");
        let body = json!({ "operations": operations });
        Self::send_json(self.request(session, Method::POST, &path).json(&body)).await
    }

    async fn kv_list(
        &self,
        session: &Session,
        namespace: &str,
        max_page_size: u32,
    ) -> Result<KvListResponse> {
        let path = format!("/api/v2/functions/storage/kv/namespaces/{namespace}");
        let size = max_page_size.to_string();
        Self::send_json(
            self.request(session, Method::GET, &path)
                .query(&[("maxpagesize", size.as_str())]),
        )
        .await
    }
}

#[cfg(test)]
#[path = "api_client_tests.rs"]
mod tests;
