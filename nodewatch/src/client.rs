//! HTTP client for the fleet backend.
//!
//! The views only see the [`Backend`] trait, so poll loops can be driven by
//! a fake in tests and by [`HttpBackend`] in the binary.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::FetchError;
use crate::types::{AgentReport, LogsPayload, NodeDetails, NodeList, NodeRecord, Submission};

/// Data sources and actions the engine consumes.
pub trait Backend: Send + Sync {
    fn agent_stats(&self) -> BoxFuture<'_, Result<AgentReport, FetchError>>;

    fn node_details<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<NodeDetails, FetchError>>;

    fn nodes(&self) -> BoxFuture<'_, Result<Vec<NodeRecord>, FetchError>>;

    fn logs(&self) -> BoxFuture<'_, Result<Vec<String>, FetchError>>;

    fn submit(&self, action: Submission) -> BoxFuture<'_, Result<serde_json::Value, FetchError>>;
}

pub struct HttpBackend {
    http: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base: &str, tls_ca: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base)?;
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(path) = tls_ca {
            let pem = std::fs::read(path)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        Ok(Self { http: builder.build()?, base })
    }

    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::FatalConfig(format!("bad endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        trace!(%url, "GET");
        let resp = self.http.get(url).send().await?;
        decode(resp).await
    }
}

/// Map status codes, then parse. `{"error": ...}` bodies become [`FetchError::Api`].
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, FetchError> {
    let status = resp.status();
    if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
        return Err(FetchError::AccessDenied);
    }
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(FetchError::Transient(format!("HTTP {status}")));
    }
    let value: serde_json::Value = serde_json::from_slice(&body)?;
    if let Some(msg) = value.get("error").and_then(|e| e.as_str()) {
        return Err(FetchError::Api(msg.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

impl Backend for HttpBackend {
    fn agent_stats(&self) -> BoxFuture<'_, Result<AgentReport, FetchError>> {
        async move { self.get_json(self.url("/api/agent/stats")?).await }.boxed()
    }

    fn node_details<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<NodeDetails, FetchError>> {
        async move {
            let mut url = self.url("/api/node/details")?;
            url.query_pairs_mut().append_pair("token", token);
            self.get_json(url).await
        }
        .boxed()
    }

    fn nodes(&self) -> BoxFuture<'_, Result<Vec<NodeRecord>, FetchError>> {
        async move {
            let list: NodeList = self.get_json(self.url("/api/nodes/list")?).await?;
            Ok(list.nodes)
        }
        .boxed()
    }

    fn logs(&self) -> BoxFuture<'_, Result<Vec<String>, FetchError>> {
        async move {
            let payload: LogsPayload = self.get_json(self.url("/api/logs")?).await?;
            match (payload.logs, payload.error) {
                (_, Some(e)) => Err(FetchError::Api(e)),
                (Some(lines), None) => Ok(lines),
                (None, None) => Err(FetchError::DataShape("missing 'logs' field".into())),
            }
        }
        .boxed()
    }

    fn submit(&self, action: Submission) -> BoxFuture<'_, Result<serde_json::Value, FetchError>> {
        async move {
            let url = self.url(action.path())?;
            debug!(%url, "submitting");
            let resp = self.http.post(url).json(&action.body()).send().await?;
            let status = resp.status();
            if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
                return Err(FetchError::AccessDenied);
            }
            let body = resp.bytes().await?;
            if !status.is_success() {
                return Err(FetchError::Transient(format!("HTTP {status}")));
            }
            if body.is_empty() {
                return Ok(serde_json::Value::Null);
            }
            let value: serde_json::Value = serde_json::from_slice(&body)?;
            if let Some(msg) = value.get("error").and_then(|e| e.as_str()) {
                return Err(FetchError::Api(msg.to_string()));
            }
            Ok(value)
        }
        .boxed()
    }
}
