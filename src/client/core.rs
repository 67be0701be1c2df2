// HTTP implementation of `EntryStore` against the journal REST API.
use crate::client::EntryStore;
use crate::client::error::StoreError;
use crate::client::middleware::{ApiHeadersLayer, ApiHeadersService};
use crate::model::{EntryPayload, JournalEntry, format_date};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use http::{Method, Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use std::fmt;
use tower::ServiceExt;
use tower_layer::Layer;

pub const HEALTH_PATH: &str = "/health";
pub const ENTRIES_PATH: &str = "/entradas";

type HttpsClient = ApiHeadersService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}

fn entry_path(date: NaiveDate) -> String {
    format!("{}/{}", ENTRIES_PATH, format_date(date))
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: HttpsClient,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Builds a client for `base_url` (e.g. `http://localhost:5000/api`).
    /// Both `http` and `https` endpoints are accepted.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .with_context(|| format!("Invalid API URL '{}'", base_url))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            anyhow::bail!("API URL '{}' must include scheme and host", base_url);
        }

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        let (added, _ignored) = root_store.add_parsable_certificates(result.certs);
        if added == 0 {
            log::warn!("No system certificates found; https endpoints will fail to verify");
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let http = ApiHeadersLayer::default().layer(http_client);

        log::debug!("API client ready for {}", base_url);
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<(StatusCode, Vec<u8>), StoreError> {
        let uri = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, uri);

        let req = Request::builder()
            .method(method)
            .uri(&uri)
            .body(body.unwrap_or_default())
            .map_err(|e| StoreError::Connectivity(format!("invalid request: {}", e)))?;

        let response = self.http.clone().oneshot(req).await.map_err(|e| {
            log::warn!("Request to {} failed: {}", uri, e);
            StoreError::Connectivity(e.to_string())
        })?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| StoreError::Connectivity(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            log::info!("{} answered {}", uri, status);
        }
        Ok((status, bytes.to_vec()))
    }

    fn remote_error(status: StatusCode, body: &[u8]) -> StoreError {
        StoreError::Remote {
            status,
            message: error_message(body),
        }
    }

    async fn send_payload(&self, method: Method, path: &str, payload: &EntryPayload) -> Result<(), StoreError> {
        let body = serde_json::to_string(payload).map_err(|e| StoreError::Decode(e.to_string()))?;
        let (status, bytes) = self.send(method, path, Some(body)).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::remote_error(status, &bytes))
        }
    }
}

impl EntryStore for ApiClient {
    async fn health(&self) -> Result<(), StoreError> {
        let (status, bytes) = self.send(Method::GET, HEALTH_PATH, None).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::remote_error(status, &bytes))
        }
    }

    async fn list(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let (status, bytes) = self.send(Method::GET, ENTRIES_PATH, None).await?;
        if !status.is_success() {
            return Err(Self::remote_error(status, &bytes));
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn get(&self, date: NaiveDate) -> Result<JournalEntry, StoreError> {
        let (status, bytes) = self.send(Method::GET, &entry_path(date), None).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        if !status.is_success() {
            return Err(Self::remote_error(status, &bytes));
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn create(&self, payload: &EntryPayload) -> Result<(), StoreError> {
        self.send_payload(Method::POST, ENTRIES_PATH, payload).await
    }

    async fn update(&self, payload: &EntryPayload) -> Result<(), StoreError> {
        self.send_payload(Method::PUT, &entry_path(payload.date), payload)
            .await
    }

    async fn delete(&self, date: NaiveDate) -> Result<(), StoreError> {
        let (status, bytes) = self.send(Method::DELETE, &entry_path(date), None).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::remote_error(status, &bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_relative_url() {
        assert!(ApiClient::new("/api").is_err());
        assert!(ApiClient::new("not a url").is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(br#"{"error": "Ya existe"}"#).as_deref(),
            Some("Ya existe")
        );
        assert_eq!(error_message(br#"{"message": "x"}"#), None);
        assert_eq!(error_message(br#"{"error": "  "}"#), None);
        assert_eq!(error_message(b"<html>"), None);
    }

    #[test]
    fn test_entry_path_format() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(entry_path(d), "/entradas/2024-01-05");
    }
}
