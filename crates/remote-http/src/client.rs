use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tulia_core::errors::{Error, RemoteError, Result};
use tulia_core::remote::{DocumentStore, FieldFilter, FieldMap};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Error body returned by the document API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    filters: &'a [FieldFilter],
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct BatchUpdateEntry {
    id: String,
    fields: FieldMap,
}

#[derive(Debug, Serialize)]
struct BatchUpdateRequest {
    updates: Vec<BatchUpdateEntry>,
}

#[derive(Debug, Serialize)]
struct IncrementRequest<'a> {
    field: &'a str,
    delta: i64,
}

/// Document store client over the REST API.
///
/// Documents live at `/v1/{collection}/{id}`; collection-level operations
/// use `:query` and `:batchUpdate`, and counters move through
/// `/{id}:increment` so the server applies the delta atomically.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpDocumentStore {
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the document API (e.g. "https://api.tulia.app")
    /// * `token` - Bearer token sent with every request
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::transport(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| Error::Auth("invalid access token format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);
        Ok(headers)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/v1/{}/{}", self.base_url, collection, id)
    }

    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    fn api_error(status: StatusCode, body: &str) -> Error {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            if !error.message.is_empty() {
                return RemoteError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                )
                .into();
            }
        }
        RemoteError::api(status.as_u16(), format!("request failed: {}", body)).into()
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            RemoteError::api(status.as_u16(), format!("failed to parse response: {e}")).into()
        })
    }

    /// Check a response whose body the caller does not need.
    async fn check_response(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            debug!("API response status: {}", status);
            return Ok(());
        }
        let body = response.text().await.map_err(transport)?;
        Self::log_response(status, &body);
        Err(Self::api_error(status, &body))
    }
}

fn transport(err: reqwest::Error) -> Error {
    RemoteError::transport(err.to_string()).into()
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    /// GET /v1/{collection}/{id}
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let url = self.document_url(collection, id);
        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::parse_response(response).await?))
    }

    /// PUT /v1/{collection}/{id}
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()> {
        let url = self.document_url(collection, id);
        let response = self
            .client
            .put(&url)
            .headers(self.headers()?)
            .json(&document)
            .send()
            .await
            .map_err(transport)?;
        Self::check_response(response).await
    }

    /// PATCH /v1/{collection}/{id}
    async fn update(&self, collection: &str, id: &str, fields: FieldMap) -> Result<()> {
        let url = self.document_url(collection, id);
        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(&Value::Object(fields))
            .send()
            .await
            .map_err(transport)?;
        Self::check_response(response).await
    }

    /// POST /v1/{collection}:query
    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<Value>> {
        let url = format!("{}/v1/{}:query", self.base_url, collection);
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&QueryRequest { filters })
            .send()
            .await
            .map_err(transport)?;
        let parsed: QueryResponse = Self::parse_response(response).await?;
        Ok(parsed.documents)
    }

    /// POST /v1/{collection}:batchUpdate
    async fn batch_update(
        &self,
        collection: &str,
        updates: Vec<(String, FieldMap)>,
    ) -> Result<()> {
        let url = format!("{}/v1/{}:batchUpdate", self.base_url, collection);
        let body = BatchUpdateRequest {
            updates: updates
                .into_iter()
                .map(|(id, fields)| BatchUpdateEntry { id, fields })
                .collect(),
        };
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check_response(response).await
    }

    /// POST /v1/{collection}/{id}:increment
    async fn increment(&self, collection: &str, id: &str, field: &str, delta: i64) -> Result<()> {
        let url = format!("{}:increment", self.document_url(collection, id));
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&IncrementRequest { field, delta })
            .send()
            .await
            .map_err(transport)?;
        Self::check_response(response).await
    }
}
