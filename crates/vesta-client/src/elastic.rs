//! Elasticsearch-compatible search backend client.
//!
//! Implements [`SearchExecutor`] over the backend's REST API: point search,
//! count, and cursor-based bulk scroll. Backend failures are normalized into
//! the core error taxonomy here; callers never see raw transport errors.

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use vesta_core::clause::CompiledQuery;
use vesta_core::config::BackendConfig;
use vesta_core::error::DataError;
use vesta_core::export::ResponseFormatter;
use vesta_core::models::Pagination;
use vesta_core::traits::SearchExecutor;

/// Records fetched per scroll page.
const SCROLL_PAGE_SIZE: usize = 10_000;

/// Keep-alive window for scroll cursors.
const SCROLL_KEEP_ALIVE: &str = "5m";

/// Response envelope of the backend's count API.
#[derive(Deserialize, Debug)]
struct CountResponse {
    count: u64,
}

/// HTTP client for the document-search backend.
///
/// The underlying connection pool is a process-wide shared resource;
/// concurrent searches and exports interleave freely because each call
/// carries its own cursor and query state.
///
/// # Examples
///
/// ```no_run
/// use vesta_client::ElasticsearchClient;
/// use vesta_core::config::BackendConfig;
///
/// # fn example() -> Result<(), vesta_core::DataError> {
/// let config = BackendConfig {
///     endpoint: "http://localhost:9200".to_string(),
///     username: "elastic".to_string(),
///     password: "secret".to_string(),
///     timeout_secs: 180,
/// };
/// let client = ElasticsearchClient::new(&config)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ElasticsearchClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
}

impl ElasticsearchClient {
    /// Creates a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Config` if the endpoint URL is malformed and
    /// `DataError::BackendTransport` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, DataError> {
        let base_url = Url::parse(&config.endpoint).map_err(|e| {
            DataError::Config(format!("invalid backend endpoint '{}': {}", config.endpoint, e))
        })?;
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataError::BackendTransport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DataError> {
        self.base_url
            .join(path)
            .map_err(|e| DataError::Config(format!("invalid backend path '{}': {}", path, e)))
    }

    async fn post(&self, url: Url, query: &[(&str, &str)], body: &Value) -> Result<Value, DataError> {
        let response = self
            .http
            .post(url)
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(|e| DataError::BackendTransport(e.to_string()))?;
        Self::decode_body(response).await
    }

    async fn decode_body(response: reqwest::Response) -> Result<Value, DataError> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(body)
        } else {
            Err(normalize_error(status, &body))
        }
    }

    /// Extracts the record list from either of the two known response
    /// envelope shapes. `None` means neither shape was present.
    fn extract_documents(body: &Value) -> Option<Vec<Value>> {
        if let Some(hits) = body.pointer("/hits/hits").and_then(Value::as_array) {
            return Some(hits.iter().filter_map(|hit| hit.get("_source")).cloned().collect());
        }
        if let Some(docs) = body.get("docs").and_then(Value::as_array) {
            return Some(docs.iter().filter_map(|doc| doc.get("_source")).cloned().collect());
        }
        None
    }

    async fn run_scroll<F>(
        &self,
        formatter: &mut F,
        index: &str,
        query: &CompiledQuery,
        scroll_id: &mut Option<String>,
    ) -> Result<(), DataError>
    where
        F: ResponseFormatter + Send,
    {
        let mut body = json!({
            "size": SCROLL_PAGE_SIZE,
            "query": query.to_document(),
        });
        if let Some(fields) = query.source_fields() {
            body["_source"] = json!(fields);
        }

        let url = self.endpoint(&format!("{}/_search", index))?;
        let envelope = self.post(url, &[("scroll", SCROLL_KEEP_ALIVE)], &body).await?;
        *scroll_id = envelope.get("_scroll_id").and_then(Value::as_str).map(str::to_string);
        let mut page = Self::extract_documents(&envelope).unwrap_or_default();

        formatter.write(&page).await?;
        let mut first_page = true;
        while !page.is_empty() {
            // Page N+1 is never requested until page N is fully written.
            formatter.append(&page, first_page).await?;
            first_page = false;

            let Some(id) = scroll_id.clone() else { break };
            let url = self.endpoint("_search/scroll")?;
            let envelope = self
                .post(url, &[], &json!({ "scroll": SCROLL_KEEP_ALIVE, "scroll_id": id }))
                .await?;
            *scroll_id = envelope.get("_scroll_id").and_then(Value::as_str).map(str::to_string);
            page = Self::extract_documents(&envelope).unwrap_or_default();
        }
        formatter.finish().await
    }

    async fn clear_scroll(&self, scroll_id: Option<String>) -> Result<(), DataError> {
        let Some(id) = scroll_id else { return Ok(()) };
        debug!(scroll_id = %id, "releasing scroll cursor");
        let url = self.endpoint("_search/scroll")?;
        let response = self
            .http
            .delete(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&json!({ "scroll_id": [id] }))
            .send()
            .await
            .map_err(|e| DataError::BackendTransport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DataError::BackendResponse {
                status: response.status().as_u16(),
                detail: "failed to release scroll cursor".to_string(),
            });
        }
        Ok(())
    }
}

impl SearchExecutor for ElasticsearchClient {
    async fn search(
        &self,
        index: &str,
        query: &CompiledQuery,
        page: &Pagination,
    ) -> Result<Vec<Value>, DataError> {
        let mut body = json!({
            "from": page.offset,
            "size": page.limit,
            "query": query.to_document(),
        });
        if let Some(fields) = query.source_fields() {
            body["_source"] = json!(fields);
        }
        let url = self.endpoint(&format!("{}/_search", index))?;
        let envelope = self.post(url, &[], &body).await?;
        Self::extract_documents(&envelope).ok_or(DataError::EmptyResult)
    }

    async fn count(&self, index: &str, query: &CompiledQuery) -> Result<u64, DataError> {
        let url = self.endpoint(&format!("{}/_count", index))?;
        let envelope = self.post(url, &[], &json!({ "query": query.to_document() })).await?;
        let parsed: CountResponse =
            serde_json::from_value(envelope).map_err(|_| DataError::BackendResponse {
                status: 200,
                detail: "malformed count response".to_string(),
            })?;
        if parsed.count == 0 {
            return Err(DataError::EmptyResult);
        }
        Ok(parsed.count)
    }

    async fn scroll<F>(
        &self,
        formatter: &mut F,
        index: &str,
        query: &CompiledQuery,
    ) -> Result<(), DataError>
    where
        F: ResponseFormatter + Send,
    {
        let mut scroll_id = None;
        let result = self.run_scroll(formatter, index, query, &mut scroll_id).await;
        if let Err(e) = &result {
            error!(index = %index, "scroll failed: {}", e);
        }
        let cleanup = self.clear_scroll(scroll_id).await;
        scroll_outcome(result, cleanup)
    }
}

/// Combines the scroll loop's result with the cursor cleanup's result.
///
/// Cleanup runs on every exit path, and a cleanup failure is the call's
/// outcome even when every page was already written successfully.
fn scroll_outcome(
    scroll: Result<(), DataError>,
    cleanup: Result<(), DataError>,
) -> Result<(), DataError> {
    cleanup.and(scroll)
}

/// Maps a non-success backend response to the error taxonomy, unwrapping the
/// embedded structured error body when one is present.
fn normalize_error(status: StatusCode, body: &Value) -> DataError {
    let reason = body
        .pointer("/error/root_cause/0/reason")
        .or_else(|| body.pointer("/error/reason"))
        .and_then(Value::as_str);
    DataError::BackendResponse {
        status: status.as_u16(),
        detail: reason.unwrap_or("Bad parameters").to_string(),
    }
}
