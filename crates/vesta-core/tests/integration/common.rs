//! Test utilities and mock implementations for integration tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use vesta_core::clause::CompiledQuery;
use vesta_core::config::TimeLimitConfig;
use vesta_core::error::DataError;
use vesta_core::export::ResponseFormatter;
use vesta_core::models::{CapabilitySet, Pagination};
use vesta_core::traits::{CapabilitySource, SearchExecutor};

/// Item-level resource id used across the tests.
pub const ITEM_ID: &str = "example.org/abc123/rs.example.org/pune-env-aqm/ae01";

/// Fixture-deployment time limit: anchored at 2020-10-22, ten-day lookback.
pub fn fixture_time_limit() -> TimeLimitConfig {
    "test,2020-10-22T00:00:00Z,10".parse().unwrap()
}

// =============================================================================
// MockCapabilities
// =============================================================================

/// Capability source returning a fixed set, or failing on demand.
#[derive(Clone)]
pub struct MockCapabilities {
    set: CapabilitySet,
    fail: bool,
}

impl MockCapabilities {
    /// Declares every capability.
    pub fn all() -> Self {
        Self {
            set: CapabilitySet { temporal: true, spatial: true, attribute: true },
            fail: false,
        }
    }

    /// Declares exactly the given set.
    pub fn with_set(set: CapabilitySet) -> Self {
        Self { set, fail: false }
    }

    /// Fails every lookup, simulating an unreachable catalogue.
    pub fn failing() -> Self {
        Self { set: CapabilitySet::default(), fail: true }
    }
}

impl CapabilitySource for MockCapabilities {
    async fn lookup(&self, _resource_id: &str) -> Result<CapabilitySet, DataError> {
        if self.fail {
            return Err(DataError::CapabilityLookup("catalogue unreachable".to_string()));
        }
        Ok(self.set)
    }
}

// =============================================================================
// MockExecutor
// =============================================================================

/// Executor with canned results and call recording.
///
/// `scroll` drives the formatter exactly like the real backend client does:
/// `write(first_page)`, then one `append` per page, then `finish`, then
/// cursor cleanup whose failure — when configured — is surfaced as the call's
/// outcome even though every page was already written.
#[derive(Clone)]
pub struct MockExecutor {
    count: u64,
    search_records: Vec<Value>,
    scroll_pages: Vec<Vec<Value>>,
    fail_cleanup: bool,
    pub last_query: Arc<Mutex<Option<Value>>>,
    pub last_source_fields: Arc<Mutex<Option<Vec<String>>>>,
    pub search_calls: Arc<Mutex<u32>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            count: 1,
            search_records: Vec::new(),
            scroll_pages: Vec::new(),
            fail_cleanup: false,
            last_query: Arc::new(Mutex::new(None)),
            last_source_fields: Arc::new(Mutex::new(None)),
            search_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_search_records(mut self, records: Vec<Value>) -> Self {
        self.search_records = records;
        self
    }

    pub fn with_scroll_pages(mut self, pages: Vec<Vec<Value>>) -> Self {
        self.scroll_pages = pages;
        self
    }

    /// Makes cursor release fail after the scroll loop completes.
    pub fn with_cleanup_failure(mut self) -> Self {
        self.fail_cleanup = true;
        self
    }

    fn record(&self, query: &CompiledQuery) {
        *self.last_query.lock().unwrap() = Some(query.to_document());
        *self.last_source_fields.lock().unwrap() =
            query.source_fields().map(<[String]>::to_vec);
    }
}

impl SearchExecutor for MockExecutor {
    async fn search(
        &self,
        _index: &str,
        query: &CompiledQuery,
        _page: &Pagination,
    ) -> Result<Vec<Value>, DataError> {
        self.record(query);
        *self.search_calls.lock().unwrap() += 1;
        if self.search_records.is_empty() {
            return Err(DataError::EmptyResult);
        }
        Ok(self.search_records.clone())
    }

    async fn count(&self, _index: &str, query: &CompiledQuery) -> Result<u64, DataError> {
        self.record(query);
        if self.count == 0 {
            return Err(DataError::EmptyResult);
        }
        Ok(self.count)
    }

    async fn scroll<F>(
        &self,
        formatter: &mut F,
        _index: &str,
        query: &CompiledQuery,
    ) -> Result<(), DataError>
    where
        F: ResponseFormatter + Send,
    {
        self.record(query);
        let first = self.scroll_pages.first().cloned().unwrap_or_default();
        formatter.write(&first).await?;
        let mut is_first = true;
        for page in &self.scroll_pages {
            if page.is_empty() {
                break;
            }
            formatter.append(page, is_first).await?;
            is_first = false;
        }
        formatter.finish().await?;
        if self.fail_cleanup {
            return Err(DataError::BackendResponse {
                status: 500,
                detail: "failed to release scroll cursor".to_string(),
            });
        }
        Ok(())
    }
}
