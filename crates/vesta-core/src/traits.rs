//! Trait definitions for external collaborators.
//!
//! This module defines the seams between the query core and its I/O
//! dependencies (the document-search backend and the resource catalogue),
//! enabling:
//!
//! - **Testability**: mock implementations for unit and integration testing
//! - **Decoupling**: compilation and orchestration logic never touches a
//!   concrete transport

use std::future::Future;

use serde_json::Value;

use crate::clause::CompiledQuery;
use crate::error::DataError;
use crate::export::ResponseFormatter;
use crate::models::{CapabilitySet, Pagination};

/// Source of per-resource capability declarations.
///
/// Consumed exactly once per request, before clause filing completes. A
/// failed lookup is a hard failure of the whole request; the core never
/// retries it.
pub trait CapabilitySource: Send + Sync {
    /// Fetches the capability set declared for `resource_id`.
    fn lookup(
        &self,
        resource_id: &str,
    ) -> impl Future<Output = Result<CapabilitySet, DataError>> + Send;
}

/// Executor of compiled queries against the document-search backend.
///
/// Implementations normalize backend transport and response failures into
/// the [`DataError`] taxonomy; zero-match outcomes surface as
/// [`DataError::EmptyResult`].
pub trait SearchExecutor: Send + Sync {
    /// Point search: returns one page of matching records, field-selected
    /// per the query's source filter.
    ///
    /// # Arguments
    ///
    /// * `index` - Backend index to search
    /// * `query` - Compiled query document
    /// * `page` - Offset/limit window to fetch
    fn search(
        &self,
        index: &str,
        query: &CompiledQuery,
        page: &Pagination,
    ) -> impl Future<Output = Result<Vec<Value>, DataError>> + Send;

    /// Total number of records matching `query`.
    fn count(
        &self,
        index: &str,
        query: &CompiledQuery,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Cursor-based bulk retrieval: feeds every matching record page by page
    /// into `formatter`, never holding more than one page in memory, and
    /// releases the cursor on every exit path.
    fn scroll<F>(
        &self,
        formatter: &mut F,
        index: &str,
        query: &CompiledQuery,
    ) -> impl Future<Output = Result<(), DataError>> + Send
    where
        F: ResponseFormatter + Send;
}
