//! Request orchestration: capability lookup, compilation, execution.

use tokio::io::AsyncWrite;
use tracing::{debug, info};

use crate::compiler::QueryCompiler;
use crate::error::DataError;
use crate::export::formatter_for;
use crate::models::{CapabilitySet, SearchRequest, SearchResultSet};
use crate::traits::{CapabilitySource, SearchExecutor};

/// Interactive searches matching more records than this fail with
/// [`DataError::ResultWindowExceeded`] instead of paging.
pub const MAX_INTERACTIVE_RESULTS: u64 = 50_000;

/// Per-request orchestration over the trait seams.
///
/// Each call validates the request, performs one capability lookup, compiles
/// the query and drives the executor. Nothing is cached or shared between
/// calls at this layer.
pub struct ResourceQueryService<E, C>
where
    E: SearchExecutor,
    C: CapabilitySource,
{
    executor: E,
    capabilities: C,
    compiler: QueryCompiler,
}

impl<E, C> ResourceQueryService<E, C>
where
    E: SearchExecutor,
    C: CapabilitySource,
{
    /// Creates a service over the given executor and capability source.
    pub fn new(executor: E, capabilities: C) -> Self {
        Self {
            executor,
            capabilities,
            compiler: QueryCompiler::new(),
        }
    }

    /// Interactive search.
    ///
    /// The compiled query is counted first; requests matching more than
    /// [`MAX_INTERACTIVE_RESULTS`] records fail before any document is
    /// fetched. Otherwise one page is fetched per the request's pagination
    /// and returned together with the total match count.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResultSet, DataError> {
        request.validate()?;
        let capabilities = self.applicable_filters(request).await?;
        let query = self.compiler.compile(request, &capabilities)?;
        let index = request.search_index();

        let total = self.executor.count(&index, &query).await?;
        if total > MAX_INTERACTIVE_RESULTS {
            return Err(DataError::ResultWindowExceeded(total));
        }
        debug!(index = %index, total, "executing search");

        let records = self
            .executor
            .search(&index, &query, &request.pagination)
            .await?;
        Ok(SearchResultSet {
            records,
            total_hits: Some(total),
            offset: request.pagination.offset,
            limit: request.pagination.limit,
        })
    }

    /// Total match count for a request.
    ///
    /// Field selection has no effect on a count, so combining the two is a
    /// declared-invalid request.
    pub async fn count(&self, request: &SearchRequest) -> Result<u64, DataError> {
        request.validate()?;
        if request.categories.response_filter {
            return Err(DataError::CountNotSupportedWithFiltering);
        }
        let capabilities = self.applicable_filters(request).await?;
        let query = self.compiler.compile(request, &capabilities)?;
        self.executor.count(&request.search_index(), &query).await
    }

    /// Bulk export into `sink`, encoded per the request's output format.
    ///
    /// The sink is owned by this call for its whole lifetime and released by
    /// the formatter when the export finishes.
    pub async fn export<W>(&self, request: &SearchRequest, sink: W) -> Result<(), DataError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        request.validate()?;
        let capabilities = self.applicable_filters(request).await?;
        let query = self.compiler.compile_export(request, &capabilities)?;
        let mut formatter = formatter_for(request.format, sink)?;
        let index = request.search_index();
        info!(index = %index, format = ?request.format, "starting export");
        self.executor.scroll(&mut formatter, &index, &query).await
    }

    async fn applicable_filters(
        &self,
        request: &SearchRequest,
    ) -> Result<CapabilitySet, DataError> {
        self.capabilities
            .lookup(request.primary_id())
            .await
            .map_err(|e| match e {
                err @ DataError::CapabilityLookup(_) => err,
                other => DataError::CapabilityLookup(other.to_string()),
            })
    }
}
