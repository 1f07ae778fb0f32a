//! Query compiler: orchestrates the filter builders into one backend document.

use serde_json::json;
use tracing::debug;

use crate::attribute::build_attribute_clauses;
use crate::clause::{Clause, CompiledQuery};
use crate::error::DataError;
use crate::geo::build_geo_clause;
use crate::models::{CapabilitySet, SearchRequest};
use crate::temporal::{build_temporal_clause, default_window_clause};

/// Compiles [`SearchRequest`]s into backend query documents.
///
/// Stateless; a fresh clause accumulator is threaded through the builders on
/// every call, so compilations never share or mutate common state.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler;

impl QueryCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles an interactive (search/count) query.
    ///
    /// When the target resource supports temporal predicates and the request
    /// carries none, a default temporal window is added so an unbounded time
    /// series cannot be scanned without bound.
    pub fn compile(
        &self,
        request: &SearchRequest,
        capabilities: &CapabilitySet,
    ) -> Result<CompiledQuery, DataError> {
        self.assemble(request, capabilities, false)
    }

    /// Compiles a bulk-export query. Exports walk the full cursor anyway, so
    /// no default temporal window is applied.
    pub fn compile_export(
        &self,
        request: &SearchRequest,
        capabilities: &CapabilitySet,
    ) -> Result<CompiledQuery, DataError> {
        self.assemble(request, capabilities, true)
    }

    fn assemble(
        &self,
        request: &SearchRequest,
        capabilities: &CapabilitySet,
        is_export: bool,
    ) -> Result<CompiledQuery, DataError> {
        request.validate()?;

        // Every query carries exactly one id clause, built from the first id.
        let mut clauses = vec![Clause::equivalent(json!({
            "terms": { "id": [request.primary_id()] }
        }))];

        let mut fired = false;
        let mut explicit_temporal = false;

        if request.categories.temporal {
            if let Some(temporal) = &request.temporal {
                clauses.push(build_temporal_clause(temporal, &request.time_limit)?);
                explicit_temporal = true;
                fired = true;
            }
        }

        if request.categories.attribute {
            // The first decode failure aborts the whole compile.
            clauses.extend(build_attribute_clauses(&request.attributes)?);
            fired = true;
        }

        if request.categories.geo {
            let geo = request.geo.as_ref().ok_or(DataError::MissingGeoParameters)?;
            clauses.push(build_geo_clause(geo)?);
            fired = true;
        }

        if !fired {
            return Err(DataError::InvalidSearchQuery);
        }

        // Capability cross-check runs before the default window commits: a
        // category the resource does not support fails the whole request.
        if request.categories.temporal && !capabilities.temporal {
            return Err(DataError::Validation(
                "temporal parameters are not supported by the resource".to_string(),
            ));
        }
        if request.categories.geo && !capabilities.spatial {
            return Err(DataError::Validation(
                "spatial parameters are not supported by the resource".to_string(),
            ));
        }
        if request.categories.attribute && !capabilities.attribute {
            return Err(DataError::Validation(
                "attribute parameters are not supported by the resource".to_string(),
            ));
        }

        if capabilities.temporal && !explicit_temporal && !is_export {
            clauses.push(default_window_clause(&request.time_limit)?);
        }

        let mut query = CompiledQuery::new().with_clauses(clauses);

        if request.categories.response_filter {
            let fields = request.response_fields.clone().ok_or_else(|| {
                DataError::Validation(
                    "response filtering fields are not passed in attrs parameter".to_string(),
                )
            })?;
            query = query.with_source_fields(fields);
        }

        debug!(document = %query.to_document(), "compiled query");
        Ok(query)
    }
}
