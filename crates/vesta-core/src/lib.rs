//! Vesta Core - Query compilation, execution seams and streaming export.
//!
//! This crate provides the core of the Vesta context-data resource server:
//!
//! - **Domain models**: [`SearchRequest`], [`CapabilitySet`], [`SearchResultSet`]
//! - **Predicate model**: [`ClauseKind`], [`Clause`], the [`CompiledQuery`] accumulator
//! - **Filter builders**: pure geo/temporal/attribute clause builders
//! - **Query compilation**: [`QueryCompiler`], enforcing the id-first rule,
//!   capability validation and the default temporal window policy
//! - **Result formatting**: streaming [`JsonFormatter`]/[`CsvFormatter`] encoders
//!   and the [`flatten`](flatten::flatten) utility for tabular output
//! - **Traits**: [`SearchExecutor`], [`CapabilitySource`] for dependency injection
//! - **Orchestration**: [`ResourceQueryService`] tying the above together
//!
//! # Architecture
//!
//! Business logic is decoupled from I/O through traits: the backend and
//! catalogue clients live in `vesta-client` and plug in via [`SearchExecutor`]
//! and [`CapabilitySource`]. Everything here is built fresh per request; no
//! mutable state crosses request boundaries.
//!
//! # Example
//!
//! ```ignore
//! use vesta_core::{ResourceQueryService, SearchRequest, TemporalParams, TemporalRelation};
//!
//! let service = ResourceQueryService::new(executor, catalogue);
//! let request = SearchRequest::new(ids, config.time_limit.clone())
//!     .with_temporal(TemporalParams {
//!         relation: TemporalRelation::During,
//!         time: "2020-10-10T00:00:00Z".into(),
//!         end_time: Some("2020-10-15T00:00:00Z".into()),
//!     });
//! let results = service.search(&request).await?;
//! ```

pub mod attribute;
pub mod clause;
pub mod compiler;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod geo;
pub mod models;
pub mod service;
pub mod temporal;
pub mod traits;

// Error handling
pub use error::DataError;

// Configuration
pub use config::{
    load_config, BackendConfig, CatalogueConfig, DeploymentKind, ServerConfig, TimeLimitConfig,
};

// Domain models
pub use models::{
    AttributePredicate, CapabilitySet, CategorySet, GeoParams, OutputFormat, Pagination,
    SearchRequest, SearchResultSet, TemporalParams, TemporalRelation,
};

// Predicate model and compilation
pub use clause::{Clause, ClauseKind, CompiledQuery};
pub use compiler::QueryCompiler;

// Result formatting
pub use export::{formatter_for, CsvFormatter, FormatterEnum, JsonFormatter, ResponseFormatter};

// Traits for dependency injection
pub use traits::{CapabilitySource, SearchExecutor};

// Orchestration
pub use service::{ResourceQueryService, MAX_INTERACTIVE_RESULTS};
