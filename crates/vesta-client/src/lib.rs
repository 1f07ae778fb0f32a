//! Vesta Client - HTTP clients for external services
//!
//! This crate provides HTTP clients for interacting with:
//!
//! - [`elastic`] - the document-search backend (search, count, bulk scroll)
//! - [`catalogue`] - the resource catalogue (capability lookup)
//!
//! # Overview
//!
//! The clients handle authentication, request building, response parsing and
//! backend error normalization. They implement the `vesta-core` trait seams
//! ([`SearchExecutor`](vesta_core::SearchExecutor) and
//! [`CapabilitySource`](vesta_core::CapabilitySource)), so the query core
//! never touches a concrete transport.

pub mod catalogue;
pub mod elastic;

// Re-export main client types
pub use catalogue::CatalogueClient;
pub use elastic::ElasticsearchClient;
