//! Resource catalogue client for capability lookup.
//!
//! Resolves which predicate categories (TEMPORAL / SPATIAL / ATTR) a
//! resource declares support for. Lookups fall back from the item id to its
//! resource group, and resolved sets are memoized in a per-process cache so
//! repeated requests for the same resource do not touch the catalogue again.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use vesta_core::config::CatalogueConfig;
use vesta_core::error::DataError;
use vesta_core::models::CapabilitySet;
use vesta_core::traits::CapabilitySource;

/// HTTP client for the resource catalogue.
#[derive(Clone)]
pub struct CatalogueClient {
    http: Client,
    base_url: Url,
    cache: Arc<RwLock<HashMap<String, CapabilitySet>>>,
}

impl CatalogueClient {
    /// Creates a new catalogue client.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Config` if the endpoint URL is malformed.
    pub fn new(config: &CatalogueConfig) -> Result<Self, DataError> {
        let base_url = Url::parse(&config.endpoint).map_err(|e| {
            DataError::Config(format!(
                "invalid catalogue endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;
        Ok(Self {
            http: Client::new(),
            base_url,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn cached(&self, id: &str) -> Option<CapabilitySet> {
        let cache = self.cache.read().expect("capability cache poisoned");
        cache
            .get(id)
            .or_else(|| cache.get(&group_cache_key(id)))
            .copied()
    }

    fn remember(&self, key: String, set: CapabilitySet) {
        self.cache
            .write()
            .expect("capability cache poisoned")
            .insert(key, set);
    }

    /// Fetches the capability labels declared for one catalogue item.
    async fn fetch_item(&self, id: &str) -> Result<Option<CapabilitySet>, DataError> {
        let url = self
            .base_url
            .join("item")
            .map_err(|e| DataError::Config(format!("invalid catalogue path: {}", e)))?;
        let response = self
            .http
            .get(url)
            .query(&[("id", id)])
            .send()
            .await
            .map_err(|e| DataError::CapabilityLookup(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DataError::CapabilityLookup(format!(
                "catalogue responded {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| DataError::CapabilityLookup(e.to_string()))?;
        let labels = parse_filters(&body);
        if labels.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CapabilitySet::from_labels(&labels)))
        }
    }
}

impl CapabilitySource for CatalogueClient {
    async fn lookup(&self, resource_id: &str) -> Result<CapabilitySet, DataError> {
        if let Some(set) = self.cached(resource_id) {
            return Ok(set);
        }

        if let Some(set) = self.fetch_item(resource_id).await? {
            debug!(id = %resource_id, "capabilities resolved from item");
            self.remember(resource_id.to_string(), set);
            return Ok(set);
        }

        // Item carries no declaration; fall back to its resource group.
        let group_id = group_id(resource_id);
        if let Some(set) = self.fetch_item(group_id).await? {
            debug!(id = %group_id, "capabilities resolved from group");
            self.remember(group_cache_key(resource_id), set);
            return Ok(set);
        }

        warn!(id = %resource_id, "no applicable filters declared");
        Err(DataError::CapabilityLookup(format!(
            "no applicable filters declared for '{}'",
            resource_id
        )))
    }
}

/// Group-level id: the resource id with its final segment dropped.
fn group_id(resource_id: &str) -> &str {
    match resource_id.rfind('/') {
        Some(index) => &resource_id[..index],
        None => resource_id,
    }
}

fn group_cache_key(resource_id: &str) -> String {
    format!("{}/*", group_id(resource_id))
}

/// Collects capability labels from a catalogue response body.
fn parse_filters(body: &Value) -> Vec<String> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|item| item.get("iudxResourceAPIs"))
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
