//! Integration tests for interactive search and count.

use serde_json::json;

use vesta_core::error::DataError;
use vesta_core::models::{CapabilitySet, GeoParams, SearchRequest};
use vesta_core::service::ResourceQueryService;

use crate::integration::common::{fixture_time_limit, MockCapabilities, MockExecutor, ITEM_ID};

fn bbox_request() -> SearchRequest {
    SearchRequest::new(vec![ITEM_ID.to_string()], fixture_time_limit()).with_geo(GeoParams {
        geometry: Some("bbox".to_string()),
        relation: Some("within".to_string()),
        coordinates: Some(json!([[72.83, 21.2], [72.83, 21.15]])),
        geoproperty: Some("location".to_string()),
        ..GeoParams::default()
    })
}

#[tokio::test]
async fn test_search_returns_records_and_total() {
    let executor = MockExecutor::new()
        .with_count(2)
        .with_search_records(vec![json!({"id": "a"}), json!({"id": "b"})]);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let result = service.search(&bbox_request()).await.unwrap();

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.total_hits, Some(2));
    assert_eq!(result.offset, 0);
    assert_eq!(result.limit, 10);
}

#[tokio::test]
async fn test_search_zero_matches_is_empty_result() {
    let executor = MockExecutor::new().with_count(0);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let err = service.search(&bbox_request()).await.unwrap_err();
    assert!(err.is_empty_result());
    assert_eq!(err.status_code(), 204);
}

#[tokio::test]
async fn test_search_result_window_guard_skips_fetch() {
    let executor = MockExecutor::new()
        .with_count(60_000)
        .with_search_records(vec![json!({"id": "a"})]);
    let search_calls = executor.search_calls.clone();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let err = service.search(&bbox_request()).await.unwrap_err();
    assert!(matches!(err, DataError::ResultWindowExceeded(60_000)));
    assert_eq!(*search_calls.lock().unwrap(), 0, "no documents may be fetched");
}

#[tokio::test]
async fn test_search_passes_source_fields_to_executor() {
    let executor = MockExecutor::new()
        .with_count(1)
        .with_search_records(vec![json!({"id": "a"})]);
    let fields = executor.last_source_fields.clone();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let request = bbox_request().with_response_fields(vec!["id".to_string(), "co2".to_string()]);
    service.search(&request).await.unwrap();

    assert_eq!(
        *fields.lock().unwrap(),
        Some(vec!["id".to_string(), "co2".to_string()])
    );
}

#[tokio::test]
async fn test_search_applies_default_window_for_temporal_resource() {
    let executor = MockExecutor::new()
        .with_count(1)
        .with_search_records(vec![json!({"id": "a"})]);
    let last_query = executor.last_query.clone();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    service.search(&bbox_request()).await.unwrap();

    let query = last_query.lock().unwrap().clone().unwrap();
    let filters = query.pointer("/bool/filter").unwrap().as_array().unwrap();
    assert!(
        filters.iter().any(|c| c.pointer("/range/observationDateTime").is_some()),
        "interactive query on a TEMPORAL resource must carry a default window"
    );
}

#[tokio::test]
async fn test_search_skips_default_window_without_temporal_capability() {
    let executor = MockExecutor::new()
        .with_count(1)
        .with_search_records(vec![json!({"id": "a"})]);
    let last_query = executor.last_query.clone();
    let capabilities = MockCapabilities::with_set(CapabilitySet {
        temporal: false,
        spatial: true,
        attribute: false,
    });
    let service = ResourceQueryService::new(executor, capabilities);

    service.search(&bbox_request()).await.unwrap();

    let query = last_query.lock().unwrap().clone().unwrap();
    let filters = query.pointer("/bool/filter").unwrap().as_array().unwrap();
    assert!(filters
        .iter()
        .all(|c| c.pointer("/range/observationDateTime").is_none()));
}

#[tokio::test]
async fn test_unsupported_category_fails_request() {
    let executor = MockExecutor::new().with_count(1);
    let capabilities = MockCapabilities::with_set(CapabilitySet {
        temporal: true,
        spatial: false,
        attribute: true,
    });
    let service = ResourceQueryService::new(executor, capabilities);

    let err = service.search(&bbox_request()).await.unwrap_err();
    assert!(matches!(err, DataError::Validation(ref m) if m.contains("spatial")));
}

#[tokio::test]
async fn test_capability_lookup_failure_fails_request() {
    let executor = MockExecutor::new().with_count(1);
    let service = ResourceQueryService::new(executor, MockCapabilities::failing());

    let err = service.search(&bbox_request()).await.unwrap_err();
    assert!(matches!(err, DataError::CapabilityLookup(_)));
    assert!(err.to_string().contains("failed to get filters for validation"));
}

#[tokio::test]
async fn test_count_returns_total() {
    let executor = MockExecutor::new().with_count(42);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    assert_eq!(service.count(&bbox_request()).await.unwrap(), 42);
}

#[tokio::test]
async fn test_count_rejects_field_selection() {
    let executor = MockExecutor::new().with_count(42);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let request = bbox_request().with_response_fields(vec!["id".to_string()]);
    let err = service.count(&request).await.unwrap_err();
    assert!(matches!(err, DataError::CountNotSupportedWithFiltering));
}

#[tokio::test]
async fn test_count_zero_is_empty_result() {
    let executor = MockExecutor::new().with_count(0);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let err = service.count(&bbox_request()).await.unwrap_err();
    assert!(err.is_empty_result());
}

#[tokio::test]
async fn test_malformed_id_rejected_before_lookup() {
    let executor = MockExecutor::new();
    let service = ResourceQueryService::new(executor, MockCapabilities::failing());

    // The failing capability source must never be consulted: validation
    // rejects the id first.
    let request = SearchRequest::new(vec!["bad-id".to_string()], fixture_time_limit());
    let err = service.search(&request).await.unwrap_err();
    assert!(matches!(err, DataError::Validation(ref m) if m.contains("malformed id")));
}
