//! Integration tests for bulk export.

use serde_json::{json, Value};

use vesta_core::error::DataError;
use vesta_core::models::{GeoParams, OutputFormat, SearchRequest};
use vesta_core::service::ResourceQueryService;

use crate::integration::common::{fixture_time_limit, MockCapabilities, MockExecutor, ITEM_ID};

fn export_request(format: OutputFormat) -> SearchRequest {
    SearchRequest::new(vec![ITEM_ID.to_string()], fixture_time_limit())
        .with_geo(GeoParams {
            geometry: Some("bbox".to_string()),
            relation: Some("within".to_string()),
            coordinates: Some(json!([[72.83, 21.2], [72.83, 21.15]])),
            geoproperty: Some("location".to_string()),
            ..GeoParams::default()
        })
        .with_format(format)
}

#[tokio::test]
async fn test_json_export_streams_all_pages_in_order() {
    let executor = MockExecutor::new().with_scroll_pages(vec![
        vec![json!({"id": 1}), json!({"id": 2})],
        vec![json!({"id": 3})],
    ]);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let mut sink = Vec::new();
    service
        .export(&export_request(OutputFormat::Json), &mut sink)
        .await
        .unwrap();

    let parsed: Value = serde_json::from_slice(&sink).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["id"], 1);
    assert_eq!(records[2]["id"], 3);
}

#[tokio::test]
async fn test_json_export_of_empty_result_is_empty_array() {
    let executor = MockExecutor::new();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let mut sink = Vec::new();
    service
        .export(&export_request(OutputFormat::Json), &mut sink)
        .await
        .unwrap();

    let parsed: Value = serde_json::from_slice(&sink).unwrap();
    assert_eq!(parsed, json!([]));
}

#[tokio::test]
async fn test_csv_export_header_and_nan_fill() {
    let executor = MockExecutor::new().with_scroll_pages(vec![
        vec![json!({"id": "a", "co2": 400})],
        vec![json!({"id": "b", "humidity": 40})],
    ]);
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let mut sink = Vec::new();
    service
        .export(&export_request(OutputFormat::Csv), &mut sink)
        .await
        .unwrap();

    let text = String::from_utf8(sink).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "id,co2", "header is fixed from the first page");
    assert_eq!(lines[1], "a,400");
    assert_eq!(lines[2], "b,NAN", "missing header field renders NAN");
    assert_eq!(lines.len(), 3, "later-page-only fields are dropped");
}

#[tokio::test]
async fn test_export_compiles_without_default_window() {
    let executor = MockExecutor::new();
    let last_query = executor.last_query.clone();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let mut sink = Vec::new();
    service
        .export(&export_request(OutputFormat::Json), &mut sink)
        .await
        .unwrap();

    let query = last_query.lock().unwrap().clone().unwrap();
    let filters = query.pointer("/bool/filter").unwrap().as_array().unwrap();
    assert!(
        filters.iter().all(|c| c.pointer("/range/observationDateTime").is_none()),
        "exports never get a default temporal window"
    );
}

#[tokio::test]
async fn test_parquet_export_is_unsupported() {
    let executor = MockExecutor::new();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let mut sink = Vec::new();
    let err = service
        .export(&export_request(OutputFormat::Parquet), &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Validation(ref m) if m.contains("parquet")));
    assert!(sink.is_empty(), "nothing may be written for a rejected format");
}

#[tokio::test]
async fn test_scroll_cleanup_failure_overwrites_success() {
    // Every page is written and the output is complete and well-formed, yet
    // the call reports the cursor-release failure. This pins the observable
    // contract instead of silently correcting it.
    let executor = MockExecutor::new()
        .with_scroll_pages(vec![vec![json!({"id": 1})]])
        .with_cleanup_failure();
    let service = ResourceQueryService::new(executor, MockCapabilities::all());

    let mut sink = Vec::new();
    let err = service
        .export(&export_request(OutputFormat::Json), &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DataError::BackendResponse { status: 500, ref detail } if detail.contains("release")
    ));

    let parsed: Value = serde_json::from_slice(&sink).unwrap();
    assert_eq!(parsed, json!([{"id": 1}]), "the export itself completed");
}
