mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value as Json};
use tower::ServiceExt;

use wine_pipeline::api::{router, AppState};
use wine_pipeline::PipelineConfig;

fn app() -> axum::Router {
    router(AppState::new(PipelineConfig::default()))
}

async fn send(uri: &str, body: &Json) -> axum::response::Response {
    app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post(uri: &str, body: Json) -> (StatusCode, Json) {
    let response = send(uri, &body).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn normalize_cleans_names() {
    let (status, body) = post(
        "/api/normalize",
        json!({
            "columns": ["Fixed Acidity", "Quality"],
            "rows": [[7.4, 5], [7.4, 5], [7.8, 6]]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["fixed_acidity", "quality"]));
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn validate_reports_out_of_range_quality() {
    let mut data = serde_json::to_value(common::raw_wine(40, 1)).unwrap();
    // Имена колонок к каноническому виду вручную
    data["columns"] = json!([
        "fixed_acidity", "volatile_acidity", "citric_acid", "residual_sugar", "chlorides",
        "free_sulfur_dioxide", "total_sulfur_dioxide", "density", "ph", "sulphates",
        "alcohol", "quality"
    ]);
    data["rows"][0][11] = json!(10);

    let (status, body) = post("/api/validate", json!({ "data": data })).await;

    assert_eq!(status, StatusCode::OK);
    let violations = body["violations"].as_array().unwrap();
    assert!(violations
        .iter()
        .any(|v| v["column"] == "quality" && v["check"].as_str().unwrap().starts_with("isin")));
}

#[tokio::test]
async fn split_rejects_bad_fraction() {
    let data = serde_json::to_value(common::two_feature(10, 1)).unwrap();
    let (status, body) = post(
        "/api/split",
        json!({ "data": data, "config": { "test_fraction": 1.5 } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("test fraction"));
}

#[tokio::test]
async fn split_is_deterministic() {
    let data = serde_json::to_value(common::two_feature(100, 2)).unwrap();
    let (_, first) = post("/api/split", json!({ "data": data.clone() })).await;
    let (_, second) = post("/api/split", json!({ "data": data })).await;

    assert_eq!(first["test"]["rows"].as_array().unwrap().len(), 20);
    assert_eq!(first, second);
}

#[tokio::test]
async fn drift_of_identical_sets_is_zero() {
    let data = serde_json::to_value(common::two_feature(30, 4)).unwrap();
    let (status, body) = post("/api/drift", json!({ "train": data.clone(), "test": data })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passed"], json!(true));
    assert_eq!(body["scores"]["feature1"], json!(0.0));
    assert_eq!(body["scores"]["feature2"], json!(0.0));
}

#[tokio::test]
async fn ragged_rows_are_a_client_error() {
    let data = json!({
        "columns": ["fixed_acidity", "quality"],
        "rows": [[7.4, 5], [7.8]]
    });

    for (uri, body) in [
        ("/api/validate", json!({ "data": data.clone() })),
        ("/api/split", json!({ "data": data.clone() })),
        ("/api/normalize", data.clone()),
        ("/api/drift", json!({ "train": data.clone(), "test": data.clone() })),
    ] {
        let status = send(uri, &body).await.status();
        assert!(status.is_client_error(), "{uri} answered {status}");
    }
}
