//! End-to-end tests driving the router in memory.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use stockroom_api::{router, AppState, ServerConfig};
use stockroom_db::{Database, DbConfig};

async fn setup() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let app = router(AppState::new(db.clone(), ServerConfig::default()));
    (app, db)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn widget() -> Value {
    json!({
        "name": "Widget",
        "sku": "WID123",
        "barcode": "5901234123457",
        "quantity": 5,
        "alert_threshold": 10
    })
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let (app, _db) = setup().await;

    let (status, body) = send(&app, "GET", "/api/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["endpoints"]["products"], "/api/products/");

    let (status, _) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_database() {
    let (app, db) = setup().await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    db.close().await;
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_create_then_get_and_list() {
    let (app, _db) = setup().await;

    let (status, created) = send(&app, "POST", "/api/products/", Some(widget())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["sku"], "WID123");
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = send(&app, "GET", &format!("/api/products/{id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Widget");

    let (status, list) = send(&app, "GET", "/api/products/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_missing_fields_is_field_level_400() {
    let (app, _db) = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/products/",
        Some(json!({ "sku": "X1", "quantity": -2 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["name"].is_array());

    let (_, list) = send(&app, "GET", "/api/products/", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_sku_is_conflict_on_sku() {
    let (app, _db) = setup().await;
    send(&app, "POST", "/api/products/", Some(widget())).await;

    let (status, body) = send(&app, "POST", "/api/products/", Some(widget())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert!(body["fields"]["sku"].is_array());
}

#[tokio::test]
async fn test_update_partial_and_logged_with_source() {
    let (app, _db) = setup().await;
    let (_, created) = send(&app, "POST", "/api/products/", Some(widget())).await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/products/{id}/?source=scanned"),
        Some(json!({ "quantity": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 20);
    assert_eq!(updated["name"], "Widget");

    let (_, logs) = send(&app, "GET", "/api/logs/", None).await;
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "edit");
    assert_eq!(logs[0]["source"], "scanned");
    assert_eq!(logs[0]["quantity_change"], 15);
    assert_eq!(logs[1]["action"], "add");
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let (app, _db) = setup().await;

    let (status, body) = send(&app, "GET", "/api/products/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = send(
        &app,
        "PUT",
        "/api/products/999/",
        Some(json!({ "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/api/products/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_keeps_log_rows_with_cleared_reference() {
    let (app, _db) = setup().await;
    let (_, created) = send(&app, "POST", "/api/products/", Some(widget())).await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("/api/products/{id}/"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, logs) = send(&app, "GET", "/api/logs/", None).await;
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["action"], "delete");
    assert!(logs.iter().all(|l| l["product"]["id"].is_null()));
    assert!(logs.iter().all(|l| l["product"]["sku"] == "WID123"));
}

#[tokio::test]
async fn test_barcode_exact_similar_and_missing() {
    let (app, _db) = setup().await;
    send(&app, "POST", "/api/products/", Some(widget())).await;

    let (status, body) = send(&app, "GET", "/api/products/barcode/5901234123457/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exact"]["sku"], "WID123");

    let (status, body) = send(&app, "GET", "/api/products/barcode/5901239999999/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["exact"].is_null());
    assert_eq!(body["similar"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/products/barcode/000111/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_every_lookup_lands_in_scan_history() {
    let (app, _db) = setup().await;
    send(&app, "POST", "/api/products/", Some(widget())).await;

    send(&app, "GET", "/api/products/barcode/5901234123457/", None).await;
    send(
        &app,
        "GET",
        "/api/products/barcode/000111/?source=scan-from-add",
        None,
    )
    .await;

    let (status, history) = send(&app, "GET", "/api/history/", None).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["barcode"], "000111");
    assert_eq!(history[0]["source"], "scan-from-add");
    assert!(history[0]["product"].is_null());
    assert_eq!(history[1]["source"], "scanner");
    assert_eq!(history[1]["product"]["sku"], "WID123");

    let (status, today) = send(&app, "GET", "/api/history/today/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_long_scanned_code_is_logged_not_rejected() {
    let (app, _db) = setup().await;
    send(&app, "POST", "/api/products/", Some(widget())).await;

    let code = "0".repeat(60);
    let (status, body) = send(&app, "GET", &format!("/api/products/barcode/{code}/"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (_, history) = send(&app, "GET", "/api/history/", None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["barcode"], code.as_str());
    assert!(history[0]["product"].is_null());
}

#[tokio::test]
async fn test_unreachable_store_is_503_not_404() {
    let (app, db) = setup().await;
    db.close().await;

    let (status, body) = send(&app, "GET", "/api/products/barcode/000111/", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORE_UNAVAILABLE");
}

#[tokio::test]
async fn test_invalid_source_rejected() {
    let (app, _db) = setup().await;

    let (status, _) = send(&app, "POST", "/api/products/?source=robot", Some(widget())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long = "x".repeat(51);
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/products/barcode/123/?source={long}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["source"].is_array());
}
