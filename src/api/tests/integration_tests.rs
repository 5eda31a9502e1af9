//! Integration tests for the subscription API
//!
//! Requests go through the full router (middleware included) with the
//! in-memory store, or a mock store for backend failure paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use sub_service_api::{build_router, AppState, Config};
use sub_service_database::{
    AggregateFilter, DatabaseError, InMemorySubscriptionStore, MockSubscriptionStore,
    SubscriptionStore,
};
use sub_service_shared::{NewSubscription, Subscription, UpdateDescriptor};

fn test_config() -> Config {
    let mut config = Config::default();
    config.environment = "test".to_string();
    config.server.timeout_seconds = 1;
    config
}

fn app_with_store(store: Arc<dyn SubscriptionStore>) -> Router {
    build_router(AppState::new(test_config(), store))
}

fn memory_app() -> Router {
    app_with_store(Arc::new(InMemorySubscriptionStore::new()))
}

/// Test helper to make HTTP requests to the API
async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(body) = body {
        request_builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, body)
}

async fn make_raw_request(app: &Router, method: Method, uri: &str, body: &str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    app.clone().oneshot(request).await.unwrap().status()
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, created) = make_request(app, Method::POST, "/api/v1/subs", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
    created
}

fn netflix(price: i32, user: &str, start: &str) -> Value {
    json!({
        "service_name": "Netflix",
        "price": price,
        "user_id": user,
        "start_date": start
    })
}

#[tokio::test]
async fn test_create_then_get() {
    let app = memory_app();

    let created = create(
        &app,
        json!({
            "service_name": "Yandex Plus",
            "price": 400,
            "user_id": "60601fee-2bf1-4721-ae6f-7636e79a0cba",
            "start_date": "07-2025",
            "end_date": "12-2025"
        }),
    )
    .await;

    let id = created["id"].as_str().unwrap();
    assert!(!id.is_empty());

    let (status, fetched) =
        make_request(&app, Method::GET, &format!("/api/v1/subs/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
    assert_eq!(fetched["service_name"], "Yandex Plus");
    assert_eq!(fetched["price"], 400);
    assert_eq!(fetched["user_id"], "60601fee-2bf1-4721-ae6f-7636e79a0cba");
    assert_eq!(fetched["start_date"], "07-2025");
    assert_eq!(fetched["end_date"], "12-2025");
}

#[tokio::test]
async fn test_create_without_end_date_omits_it() {
    let app = memory_app();
    let created = create(&app, netflix(100, "user-5", "01-2025")).await;

    assert!(created.get("end_date").is_none());
}

#[tokio::test]
async fn test_create_rejects_malformed_input() {
    let app = memory_app();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/v1/subs",
        Some(netflix(100, "user-5", "2025-07")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/v1/subs",
        Some(netflix(-5, "user-5", "07-2025")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/v1/subs",
        Some(json!({"service_name": "Netflix", "price": 100, "user_id": "user-5"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "start_date");

    let status = make_raw_request(&app, Method::POST, "/api/v1/subs", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = make_request(&app, Method::GET, "/api/v1/subs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let app = memory_app();

    let (status, body) = make_request(&app, Method::GET, "/api/v1/subs/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found_error");
}

#[tokio::test]
async fn test_update_price_only_leaves_other_fields() {
    let app = memory_app();
    let mut created = netflix(100, "user-5", "01-2025");
    created["end_date"] = json!("06-2025");
    let created = create(&app, created).await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = make_request(
        &app,
        Method::PUT,
        &format!("/api/v1/subs/{id}"),
        Some(json!({"price": 450})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = created.clone();
    expected["price"] = json!(450);
    assert_eq!(updated, expected);

    let (_, fetched) = make_request(&app, Method::GET, &format!("/api/v1/subs/{id}"), None).await;
    assert_eq!(fetched, expected);
}

#[tokio::test]
async fn test_update_null_end_date_clears_it() {
    let app = memory_app();
    let mut body = netflix(100, "user-5", "01-2025");
    body["end_date"] = json!("06-2025");
    let created = create(&app, body).await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = make_request(
        &app,
        Method::PUT,
        &format!("/api/v1/subs/{id}"),
        Some(json!({"end_date": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated.get("end_date").is_none());
    assert_eq!(updated["start_date"], "01-2025");
}

#[tokio::test]
async fn test_update_errors() {
    let app = memory_app();

    let (status, _) = make_request(
        &app,
        Method::PUT,
        "/api/v1/subs/missing",
        Some(json!({"price": 450})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let created = create(&app, netflix(100, "user-5", "01-2025")).await;
    let uri = format!("/api/v1/subs/{}", created["id"].as_str().unwrap());

    let (status, _) = make_request(&app, Method::PUT, &uri, Some(json!({"start_date": "2025-01"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(&app, Method::PUT, &uri, Some(json!({"price": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = make_request(&app, Method::PUT, &uri, Some(json!({"price": "cheap"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_update_skips_the_store_write() {
    let existing = Subscription {
        id: "sub-1".to_string(),
        service_name: "Netflix".to_string(),
        price: 100,
        user_id: "user-5".to_string(),
        start_date: "01-2025".parse().unwrap(),
        end_date: None,
    };

    let mut store = MockSubscriptionStore::new();
    store.expect_update().times(0);
    let returned = existing.clone();
    store
        .expect_get()
        .withf(|id| id == "sub-1")
        .times(1)
        .returning(move |_| Ok(returned.clone()));

    let app = app_with_store(Arc::new(store));
    let (status, body) = make_request(&app, Method::PUT, "/api/v1/subs/sub-1", Some(json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::to_value(&existing).unwrap());
}

#[tokio::test]
async fn test_empty_update_of_missing_id_is_not_found() {
    let app = memory_app();

    let (status, _) = make_request(&app, Method::PUT, "/api/v1/subs/missing", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let app = memory_app();
    let created = create(&app, netflix(100, "user-5", "01-2025")).await;
    let uri = format!("/api/v1/subs/{}", created["id"].as_str().unwrap());

    let (status, body) = make_request(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = make_request(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = make_request(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_ordering_and_filter() {
    let app = memory_app();
    create(&app, netflix(100, "user-5", "01-2025")).await;
    create(&app, netflix(200, "user-5", "03-2025")).await;
    create(&app, netflix(300, "user-7", "02-2025")).await;

    let (status, all) = make_request(&app, Method::GET, "/api/v1/subs", None).await;
    assert_eq!(status, StatusCode::OK);
    let starts: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["start_date"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["03-2025", "02-2025", "01-2025"]);

    let (_, mine) = make_request(&app, Method::GET, "/api/v1/subs?user_id=user-5", None).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, nobody) =
        make_request(&app, Method::GET, "/api/v1/subs?user_id=nobody", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nobody, json!([]));

    let (_, unfiltered) = make_request(&app, Method::GET, "/api/v1/subs?user_id=", None).await;
    assert_eq!(unfiltered.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_aggregate_example() {
    let app = memory_app();
    create(&app, netflix(100, "user-5", "01-2025")).await;
    create(&app, netflix(200, "user-5", "02-2025")).await;

    let (status, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs/aggregate?from=2025-01&to=2025-02&user_id=user-5&service_name=Netflix",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"total": 300}));

    let (status, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs/aggregate?from=2025-01&to=2025-02&user_id=user-5&service_name=Spotify",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"total": 0}));

    let (_, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs/aggregate?from=2025-02&to=2025-02",
        None,
    )
    .await;
    assert_eq!(body, json!({"total": 200}));
}

#[tokio::test]
async fn test_aggregate_rejects_bad_months() {
    let app = memory_app();

    let (status, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs/aggregate?from=01-2025&to=2025-02",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["error"], "invalid from");

    let (status, body) =
        make_request(&app, Method::GET, "/api/v1/subs/aggregate?from=2025-01", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["error"], "invalid to");
}

#[tokio::test]
async fn test_malformed_query_string_uses_error_body() {
    let app = memory_app();

    let (status, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs/aggregate?from=2025-01&to=2025-02&from=2025-03",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("duplicate field"));
    assert!(body["timestamp"].is_string());

    let (status, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs?user_id=user-5&user_id=user-7",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "request");
}

#[tokio::test]
async fn test_aggregate_passes_end_of_month_to_store() {
    let mut store = MockSubscriptionStore::new();
    store
        .expect_aggregate()
        .withf(|filter: &AggregateFilter| {
            filter.from.to_rfc3339() == "2025-01-01T00:00:00+00:00"
                && filter.to.to_rfc3339() == "2025-02-28T23:59:59.999999+00:00"
                && filter.user_id.is_none()
                && filter.service_name.as_deref() == Some("Netflix")
        })
        .times(1)
        .returning(|_| Ok(42));

    let app = app_with_store(Arc::new(store));
    let (status, body) = make_request(
        &app,
        Method::GET,
        "/api/v1/subs/aggregate?from=2025-01&to=2025-02&user_id=&service_name=Netflix",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"total": 42}));
}

#[tokio::test]
async fn test_backend_failure_returns_generic_500() {
    let mut store = MockSubscriptionStore::new();
    store.expect_create().returning(|_: NewSubscription| {
        Err(DatabaseError::Connection(
            "connection refused (password=hunter2)".to_string(),
        ))
    });
    store
        .expect_list()
        .returning(|_| Err(DatabaseError::Connection("pool timed out".to_string())));

    let app = app_with_store(Arc::new(store));

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/v1/subs",
        Some(netflix(100, "user-5", "01-2025")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("hunter2"));

    let (status, _) = make_request(&app, Method::GET, "/api/v1/subs", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_update_maps_store_not_found() {
    let mut store = MockSubscriptionStore::new();
    store
        .expect_update()
        .withf(|update: &UpdateDescriptor| update.id == "gone" && update.changes.len() == 1)
        .returning(|update| Err(DatabaseError::NotFound(update.id)));

    let app = app_with_store(Arc::new(store));
    let (status, _) =
        make_request(&app, Method::PUT, "/api/v1/subs/gone", Some(json!({"price": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Store whose calls never finish in time, or panic
struct MisbehavingStore {
    panic: bool,
}

#[async_trait]
impl SubscriptionStore for MisbehavingStore {
    async fn create(&self, _input: NewSubscription) -> Result<Subscription, DatabaseError> {
        unimplemented!()
    }

    async fn get(&self, _id: &str) -> Result<Subscription, DatabaseError> {
        if self.panic {
            panic!("store exploded");
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        Err(DatabaseError::NotFound("slow".to_string()))
    }

    async fn list(&self, _user_id: Option<String>) -> Result<Vec<Subscription>, DatabaseError> {
        unimplemented!()
    }

    async fn update(&self, _update: UpdateDescriptor) -> Result<Subscription, DatabaseError> {
        unimplemented!()
    }

    async fn delete(&self, _id: &str) -> Result<(), DatabaseError> {
        unimplemented!()
    }

    async fn aggregate(&self, _filter: AggregateFilter) -> Result<i64, DatabaseError> {
        unimplemented!()
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let app = app_with_store(Arc::new(MisbehavingStore { panic: false }));

    let (status, body) = make_request(&app, Method::GET, "/api/v1/subs/any", None).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"], "timeout_error");
}

#[tokio::test]
async fn test_panicking_handler_returns_500() {
    let app = app_with_store(Arc::new(MisbehavingStore { panic: true }));

    let (status, body) = make_request(&app, Method::GET, "/api/v1/subs/any", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_health_reflects_database() {
    let (status, body) = make_request(&memory_app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "up");

    let mut store = MockSubscriptionStore::new();
    store
        .expect_ping()
        .returning(|| Err(DatabaseError::Connection("down".to_string())));
    let app = app_with_store(Arc::new(store));

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "down");

    let (status, body) = make_request(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = memory_app();
    let request = Request::builder()
        .uri("/ready")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(!request_id.is_empty());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, body) =
        make_request(&memory_app(), Method::GET, "/api-docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/subs/aggregate"]["get"].is_object());
    assert!(body["paths"]["/api/v1/subs/{id}"]["put"].is_object());
}
