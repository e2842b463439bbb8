//! Router tests against a mocked database and in-memory storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use orderdesk_core::currency::{
    ExchangeRateCache, Quotes, RateSource, RateSourceError, RefreshPolicy,
};
use orderdesk_core::invoice::InvoiceWriter;
use orderdesk_core::order::{LineItem, OrderItems};
use orderdesk_core::storage::{StorageConfig, StorageProvider, StorageService};
use orderdesk_db::entities::{customers, orders, products};
use orderdesk_shared::{JwtConfig, JwtService};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, create_router};

/// Rate source that is always down, so the cache serves the defaults.
struct UnreachableRates;

#[async_trait]
impl RateSource for UnreachableRates {
    async fn fetch_quotes(&self) -> Result<Quotes, RateSourceError> {
        Err(RateSourceError::Status(503))
    }
}

fn test_state(db: DatabaseConnection) -> AppState {
    let storage = StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
        .expect("memory storage");

    AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        rates: Arc::new(ExchangeRateCache::new(
            Arc::new(UnreachableRates),
            RefreshPolicy::default(),
        )),
        storage: Arc::new(storage),
        invoice_writer: Arc::new(InvoiceWriter::builtin()),
        invoice_prefix: Arc::from("invoices"),
    }
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn token(state: &AppState, role: &str) -> String {
    state
        .jwt_service
        .generate_access_token("google-oauth2|42", Some("ops@example.com"), role)
        .expect("should generate token")
}

async fn send(state: AppState, request: Request<Body>) -> Response {
    create_router(state).oneshot(request).await.unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn customer(id: Uuid) -> customers::Model {
    let now = chrono::Utc::now().fixed_offset();
    customers::Model {
        id,
        company: "Acme Interiors Pte Ltd".to_string(),
        description: None,
        full_name: Some("Lim Mei Ling".to_string()),
        email: Some("buyer@acme.example".to_string()),
        phone: Some("+65 6555 0100".to_string()),
        gender: None,
        preferred_language: None,
        address: None,
        profile_image_key: None,
        is_valid: true,
        created_at: now,
        updated_at: now,
    }
}

fn product(id: &str, unit_price: Decimal, currency: &str) -> products::Model {
    let now = chrono::Utc::now().fixed_offset();
    products::Model {
        id: id.to_string(),
        brand: "3M".to_string(),
        product_type: "Decorating Film".to_string(),
        unit_price,
        price_currency: currency.to_string(),
        unit_cost: Decimal::ZERO,
        cost_currency: currency.to_string(),
        width: None,
        length: None,
        thickness: None,
        is_valid: true,
        created_at: now,
        updated_at: now,
    }
}

fn order(id: &str, customer_id: Uuid, items: &OrderItems) -> orders::Model {
    let placed = NaiveDate::from_ymd_opt(2025, 1, 13)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    orders::Model {
        id: id.to_string(),
        order_items: items.encode(),
        customer_id,
        order_date: placed,
        order_update_date: placed,
        order_status: "Pending".to_string(),
        payment_status: "Pending".to_string(),
        notes: None,
        total_price: dec!(26.75),
        is_valid: true,
    }
}

fn two_items() -> OrderItems {
    OrderItems::decode(r#"{"P1":2,"P2":1}"#).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let response = send(
        test_state(empty_db()),
        Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["storage"], "memory");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let response = send(
        test_state(empty_db()),
        Request::builder()
            .uri("/api/v1/customers")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let response = send(test_state(empty_db()), get("/api/v1/orders", "not.a.jwt")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_missing_customer_is_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<customers::Model>::new()])
        .into_connection();
    let state = test_state(db);
    let token = token(&state, "user");

    let response = send(
        state,
        get(&format!("/api/v1/customers/{}", Uuid::new_v4()), &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_customer_requires_superuser() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        json_request(
            "PUT",
            &format!("/api/v1/customers/{}", Uuid::new_v4()),
            &token,
            r#"{"company":"Renamed"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_order_rejects_bad_line_items() {
    let state = test_state(empty_db());
    let token = token(&state, "user");
    let body = format!(
        r#"{{"order_items":{{"P1":0}},"customer_id":"{}"}}"#,
        Uuid::new_v4()
    );

    let response = send(state, json_request("POST", "/api/v1/orders", &token, &body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_list_orders_rejects_bad_date() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        get("/api/v1/orders?start_date=13-01-2025", &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_order_decodes_items() {
    let customer_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![order("2025010001", customer_id, &two_items())]])
        .into_connection();
    let state = test_state(db);
    let token = token(&state, "user");

    let response = send(state, get("/api/v1/orders/2025010001", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["order_date"], "2025-01-13 09:30:00");
    assert_eq!(json["order_status"], "Pending");
    assert_eq!(json["order_items"]["items"][0]["product_id"], "P1");
    assert_eq!(json["order_items"]["items"][1]["quantity"], 1);
}

#[tokio::test]
async fn test_list_orders_skips_unreadable_rows() {
    let customer_id = Uuid::new_v4();
    let mut corrupt = order("2025010002", customer_id, &two_items());
    corrupt.order_items = "{not json".to_string();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![BTreeMap::from([(
            "num_items",
            sea_orm::Value::BigInt(Some(2)),
        )])]])
        .append_query_results([vec![
            order("2025010001", customer_id, &two_items()),
            corrupt,
        ]])
        .into_connection();
    let state = test_state(db);
    let token = token(&state, "user");

    let response = send(state, get("/api/v1/orders", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], "2025010001");
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_convert_uses_default_rates() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        get("/api/v1/currencies/convert?amount=10&from=usd&to=SGD", &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let converted: Decimal = json["converted"].as_str().unwrap().parse().unwrap();
    assert_eq!(converted, dec!(13.50));
    assert_eq!(json["from"], "USD");
}

#[tokio::test]
async fn test_convert_overflow_is_bad_request() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        get(
            &format!("/api/v1/currencies/convert?amount={}&from=USD&to=SGD", Decimal::MAX),
            &token,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
    assert!(json["message"].as_str().unwrap().contains("overflows"));
}

#[tokio::test]
async fn test_convert_rejects_malformed_currency() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        get("/api/v1/currencies/convert?amount=10&from=US$&to=SGD", &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rates_snapshot_lists_defaults() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(state, get("/api/v1/currencies/rates", &token)).await;

    let json = body_json(response).await;
    assert_eq!(json["base"], "SGD");
    assert!(json["last_refreshed"].is_null());
    assert_eq!(json["rates"].as_object().unwrap().len(), 11);
}

#[tokio::test]
async fn test_refresh_requires_superuser() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        Request::builder()
            .method("POST")
            .uri("/api/v1/currencies/refresh")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invoice_download() {
    let customer_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![order("2025010001", customer_id, &two_items())]])
        .append_query_results([vec![customer(customer_id)]])
        .append_query_results([vec![product("P1", dec!(10.00), "SGD")]])
        .append_query_results([vec![product("P2", dec!(5.00), "USD")]])
        .into_connection();
    let state = test_state(db);
    let storage = Arc::clone(&state.storage);
    let token = token(&state, "user");

    let response = send(
        state,
        get(
            "/api/v1/orders/get-order-invoice/2025010001?output_currency=SGD",
            &token,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(
        disposition.starts_with("attachment; filename=\"Invoice_2025010001_"),
        "{disposition}"
    );
    assert!(disposition.ends_with(".xlsx\""), "{disposition}");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let mut book =
        umya_spreadsheet::reader::xlsx::read_reader(std::io::Cursor::new(bytes.to_vec()), true)
            .unwrap();
    let sheet = book.get_sheet_by_name_mut("Invoice").unwrap();
    assert_eq!(sheet.get_value("G3"), "2025010001");
    assert_eq!(sheet.get_value("B7"), "Acme Interiors Pte Ltd");
    assert_eq!(sheet.get_value("F14"), "Unit Price (SGD)");
    assert_eq!(sheet.get_value("G15"), "20");
    assert_eq!(sheet.get_value("F17"), "6.75");

    let file_name = disposition
        .trim_start_matches("attachment; filename=\"")
        .trim_end_matches('"');
    assert!(storage.exists(&format!("invoices/{file_name}")).await);
}

#[tokio::test]
async fn test_invoice_unknown_product_is_422() {
    let customer_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![order("2025010001", customer_id, &two_items())]])
        .append_query_results([vec![customer(customer_id)]])
        .append_query_results([Vec::<products::Model>::new()])
        .into_connection();
    let state = test_state(db);
    let token = token(&state, "user");

    let response = send(
        state,
        get("/api/v1/orders/get-order-invoice/2025010001", &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "UNRESOLVABLE_LINE_ITEM");
    assert!(json["message"].as_str().unwrap().contains("P1"));
}

#[tokio::test]
async fn test_invoice_too_many_items_is_422() {
    let customer_id = Uuid::new_v4();
    let items = OrderItems::new(
        (1..=12)
            .map(|n| LineItem {
                product_id: format!("P{n}").into(),
                quantity: 1,
            })
            .collect(),
    )
    .unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![order("2025010002", customer_id, &items)]])
        .append_query_results([vec![customer(customer_id)]])
        .into_connection();
    let state = test_state(db);
    let token = token(&state, "user");

    let response = send(
        state,
        get("/api/v1/orders/get-order-invoice/2025010002", &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"], "INVOICE_TOO_LARGE");
}

#[tokio::test]
async fn test_invoice_rejects_malformed_currency() {
    let state = test_state(empty_db());
    let token = token(&state, "user");

    let response = send(
        state,
        get(
            "/api/v1/orders/get-order-invoice/2025010001?output_currency=DOLLARS",
            &token,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invoice_for_missing_order_is_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<orders::Model>::new()])
        .into_connection();
    let state = test_state(db);
    let token = token(&state, "user");

    let response = send(
        state,
        get("/api/v1/orders/get-order-invoice/2099120001", &token),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
