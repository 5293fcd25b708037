//! HTTP shell driven through the router with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use lucra::api::{build_router, SessionState, PASSWORD_HEADER, USER_HEADER};
use lucra::config::PricingConfig;
use lucra::sheets::export::{template_workbook, XLSX_MIME};

use crate::mock_auth::MockAuth;

fn app_with(auth: MockAuth) -> Router {
    build_router(Arc::new(SessionState::new(Arc::new(auth), PricingConfig::default())))
}

fn request(method: Method, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_HEADER, "demo")
        .header(PASSWORD_HEADER, "demo-pass")
        .body(body)
        .unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    let mut req = request(method, uri, Body::from(body.to_string()));
    req.headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    req
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let auth = MockAuth::new();
    let attempts = auth.attempts();
    let app = app_with(auth);

    let req = Request::builder()
        .uri("/api/products")
        .header(USER_HEADER, "demo")
        .header(PASSWORD_HEADER, "lucra123")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(attempts.lock().unwrap().as_slice(), ["demo".to_string()]);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_whoami_reports_plan() {
    let app = app_with(MockAuth::new());
    let req = Request::builder()
        .uri("/api/whoami")
        .header(USER_HEADER, "daniel")
        .header(PASSWORD_HEADER, "pro-pass")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["user"], "daniel");
    assert_eq!(json["plan"], "pro");
}

#[tokio::test]
async fn test_add_results_summary_flow() {
    let app = app_with(MockAuth::new());

    let resp = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            json!({"name": "Shirt", "cost": 25.0, "price": 50.0, "fee_percent": 2.5}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/results?target_margin=30&fixed_costs=0",
            Body::empty(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let row = &json["rows"][0];
    assert_eq!(row["fee_amount"], 1.25);
    assert_eq!(row["net_profit"], 23.75);
    assert_eq!(row["current_margin_percent"], 47.5);
    assert_eq!(row["ideal_price"], 37.04);
    assert!(row.get("fixed").is_none());

    let resp = app
        .oneshot(request(
            Method::GET,
            "/api/summary?fixed_costs=50&include_fixed_costs=true",
            Body::empty(),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["summary"]["product_count"], 1);
    assert_eq!(json["summary"]["total_net_profit"], 23.75);
    assert_eq!(json["summary"]["total_net_profit_with_fixed"], -26.25);
}

#[tokio::test]
async fn test_add_rejects_blank_name() {
    let app = app_with(MockAuth::new());
    let resp = app
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            json!({"name": "", "cost": 1.0, "price": 2.0}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_missing_column_then_valid_import() {
    let app = app_with(MockAuth::new());

    let resp = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/products/import?format=csv",
            Body::from("Produto,Preco\nBolo,30\n"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("Custo"));

    let resp = app
        .clone()
        .oneshot(request(Method::GET, "/api/products", Body::empty()))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 0);

    let resp = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/products/import?format=xlsx",
            Body::from(template_workbook().unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["count"], 3);
    assert_eq!(json["total"], 3);

    let resp = app
        .oneshot(request(Method::GET, "/api/export?comparison=true", Body::empty()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], XLSX_MIME);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("Lucra_Resultados_"));
}

#[tokio::test]
async fn test_unsupported_import_format() {
    let app = app_with(MockAuth::new());
    let resp = app
        .oneshot(request(
            Method::POST,
            "/api/products/import?format=pdf",
            Body::from("whatever"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_products() {
    let app = app_with(MockAuth::new());
    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/api/products",
            json!({"name": "Caneca", "cost": 18.0, "price": 35.0}),
        ))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(request(Method::DELETE, "/api/products", Body::empty()))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["count"], 1);

    let resp = app
        .oneshot(request(Method::GET, "/api/products", Body::empty()))
        .await
        .unwrap();
    assert!(body_json(resp).await.as_array().unwrap().is_empty());
}
