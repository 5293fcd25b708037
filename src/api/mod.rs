//! HTTP shell: Axum router over the session repository and the engine.
//!
//! Every `/api` route requires credentials (`X-Lucra-User` and
//! `X-Lucra-Password` headers). `/health` is open. CORS is enabled for
//! local front-end development.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

pub use routes::{AppState, SessionState};

pub const USER_HEADER: &str = "x-lucra-user";
pub const PASSWORD_HEADER: &str = "x-lucra-password";

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    state: AppState,
    addr: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr, "API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(USER_HEADER),
            HeaderName::from_static(PASSWORD_HEADER),
        ]);

    let api = Router::new()
        .route("/api/whoami", get(routes::whoami))
        .route(
            "/api/products",
            get(routes::list_products)
                .post(routes::add_product)
                .delete(routes::clear_products),
        )
        .route("/api/products/import", axum::routing::post(routes::import_products))
        .route("/api/results", get(routes::get_results))
        .route("/api/summary", get(routes::get_summary))
        .route("/api/export", get(routes::export_results))
        .route("/api/template", get(routes::download_template))
        .route_layer(middleware::from_fn_with_state(state.clone(), routes::require_auth));

    Router::new()
        .route("/health", get(routes::health))
        .merge(api)
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockAuthenticator, Plan};
    use crate::config::PricingConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(mock: MockAuthenticator) -> AppState {
        Arc::new(SessionState::new(Arc::new(mock), PricingConfig::default()))
    }

    fn accepting() -> MockAuthenticator {
        let mut mock = MockAuthenticator::new();
        mock.expect_authenticate().returning(|_| Ok(Plan::Free));
        mock
    }

    fn authed(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(USER_HEADER, "demo")
            .header(PASSWORD_HEADER, "secret")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let app = build_router(test_state(MockAuthenticator::new()));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_credentials() {
        let app = build_router(test_state(MockAuthenticator::new()));
        let resp = app
            .oneshot(Request::builder().uri("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_products_empty() {
        let app = build_router(test_state(accepting()));
        let resp = app.oneshot(authed("/api/products")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let json: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(json.is_empty());
    }

    #[tokio::test]
    async fn test_template_download() {
        let app = build_router(test_state(accepting()));
        let resp = app.oneshot(authed("/api/template")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            crate::sheets::export::XLSX_MIME
        );
    }

    #[tokio::test]
    async fn test_export_without_products_is_404() {
        let app = build_router(test_state(accepting()));
        let resp = app.oneshot(authed("/api/export")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
