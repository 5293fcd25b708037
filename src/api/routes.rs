//! API route handlers.
//!
//! All endpoints return JSON except the two workbook downloads. State is
//! shared via `Arc<SessionState>`.

use axum::{
    body::Bytes,
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::{PASSWORD_HEADER, USER_HEADER};
use crate::auth::{AuthError, Authenticator, Credentials, Plan};
use crate::config::PricingConfig;
use crate::engine;
use crate::session::ProductRepository;
use crate::sheets::export::{self, TEMPLATE_FILE_NAME, XLSX_MIME};
use crate::sheets::{import, SheetFormat};
use crate::types::{ExportError, ImportError, PortfolioSummary, PricingParams, Product, ProductError, ProductMetrics};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything the handlers share: the session's products, the injected
/// authenticator and the pricing bounds.
pub struct SessionState {
    pub products: RwLock<ProductRepository>,
    pub authenticator: Arc<dyn Authenticator>,
    pub pricing: PricingConfig,
}

impl SessionState {
    pub fn new(authenticator: Arc<dyn Authenticator>, pricing: PricingConfig) -> Self {
        Self {
            products: RwLock::new(ProductRepository::new()),
            authenticator,
            pricing,
        }
    }
}

pub type AppState = Arc<SessionState>;

/// Who made the request, attached by `require_auth`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub user: String,
    pub plan: Plan,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(AuthError),
    InvalidProduct(ProductError),
    Import(ImportError),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::InvalidProduct(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Import(e @ ImportError::MissingColumns(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
            }
            ApiError::Import(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        ApiError::InvalidProduct(err)
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::Import(err)
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoProducts => ApiError::NotFound(err.to_string()),
            other => {
                error!(error = %other, "Workbook generation failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auth middleware
// ---------------------------------------------------------------------------

/// Reject requests without valid credentials; attach `AuthContext` otherwise.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = credentials_from(req.headers()).ok_or(AuthError::MissingCredentials)?;
    let plan = state.authenticator.authenticate(&credentials).await?;

    req.extensions_mut().insert(AuthContext {
        user: credentials.user,
        plan,
    });
    Ok(next.run(req).await)
}

fn credentials_from(headers: &HeaderMap) -> Option<Credentials> {
    let password = headers.get(PASSWORD_HEADER)?.to_str().ok()?;
    let user = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Some(Credentials::new(user, password))
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Pricing parameters as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
pub struct PricingQuery {
    pub target_margin: Option<f64>,
    pub fixed_costs: Option<f64>,
    pub include_fixed_costs: Option<bool>,
    /// Export only: add the "with fixed costs" sheet.
    pub comparison: Option<bool>,
}

impl PricingQuery {
    fn params(&self, pricing: &PricingConfig) -> PricingParams {
        pricing.params(self.target_margin, self.fixed_costs, self.include_fixed_costs)
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub params: PricingParams,
    pub rows: Vec<ProductMetrics>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub params: PricingParams,
    pub summary: PortfolioSummary,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/whoami
pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> Json<AuthContext> {
    Json(ctx)
}

/// GET /api/products
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.products.read().await.snapshot())
}

/// POST /api/products
pub async fn add_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(product): Json<Product>,
) -> Result<(StatusCode, Json<CountResponse>), ApiError> {
    let mut products = state.products.write().await;
    let name = product.name.clone();
    products.add(product)?;
    info!(user = %ctx.user, product = %name, "Product added manually");

    Ok((
        StatusCode::CREATED,
        Json(CountResponse {
            count: 1,
            total: products.len(),
        }),
    ))
}

/// DELETE /api/products
pub async fn clear_products(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<CountResponse> {
    let removed = state.products.write().await.clear();
    warn!(user = %ctx.user, removed, "Session products cleared");
    Json(CountResponse {
        count: removed,
        total: 0,
    })
}

/// POST /api/products/import?format=xlsx|xls|ods|csv
///
/// The body is the raw file. Parsing happens before the lock is taken, so
/// a rejected file never touches the session.
pub async fn import_products(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> Result<Json<CountResponse>, ApiError> {
    let format: SheetFormat = query.format.as_deref().unwrap_or("xlsx").parse()?;

    let parsed = import::read_table(&body, format).map_err(|e| {
        warn!(user = %ctx.user, error = %e, "Import rejected");
        e
    })?;

    let mut products = state.products.write().await;
    let count = products.append(parsed);
    Ok(Json(CountResponse {
        count,
        total: products.len(),
    }))
}

/// GET /api/results
pub async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
) -> Json<ResultsResponse> {
    let params = query.params(&state.pricing);
    let snapshot = state.products.read().await.snapshot();
    Json(ResultsResponse {
        params,
        rows: engine::compute(&snapshot, &params),
    })
}

/// GET /api/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
) -> Json<SummaryResponse> {
    let params = query.params(&state.pricing);
    let snapshot = state.products.read().await.snapshot();
    let rows = engine::compute(&snapshot, &params);
    Json(SummaryResponse {
        params,
        summary: engine::summarize(&rows),
    })
}

/// GET /api/export
pub async fn export_results(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
) -> Result<Response, ApiError> {
    let params = query.params(&state.pricing);
    let snapshot = state.products.read().await.snapshot();
    let bytes = export::export_results(&snapshot, &params, query.comparison.unwrap_or(false))?;
    let file_name = export::export_file_name(&chrono::Local::now());
    Ok(xlsx_attachment(bytes, &file_name))
}

/// GET /api/template
pub async fn download_template() -> Result<Response, ApiError> {
    let bytes = export::template_workbook()?;
    Ok(xlsx_attachment(bytes, TEMPLATE_FILE_NAME))
}

fn xlsx_attachment(bytes: Vec<u8>, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
