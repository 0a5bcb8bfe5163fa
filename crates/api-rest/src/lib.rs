//! # API REST
//!
//! HTTP layer of the Medical Report Portal.
//!
//! Handles:
//! - Serving the landing and results pages (server-rendered)
//! - The upload flow: multipart in, forwarded to the analysis service,
//!   response stored verbatim in the session's result slot, redirect to
//!   `/results`
//! - The Q&A endpoint, proxied to the analysis service
//! - Theme toggling via cookie
//! - OpenAPI/Swagger documentation for the JSON endpoints
//!
//! Uses `mrp-core` for the store, rendering and error taxonomy.

#![warn(rust_2018_idioms)]

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use mrp_core::{render, PortalError, ResultStore};
use mrp_types::AnalysisResult;

mod config;
mod session;
mod upstream;

pub use config::{AppConfig, ConfigError};
pub use upstream::AnalysisClient;

/// Uploads larger than this are rejected before any forwarding.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Context snippet count used when the request leaves `top_k` blank or
/// unparseable.
const DEFAULT_TOP_K: u32 = 5;

const ALLOWED_UPLOAD_TYPES: [&str; 4] = [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/jpg",
];

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<ResultStore>,
    upstream: Arc<AnalysisClient>,
}

impl AppState {
    /// Builds the state from configuration.
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            store: Arc::new(ResultStore::new(chrono::Duration::minutes(
                cfg.session_ttl_mins,
            ))),
            upstream: Arc::new(AnalysisClient::new(cfg.upstream_url.clone())),
        }
    }

    /// State with an explicit upstream client; used by tests to point the
    /// portal at a stub service.
    pub fn with_upstream(upstream: AnalysisClient, session_ttl_mins: i64) -> Self {
        Self {
            store: Arc::new(ResultStore::new(chrono::Duration::minutes(
                session_ttl_mins,
            ))),
            upstream: Arc::new(upstream),
        }
    }
}

/// Health check response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Request body of the portal's `POST /query` endpoint.
///
/// `top_k` is accepted as a JSON number or string; anything blank or
/// non-numeric falls back to [`DEFAULT_TOP_K`]. The landing page submits
/// the raw text-field value, so this leniency is part of the contract, not
/// an accident.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryReq {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub top_k: Option<Value>,
}

impl QueryReq {
    fn top_k_or_default(&self) -> u32 {
        match &self.top_k {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_TOP_K),
            Some(Value::String(s)) => s.trim().parse::<u32>().unwrap_or(DEFAULT_TOP_K),
            _ => DEFAULT_TOP_K,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, query, upload),
    components(schemas(HealthRes, QueryReq))
)]
struct ApiDoc;

/// Builds the portal router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/results", get(results))
        .route("/upload", post(upload))
        .route("/query", post(query))
        .route("/theme", post(toggle_theme))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the landing page.
async fn landing(headers: HeaderMap) -> Html<String> {
    let theme = session::theme(&headers);
    Html(render::render_landing(theme, None))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitors and load balancers.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Medical Report Portal is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = Vec<u8>, content_type = "multipart/form-data",
        description = "Report file (field `file`) plus optional `patient_id` text field"),
    responses(
        (status = 303, description = "Analysis stored; redirect to /results"),
        (status = 400, description = "No file selected or unsupported file type"),
        (status = 502, description = "Analysis service failure")
    )
)]
/// Upload controller.
///
/// Validates that a file was selected and is a PDF/JPEG/PNG, forwards it to
/// the analysis service (with the trimmed patient id as a query parameter),
/// stores the JSON response verbatim in the caller's result slot and
/// redirects to the results view. Failures re-render the landing page with
/// an inline message and leave the result slot untouched.
async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let theme = session::theme(&headers);

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut patient_id: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Unreadable multipart body: {e}");
                return upload_error(
                    theme,
                    &PortalError::Validation("The upload could not be read".into()),
                );
            }
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let declared = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => {
                        tracing::warn!("Failed to read upload body: {e}");
                        return upload_error(
                            theme,
                            &PortalError::Validation("The upload could not be read".into()),
                        );
                    }
                };
                file = Some((filename, declared, bytes));
            }
            Some("patient_id") => {
                patient_id = field.text().await.ok();
            }
            _ => {}
        }
    }

    let Some((filename, declared, bytes)) = file else {
        return upload_error(theme, &PortalError::Validation("Please select a file".into()));
    };
    if filename.is_empty() || bytes.is_empty() {
        return upload_error(theme, &PortalError::Validation("Please select a file".into()));
    }

    // Sniff the real type; fall back to what the browser declared.
    let media_type = infer::get(&bytes)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or(declared);
    if !ALLOWED_UPLOAD_TYPES.contains(&media_type.as_str()) {
        return upload_error(
            theme,
            &PortalError::Validation("Only PDF, JPEG, and PNG files are allowed".into()),
        );
    }

    let result = state
        .upstream
        .analyze(&filename, &media_type, bytes, patient_id.as_deref())
        .await;

    match result {
        Ok(document) => {
            let session = session::session_id(&headers).unwrap_or_else(Uuid::new_v4);
            state.store.put(session, document);
            tracing::info!(%session, filename, "analysis stored");
            (
                AppendHeaders([(header::SET_COOKIE, session::session_cookie(session))]),
                Redirect::to("/results"),
            )
                .into_response()
        }
        Err(error) => upload_error(theme, &error),
    }
}

fn upload_error(theme: mrp_types::Theme, error: &PortalError) -> Response {
    let status = match error {
        PortalError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Html(render::render_landing(theme, Some(&error.to_string()))),
    )
        .into_response()
}

/// Results renderer.
///
/// Reads the caller's result slot; renders the no-results notice when it is
/// empty, a generic error page when the stored JSON no longer matches the
/// document model, and the full section list otherwise.
async fn results(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let theme = session::theme(&headers);

    let stored = session::session_id(&headers).and_then(|session| state.store.get(&session));
    let Some(raw) = stored else {
        return Html(render::render_no_results(theme)).into_response();
    };

    match serde_json::from_value::<AnalysisResult>(raw.clone()) {
        Ok(document) => {
            let pretty = serde_json::to_string_pretty(&raw).unwrap_or_default();
            Html(render::render_results(theme, &document, &pretty)).into_response()
        }
        Err(e) => {
            let error = PortalError::Deserialization(e);
            tracing::error!("Stored analysis failed to deserialise: {error:?}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::render_error_page(theme, &error.to_string())),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryReq,
    responses(
        (status = 200, description = "Rendered answer fragment (HTML)"),
        (status = 204, description = "Blank question; skipped"),
        (status = 502, description = "Rendered error fragment (HTML)")
    )
)]
/// Q&A endpoint backing the ask panels on both pages.
///
/// A blank question is silently skipped (204, no upstream call). Successful
/// answers and failures both come back as HTML fragments so the page script
/// can inject them without doing its own escaping.
async fn query(State(state): State<AppState>, Json(req): Json<QueryReq>) -> Response {
    let answer = state
        .upstream
        .ask(
            &req.question,
            req.patient_id.as_deref(),
            req.top_k_or_default(),
        )
        .await;

    match answer {
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Ok(Some(answer)) => {
            Html(render::render_answer_panel(&answer.answer, answer.snippets_used)).into_response()
        }
        Err(error) => (
            StatusCode::BAD_GATEWAY,
            Html(render::render_query_error(&error.to_string())),
        )
            .into_response(),
    }
}

/// Flips the theme cookie and sends the caller back where they came from.
async fn toggle_theme(headers: HeaderMap) -> Response {
    let next = session::theme(&headers).toggled();
    let back = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("/")
        .to_string();
    (
        AppendHeaders([(header::SET_COOKIE, session::theme_cookie(next))]),
        Redirect::to(&back),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn req(top_k: Value) -> QueryReq {
        QueryReq {
            patient_id: None,
            question: "q".into(),
            top_k: Some(top_k),
        }
    }

    #[test]
    fn top_k_accepts_a_number() {
        assert_eq!(req(json!(3)).top_k_or_default(), 3);
    }

    #[test]
    fn top_k_accepts_a_numeric_string() {
        assert_eq!(req(json!("7")).top_k_or_default(), 7);
        assert_eq!(req(json!(" 7 ")).top_k_or_default(), 7);
    }

    #[test]
    fn blank_or_garbage_top_k_defaults_to_five() {
        assert_eq!(req(json!("")).top_k_or_default(), 5);
        assert_eq!(req(json!("lots")).top_k_or_default(), 5);
        assert_eq!(req(json!(-2)).top_k_or_default(), 5);
        assert_eq!(req(json!(4.5)).top_k_or_default(), 5);
        assert_eq!(req(Value::Null).top_k_or_default(), 5);
    }

    #[test]
    fn missing_top_k_defaults_to_five() {
        let req = QueryReq {
            patient_id: None,
            question: "q".into(),
            top_k: None,
        };
        assert_eq!(req.top_k_or_default(), 5);
    }
}
