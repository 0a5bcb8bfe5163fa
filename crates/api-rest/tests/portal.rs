//! End-to-end portal tests.
//!
//! Each test serves the portal and a stub analysis service on ephemeral
//! ports and drives the flow with a cookie-keeping HTTP client, covering
//! upload → store → render, the Q&A proxy, and the documented failure
//! paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use api_rest::{AnalysisClient, AppState};

const PDF_BYTES: &[u8] = b"%PDF-1.4\nstub report body";

/// What the stub upstream saw, for assertions.
#[derive(Default)]
struct UpstreamLog {
    upload_hits: AtomicUsize,
    query_hits: AtomicUsize,
    last_patient_id: Mutex<Option<String>>,
    last_query_body: Mutex<Option<Value>>,
}

#[derive(Clone)]
struct StubState {
    log: Arc<UpstreamLog>,
    upload_response: Arc<(StatusCode, Value)>,
    query_response: Arc<(StatusCode, Value)>,
}

async fn stub_upload(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    state.log.upload_hits.fetch_add(1, Ordering::SeqCst);
    *state.log.last_patient_id.lock().unwrap() = params.get("patient_id").cloned();
    while let Ok(Some(field)) = multipart.next_field().await {
        let _ = field.bytes().await;
    }
    let (status, body) = &*state.upload_response;
    (*status, Json(body.clone()))
}

async fn stub_query(State(state): State<StubState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.log.query_hits.fetch_add(1, Ordering::SeqCst);
    *state.log.last_query_body.lock().unwrap() = Some(body);
    let (status, body) = &*state.query_response;
    (*status, Json(body.clone()))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn analysis_document() -> Value {
    json!({
        "filename": "report.pdf",
        "patient_id": "P-7",
        "extracted_text": "HR 72 bpm",
        "analysis": {
            "summary": "Stable",
            "diagnoses": [],
            "vitals": [{"name": "HR", "value": "72", "unit": "bpm"}]
        },
        "insights": [{
            "category": "General Health",
            "recommendation": "Keep hydrated.",
            "priority": "Low"
        }]
    })
}

/// Serves a stub upstream plus the portal; returns the portal base URL, the
/// upstream log, and a cookie-keeping client.
async fn portal_with(
    upload_response: (StatusCode, Value),
    query_response: (StatusCode, Value),
) -> (String, Arc<UpstreamLog>, reqwest::Client) {
    let log = Arc::new(UpstreamLog::default());
    let stub = StubState {
        log: log.clone(),
        upload_response: Arc::new(upload_response),
        query_response: Arc::new(query_response),
    };
    let upstream = Router::new()
        .route("/upload", post(stub_upload))
        .route("/query", post(stub_query))
        .with_state(stub);
    let upstream_url = serve(upstream).await;

    let state = AppState::with_upstream(AnalysisClient::new(upstream_url), 60);
    let portal_url = serve(api_rest::router(state)).await;

    let client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();
    (portal_url, log, client)
}

fn pdf_form() -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(PDF_BYTES.to_vec())
        .file_name("report.pdf")
        .mime_str("application/pdf")
        .unwrap();
    reqwest::multipart::Form::new().part("file", part)
}

#[tokio::test]
async fn upload_stores_result_and_renders_it() {
    let (portal, log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (StatusCode::OK, json!({"answer": "", "snippets_used": 0})),
    )
    .await;

    let form = pdf_form().text("patient_id", " P-7 ");
    let res = client
        .post(format!("{portal}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // The 303 was followed to the rendered results page.
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.url().path().ends_with("/results"));
    let body = res.text().await.unwrap();
    assert!(body.contains("Clinical Summary"));
    assert!(body.contains("Stable"));
    assert!(body.contains("<td>72</td>"));
    assert!(!body.contains("Diagnoses"));

    assert_eq!(log.upload_hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        log.last_patient_id.lock().unwrap().as_deref(),
        Some("P-7"),
        "patient id should be trimmed and forwarded as a query parameter"
    );

    // Reading the slot does not clear it.
    let again = client
        .get(format!("{portal}/results"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(again.contains("Stable"));
}

#[tokio::test]
async fn upload_without_file_is_rejected_before_any_upstream_call() {
    let (portal, log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (StatusCode::OK, json!({"answer": "", "snippets_used": 0})),
    )
    .await;

    let form = reqwest::multipart::Form::new().text("patient_id", "P-7");
    let res = client
        .post(format!("{portal}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("Please select a file"));
    assert_eq!(log.upload_hits.load(Ordering::SeqCst), 0);

    let results = client
        .get(format!("{portal}/results"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(results.contains("No analysis results found."));
}

#[tokio::test]
async fn unsupported_file_type_is_rejected_locally() {
    let (portal, log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (StatusCode::OK, json!({"answer": "", "snippets_used": 0})),
    )
    .await;

    let part = reqwest::multipart::Part::bytes(b"just some text".to_vec())
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);
    let res = client
        .post(format!("{portal}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res
        .text()
        .await
        .unwrap()
        .contains("Only PDF, JPEG, and PNG files are allowed"));
    assert_eq!(log.upload_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_upload_shows_server_detail_and_leaves_store_unchanged() {
    let (portal, _log, client) = portal_with(
        (StatusCode::BAD_REQUEST, json!({"detail": "File too large"})),
        (StatusCode::OK, json!({"answer": "", "snippets_used": 0})),
    )
    .await;

    let res = client
        .post(format!("{portal}/upload"))
        .multipart(pdf_form())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.text().await.unwrap().contains("File too large"));

    let results = client
        .get(format!("{portal}/results"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(results.contains("No analysis results found."));
}

#[tokio::test]
async fn stored_document_without_insights_renders_the_generic_error() {
    // The upload handler stores whatever JSON the service returned; the
    // renderer is where a document missing the insights array fails.
    let (portal, _log, client) = portal_with(
        (StatusCode::OK, json!({"filename": "report.pdf"})),
        (StatusCode::OK, json!({"answer": "", "snippets_used": 0})),
    )
    .await;

    let res = client
        .post(format!("{portal}/upload"))
        .multipart(pdf_form())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res
        .text()
        .await
        .unwrap()
        .contains("The stored analysis could not be read"));
}

#[tokio::test]
async fn blank_question_is_skipped_without_an_upstream_call() {
    let (portal, log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (StatusCode::OK, json!({"answer": "yes", "snippets_used": 1})),
    )
    .await;

    let res = client
        .post(format!("{portal}/query"))
        .json(&json!({"question": "   ", "patient_id": null, "top_k": "5"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(log.query_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn query_renders_an_escaped_answer_fragment() {
    let (portal, log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (
            StatusCode::OK,
            json!({"answer": "Your <b>HbA1c</b> is in range.", "snippets_used": 2}),
        ),
    )
    .await;

    let res = client
        .post(format!("{portal}/query"))
        .json(&json!({"question": "How is my HbA1c?", "patient_id": "P-7", "top_k": "abc"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("&lt;b&gt;HbA1c&lt;/b&gt;"));
    assert!(!body.contains("<b>HbA1c"));
    assert!(body.contains("2 context snippet(s)"));

    // Non-numeric top_k was replaced with the default before forwarding.
    let forwarded = log.last_query_body.lock().unwrap().clone().unwrap();
    assert_eq!(forwarded["top_k"], json!(5));
    assert_eq!(forwarded["question"], json!("How is my HbA1c?"));
}

#[tokio::test]
async fn query_failure_renders_the_server_detail() {
    let (portal, _log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"detail": "Vector service not available"}),
        ),
    )
    .await;

    let res = client
        .post(format!("{portal}/query"))
        .json(&json!({"question": "anything"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res
        .text()
        .await
        .unwrap()
        .contains("Vector service not available"));
}

#[tokio::test]
async fn theme_toggle_sets_the_cookie_and_redirects() {
    let (portal, _log, client) = portal_with(
        (StatusCode::OK, analysis_document()),
        (StatusCode::OK, json!({"answer": "", "snippets_used": 0})),
    )
    .await;

    // First toggle: light -> dark; the client keeps the cookie, so the
    // landing page comes back dark.
    let res = client
        .post(format!("{portal}/theme"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("data-theme=\"dark\""));

    // Second toggle flips back.
    let res = client
        .post(format!("{portal}/theme"))
        .send()
        .await
        .unwrap();
    assert!(res.text().await.unwrap().contains("data-theme=\"light\""));
}
