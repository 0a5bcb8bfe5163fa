//! Client for the external analysis service.
//!
//! The service is opaque: the portal forwards uploads and questions and
//! passes its JSON back without interpreting it, beyond surfacing the
//! `detail` field of error bodies.

use mrp_core::PortalError;
use mrp_types::{ErrorDetail, NonEmptyText, QueryAnswer};
use serde_json::Value;

/// Reqwest-backed client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    base_url: String,
    http: reqwest::Client,
}

impl AnalysisClient {
    /// Creates a client for the service at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Submits a report for analysis and returns the response body
    /// verbatim.
    ///
    /// A trimmed non-empty `patient_id` is appended to the upload URL as a
    /// query parameter; the file travels as the multipart field `file`.
    ///
    /// # Errors
    /// `PortalError::Upload` on network failure, a non-2xx response
    /// (carrying the server `detail` when present) or an unparseable body.
    pub async fn analyze(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
        patient_id: Option<&str>,
    ) -> Result<Value, PortalError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| {
                tracing::error!("Invalid upload content type {content_type}: {e}");
                PortalError::Upload("Analysis failed. Please try again.".to_string())
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form);
        if let Some(patient_id) = patient_id.and_then(NonEmptyText::opt) {
            request = request.query(&[("patient_id", patient_id.as_str())]);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Upload to analysis service failed: {e}");
            PortalError::Upload("Could not reach the analysis service".to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ErrorDetail>()
                .await
                .ok()
                .map(|body| body.detail);
            tracing::warn!("Analysis service rejected upload with {status}");
            return Err(PortalError::upload_failure(detail));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::error!("Analysis service returned a non-JSON body: {e}");
            PortalError::Upload("The analysis service returned an unreadable response".to_string())
        })
    }

    /// Asks a question about a patient's reports.
    ///
    /// A blank question is the documented skip case: no request is sent and
    /// `Ok(None)` is returned.
    ///
    /// # Errors
    /// `PortalError::Query` on network failure or a non-2xx response.
    pub async fn ask(
        &self,
        question: &str,
        patient_id: Option<&str>,
        top_k: u32,
    ) -> Result<Option<QueryAnswer>, PortalError> {
        let Some(question) = NonEmptyText::opt(question) else {
            return Ok(None);
        };
        let patient_id = patient_id.and_then(NonEmptyText::opt);

        let body = serde_json::json!({
            "patient_id": patient_id.as_ref().map(NonEmptyText::as_str),
            "question": question.as_str(),
            "top_k": top_k,
        });

        let response = self
            .http
            .post(format!("{}/query", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Query to analysis service failed: {e}");
                PortalError::Query("Could not reach the analysis service".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response
                .json::<ErrorDetail>()
                .await
                .ok()
                .map(|body| body.detail);
            tracing::warn!("Analysis service rejected query with {status}");
            return Err(PortalError::query_failure(detail));
        }

        response.json::<QueryAnswer>().await.map(Some).map_err(|e| {
            tracing::error!("Analysis service returned a non-JSON answer: {e}");
            PortalError::Query("The analysis service returned an unreadable response".to_string())
        })
    }
}
