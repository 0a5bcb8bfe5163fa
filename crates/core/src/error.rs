//! Portal error taxonomy.
//!
//! Every failure is caught at a handler boundary and turned into an inline
//! user-visible message; nothing here propagates to a crash and there is no
//! retry policy anywhere in the portal.

/// Errors surfaced to the user by the portal.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// A request precondition failed before any upstream call was made,
    /// e.g. no file was selected or the file type is not accepted.
    #[error("{0}")]
    Validation(String),

    /// The upstream analysis service rejected the upload or could not be
    /// reached. Carries the server-supplied `detail` when one was returned.
    #[error("{0}")]
    Upload(String),

    /// The upstream Q&A endpoint failed or could not be reached.
    #[error("{0}")]
    Query(String),

    /// The stored analysis document could not be deserialised.
    #[error("The stored analysis could not be read")]
    Deserialization(#[source] serde_json::Error),
}

impl PortalError {
    /// Builds an upload error from an optional upstream `detail` message.
    pub fn upload_failure(detail: Option<String>) -> Self {
        PortalError::Upload(
            detail.unwrap_or_else(|| "Analysis failed. Please try again.".to_string()),
        )
    }

    /// Builds a query error from an optional upstream `detail` message.
    pub fn query_failure(detail: Option<String>) -> Self {
        PortalError::Query(
            detail.unwrap_or_else(|| "The question could not be answered. Please try again.".to_string()),
        )
    }
}
