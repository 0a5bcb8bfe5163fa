//! # MRP Types
//!
//! Shared data model for the Medical Report Portal.
//!
//! Contains:
//! - The analysis document model (`AnalysisResult` and friends), written to
//!   be absent-tolerant: the analysis service may omit any payload field.
//! - The `QueryAnswer` wire type returned by the Q&A endpoint.
//! - Validated text (`NonEmptyText`) used for question/patient-id trimming.
//! - The `Theme` preference value.
//!
//! Used by `mrp-core` and `api-rest`.

mod report;
mod text;
mod theme;

pub use report::{
    AnalysisPayload, AnalysisResult, EncounterInfo, ErrorDetail, Insight, LifestyleEntry,
    PatientInfo, QueryAnswer, Row,
};
pub use text::{NonEmptyText, TextError};
pub use theme::Theme;
