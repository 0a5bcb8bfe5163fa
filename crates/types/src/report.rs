//! Analysis document model.
//!
//! These types mirror the JSON produced by the external analysis service.
//! The portal stores the upload response verbatim and only deserialises it
//! when the results view is rendered, so every payload field here must
//! tolerate absence. The one deliberate exception is
//! [`AnalysisResult::insights`]: it carries no default, so a document
//! without an insights array fails deserialisation instead of rendering a
//! half-empty page.

use serde::{Deserialize, Serialize};

/// A complete analysis document, as returned by `POST /upload` upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Original filename of the uploaded report.
    #[serde(default)]
    pub filename: String,

    /// Patient identifier echoed back by the service, when one was supplied.
    #[serde(default)]
    pub patient_id: Option<String>,

    /// Raw OCR text extracted from the report. May be empty.
    #[serde(default)]
    pub extracted_text: String,

    /// Structured clinical payload. Every field is optional.
    #[serde(default)]
    pub analysis: AnalysisPayload,

    /// Categorised health insights. Always present in well-formed documents;
    /// no serde default on purpose (see module docs).
    pub insights: Vec<Insight>,

    /// Whether prior reports were used as context during analysis.
    #[serde(default)]
    pub context_used: bool,
}

/// Structured clinical findings. All fields are optional or default-empty;
/// the renderer emits one section per non-empty field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub patient: Option<PatientInfo>,
    #[serde(default)]
    pub encounter: Option<EncounterInfo>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,

    #[serde(default)]
    pub diagnoses: Vec<Row>,
    #[serde(default)]
    pub vitals: Vec<Row>,
    #[serde(default)]
    pub labs: Vec<Row>,
    #[serde(default)]
    pub follow_up: Vec<Row>,
    #[serde(default)]
    pub medications: Vec<Row>,

    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(default)]
    pub imaging_findings: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default)]
    pub lifestyle: Vec<LifestyleEntry>,
}

/// Patient demographics block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub uhid: Option<String>,
    #[serde(default)]
    pub mrn: Option<String>,
}

/// Admission/discharge details for the encounter the report covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterInfo {
    #[serde(default)]
    pub admission_date: Option<String>,
    #[serde(default)]
    pub discharge_date: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub discharge_type: Option<String>,
}

/// One entry in a tabular section. The service uses different field names
/// for the same column depending on the section (a lab row carries `value`
/// and `reference`, a medication row carries `dose` and `frequency`), so the
/// display accessors resolve the first present field in a fixed priority
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub dose: Option<String>,

    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    /// Abnormality marker, e.g. "high" or "low". Rendered upper-cased.
    #[serde(default)]
    pub flag: Option<String>,
}

impl Row {
    /// The value column: first present of `value`, `status`, `action`, `dose`.
    pub fn display_value(&self) -> &str {
        self.value
            .as_deref()
            .or(self.status.as_deref())
            .or(self.action.as_deref())
            .or(self.dose.as_deref())
            .unwrap_or("")
    }

    /// The unit column: first present of `unit`, `timeframe`, `frequency`,
    /// `severity`, `reference`.
    pub fn display_unit(&self) -> &str {
        self.unit
            .as_deref()
            .or(self.timeframe.as_deref())
            .or(self.frequency.as_deref())
            .or(self.severity.as_deref())
            .or(self.reference.as_deref())
            .unwrap_or("")
    }
}

/// One lifestyle recommendation card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifestyleEntry {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// A categorised recommendation with a free-form priority label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub priority: String,
}

/// Successful response body of the upstream `POST /query` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    #[serde(default)]
    pub snippets_used: u32,
}

/// Error body the upstream returns with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
