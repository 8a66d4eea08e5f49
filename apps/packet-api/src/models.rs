//! Request and response bodies for packet-api

use chrono::{DateTime, Utc};
use packet_forms::{FillMode, FormProfile, FormReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub name: String,
    pub description: Option<String>,
    pub template_available: bool,
    pub profile: FormProfile,
}

#[derive(Debug, Serialize)]
pub struct FormListResponse {
    pub success: bool,
    pub forms: Vec<FormSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub success: bool,
    pub form: String,
    pub pdf_base64: String,
}

/// Fill request. Without `pdfBase64` the caller's saved progress is filled,
/// or the form's template when there is none.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub full_name: String,
    /// ISO 8601 date or timestamp, e.g. the acknowledgment time.
    #[serde(default)]
    pub date: Option<String>,
    /// Used when `date` is blank, e.g. the account creation time.
    #[serde(default)]
    pub fallback_date: Option<String>,
    #[serde(default)]
    pub pdf_base64: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub success: bool,
    pub form: String,
    pub mode: FillMode,
    pub changes: usize,
    pub flattened: bool,
    /// True when the result was written to the user's progress.
    pub saved: bool,
    pub pdf_base64: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectRequest {
    #[serde(default)]
    pub pdf_base64: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResponse {
    pub success: bool,
    pub form: String,
    pub report: FormReport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProgressRequest {
    pub pdf_base64: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub success: bool,
    pub user_id: String,
    pub form: String,
    pub pdf_base64: String,
    pub filled: bool,
    pub updated_at: DateTime<Utc>,
}
