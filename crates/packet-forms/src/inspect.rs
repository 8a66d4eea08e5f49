//! Field reports for checking a template revision against its profile.

use serde::Serialize;

use crate::acroform::{list_fields, FieldKind};
use crate::classify::FieldRole;
use crate::error::PacketFormError;
use crate::fill::{load_document, FillMode};
use crate::profile::FormProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub name: String,
    pub kind: FieldKind,
    pub value: Option<String>,
    /// `None` when the profile does not classify this field.
    pub role: Option<FieldRole>,
    pub widgets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReport {
    pub page_count: usize,
    /// The path a fill of this document would take.
    pub mode: FillMode,
    pub fields: Vec<FieldReport>,
    /// Role-table entries that match no field in the document.
    pub unmatched_profile_fields: Vec<String>,
}

pub fn inspect_document(bytes: &[u8], profile: &FormProfile) -> Result<FormReport, PacketFormError> {
    let doc = load_document(bytes)?;
    let fields = list_fields(&doc)?;

    let reports: Vec<FieldReport> = fields
        .into_iter()
        .map(|field| FieldReport {
            role: profile.fields.classify(&field.name),
            widgets: field.widgets.len(),
            name: field.name,
            kind: field.kind,
            value: field.value,
        })
        .collect();

    let unmatched_profile_fields = profile
        .fields
        .names()
        .filter(|name| !reports.iter().any(|f| f.name == *name))
        .map(str::to_string)
        .collect();

    Ok(FormReport {
        page_count: doc.get_pages().len(),
        mode: FillMode::for_field_count(reports.len()),
        fields: reports,
        unmatched_profile_fields,
    })
}
