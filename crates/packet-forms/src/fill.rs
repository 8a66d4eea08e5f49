//! The fill pipeline: parse, pick a path, flatten, save.

use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use serde::Serialize;
use tracing::{debug, info};

use crate::acroform::list_fields;
use crate::error::PacketFormError;
use crate::flatten::flatten_form;
use crate::native::fill_native_fields;
use crate::overlay::draw_overlay_targets;
use crate::profile::FormProfile;
use crate::values::FillValues;

/// Which path wrote the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// The document has live fields; empty classified ones were filled.
    Native,
    /// The document has no fields; text was drawn at profile coordinates.
    Overlay,
}

impl FillMode {
    pub fn for_field_count(count: usize) -> Self {
        if count > 0 {
            FillMode::Native
        } else {
            FillMode::Overlay
        }
    }
}

/// A filled and serialized document.
#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub bytes: Vec<u8>,
    pub mode: FillMode,
    /// Fields written or overlay entries drawn.
    pub changes: usize,
    /// False when flattening failed and the document still has its form.
    pub flattened: bool,
}

pub fn load_document(bytes: &[u8]) -> Result<Document, PacketFormError> {
    Document::load_mem(bytes).map_err(|e| PacketFormError::Parse(e.to_string()))
}

/// Fill a PDF with the profile's values.
///
/// Returns `Ok(None)` when nothing in the document could be changed: every
/// classified field already holds text, or no overlay target had a value and
/// a page to land on.
pub fn fill_document(
    bytes: &[u8],
    profile: &FormProfile,
    values: &FillValues,
) -> Result<Option<FilledDocument>, PacketFormError> {
    let mut doc = load_document(bytes)?;
    let fields = list_fields(&doc)?;
    let mode = FillMode::for_field_count(fields.len());

    let changes = match mode {
        FillMode::Native => {
            let report = fill_native_fields(&mut doc, &fields, &profile.fields, values);
            debug!(
                written = ?report.written,
                prefilled = ?report.prefilled,
                failed = ?report.failed,
                "native fill"
            );
            report.written.len()
        }
        FillMode::Overlay => {
            let report = draw_overlay_targets(&mut doc, &profile.overlay, values);
            debug!(drawn = report.drawn.len(), skipped = ?report.skipped, "overlay fill");
            report.drawn.len()
        }
    };

    if changes == 0 {
        debug!(profile = %profile.name, ?mode, "nothing to fill");
        return Ok(None);
    }

    let mut candidate = doc.clone();
    let (mut doc, flattened) = match flatten_form(&mut candidate) {
        Ok(_) => {
            candidate.prune_objects();
            (candidate, true)
        }
        Err(e) => {
            debug!(error = %e, "flattening failed; keeping live form");
            (doc, false)
        }
    };

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PacketFormError::Save(e.to_string()))?;

    info!(profile = %profile.name, ?mode, changes, flattened, "filled document");
    Ok(Some(FilledDocument {
        bytes,
        mode,
        changes,
        flattened,
    }))
}

/// Decode a base64 PDF, optionally prefixed with a `data:` URL header.
pub fn decode_pdf_base64(input: &str) -> Result<Vec<u8>, PacketFormError> {
    let trimmed = input.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => trimmed,
    };
    let compact: String = payload.split_whitespace().collect();
    Ok(STANDARD.decode(compact)?)
}

/// [`fill_document`] over base64 input and output.
pub fn fill_base64(
    pdf_base64: &str,
    profile: &FormProfile,
    values: &FillValues,
) -> Result<Option<String>, PacketFormError> {
    let bytes = decode_pdf_base64(pdf_base64)?;
    Ok(fill_document(&bytes, profile, values)?.map(|filled| STANDARD.encode(filled.bytes)))
}
