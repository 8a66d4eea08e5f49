//! Positional text overlay for templates that carry no live fields.

use std::collections::BTreeMap;

use lopdf::content::Operation;
use lopdf::{Document, Object, ObjectId, StringFormat};
use serde::Serialize;
use tracing::{debug, warn};

use crate::canvas::{add_standard_font, append_page_content, page_ids, register_resource};
use crate::classify::FieldRole;
use crate::error::PacketFormError;
use crate::profile::OverlayTarget;
use crate::text::encode_win_ansi;
use crate::values::FillValues;

pub const OVERLAY_FONT: &str = "Helvetica";
pub const OVERLAY_FONT_SIZE: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawnText {
    pub label: String,
    pub role: FieldRole,
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayReport {
    /// Entries in target order.
    pub drawn: Vec<DrawnText>,
    /// Labels of targets that were not drawn: empty value, page out of
    /// bounds, or a page that could not be written.
    pub skipped: Vec<String>,
}

impl OverlayReport {
    pub fn changed(&self) -> bool {
        !self.drawn.is_empty()
    }
}

/// Draw each target's value at its coordinates.
///
/// `-1` pages resolve to the document's last page at call time. Targets with
/// an empty value or an out-of-range page draw nothing.
pub fn draw_overlay_targets(
    doc: &mut Document,
    targets: &[OverlayTarget],
    values: &FillValues,
) -> OverlayReport {
    let pages = page_ids(doc);
    let mut report = OverlayReport::default();
    let mut planned: BTreeMap<usize, Vec<(usize, DrawnText)>> = BTreeMap::new();

    for (order, target) in targets.iter().enumerate() {
        let Some(text) = values.get(target.role) else {
            debug!(label = %target.label, role = %target.role, "no value for overlay target");
            report.skipped.push(target.label.clone());
            continue;
        };
        let Some(page_index) = target.resolve_page(pages.len()) else {
            debug!(
                label = %target.label,
                page = target.page,
                page_count = pages.len(),
                "overlay target page out of range"
            );
            report.skipped.push(target.label.clone());
            continue;
        };
        planned.entry(page_index).or_default().push((
            order,
            DrawnText {
                label: target.label.clone(),
                role: target.role,
                page_index,
                x: target.x,
                y: target.y,
                text: text.to_string(),
            },
        ));
    }

    if planned.is_empty() {
        return report;
    }

    let font_id = add_standard_font(doc, OVERLAY_FONT);
    let mut drawn = Vec::new();
    for (page_index, entries) in planned {
        match draw_on_page(doc, pages[page_index], font_id, entries.iter().map(|(_, d)| d)) {
            Ok(()) => drawn.extend(entries),
            Err(e) => {
                warn!(page_index, error = %e, "could not draw overlay on page; skipping");
                report
                    .skipped
                    .extend(entries.into_iter().map(|(_, d)| d.label));
            }
        }
    }

    // Report in target order rather than page order.
    drawn.sort_by_key(|(order, _)| *order);
    report.drawn = drawn.into_iter().map(|(_, d)| d).collect();
    report
}

fn draw_on_page<'a>(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    entries: impl Iterator<Item = &'a DrawnText>,
) -> Result<(), PacketFormError> {
    let font_name = register_resource(doc, page_id, "Font", "PktF", font_id)?;

    let mut ops = Vec::new();
    ops.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
    for entry in entries {
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font_name.as_bytes().to_vec()),
                    OVERLAY_FONT_SIZE.into(),
                ],
            ),
            Operation::new("Td", vec![entry.x.into(), entry.y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(&entry.text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    append_page_content(doc, page_id, ops)
}
