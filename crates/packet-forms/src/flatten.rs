//! Flattening: paint widget appearances into page content and drop the form.

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::acroform::list_fields;
use crate::canvas::{append_page_content, page_ids, read_rect, register_resource};
use crate::error::PacketFormError;

/// Annotation `/F` bits that keep a widget off the page.
const HIDDEN_FLAGS: i64 = 0b10 | 0b10_0000;

/// Convert every live field into static page content.
///
/// Widgets with a normal appearance are painted where they sit; all widget
/// annotations are then removed and `/AcroForm` is dropped from the
/// catalog. Returns the number of widgets painted.
pub fn flatten_form(doc: &mut Document) -> Result<usize, PacketFormError> {
    let fields = list_fields(doc)?;
    let widget_pages = widget_page_index(doc);

    let mut widgets: HashSet<ObjectId> = HashSet::new();
    let mut batches: BTreeMap<ObjectId, Vec<Operation>> = BTreeMap::new();
    let mut painted = 0;

    for widget_id in fields.iter().flat_map(|f| f.widgets.iter().copied()) {
        if !widgets.insert(widget_id) {
            continue;
        }
        let widget = doc.get_dictionary(widget_id)?;
        let page_id = widget
            .get(b"P")
            .and_then(Object::as_reference)
            .ok()
            .or_else(|| widget_pages.get(&widget_id).copied());
        let flags = widget.get(b"F").and_then(Object::as_i64).unwrap_or(0);
        let hidden = flags & HIDDEN_FLAGS != 0;
        let (Some(page_id), false) = (page_id, hidden) else {
            continue;
        };
        let Some(rect) = read_rect(widget, b"Rect") else {
            continue;
        };
        let Some(appearance_id) = normal_appearance(doc, widget_id)? else {
            debug!(?widget_id, "widget has no appearance; dropping it");
            continue;
        };

        let bbox = {
            let stream = doc.get_object_mut(appearance_id)?.as_stream_mut()?;
            stream.dict.set("Type", "XObject");
            stream.dict.set("Subtype", "Form");
            read_rect(&stream.dict, b"BBox")
                .unwrap_or([0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]])
        };

        let name = register_resource(doc, page_id, "XObject", "PktFlat", appearance_id)?;
        let (sx, sy) = (
            scale(rect[2] - rect[0], bbox[2] - bbox[0]),
            scale(rect[3] - rect[1], bbox[3] - bbox[1]),
        );
        let (tx, ty) = (rect[0] - bbox[0] * sx, rect[1] - bbox[1] * sy);

        batches.entry(page_id).or_default().extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![sx.into(), 0.into(), 0.into(), sy.into(), tx.into(), ty.into()],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        painted += 1;
    }

    for (page_id, ops) in batches {
        append_page_content(doc, page_id, ops)?;
    }
    remove_widget_annotations(doc, &widgets)?;
    remove_acroform(doc)?;

    debug!(painted, widgets = widgets.len(), "flattened form");
    Ok(painted)
}

fn scale(target: f32, source: f32) -> f32 {
    if source.abs() > f32::EPSILON {
        target / source
    } else {
        1.0
    }
}

/// Map each annotation to the page listing it in `/Annots`.
fn widget_page_index(doc: &Document) -> HashMap<ObjectId, ObjectId> {
    let mut index = HashMap::new();
    for page_id in page_ids(doc) {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots").and_then(|a| doc.dereference(a)) else {
            continue;
        };
        if let (_, Object::Array(annots)) = annots {
            for annot in annots.iter().filter_map(|a| a.as_reference().ok()) {
                index.insert(annot, page_id);
            }
        }
    }
    index
}

/// The `/AP /N` stream of a widget, resolving `/AS` for state dictionaries.
fn normal_appearance(
    doc: &mut Document,
    widget_id: ObjectId,
) -> Result<Option<ObjectId>, PacketFormError> {
    let widget = doc.get_dictionary(widget_id)?;
    let Ok((_, ap)) = widget.get(b"AP").and_then(|ap| doc.dereference(ap)) else {
        return Ok(None);
    };
    let Ok(normal) = ap.as_dict().and_then(|ap| ap.get(b"N")) else {
        return Ok(None);
    };

    let inline = match normal {
        Object::Reference(id) => {
            return Ok(match doc.get_object(*id)? {
                Object::Stream(_) => Some(*id),
                Object::Dictionary(states) => selected_state(widget, states),
                _ => None,
            })
        }
        Object::Dictionary(states) => return Ok(selected_state(widget, states)),
        Object::Stream(stream) => stream.clone(),
        _ => return Ok(None),
    };
    Ok(Some(doc.add_object(inline)))
}

fn selected_state(widget: &Dictionary, states: &Dictionary) -> Option<ObjectId> {
    let state = widget.get(b"AS").and_then(Object::as_name).ok()?;
    states.get(state).and_then(Object::as_reference).ok()
}

fn remove_widget_annotations(
    doc: &mut Document,
    widgets: &HashSet<ObjectId>,
) -> Result<(), PacketFormError> {
    let keep = |annot: &Object| match annot {
        Object::Reference(id) => !widgets.contains(id),
        _ => true,
    };

    for page_id in page_ids(doc) {
        let annots = doc.get_dictionary(page_id)?.get(b"Annots").ok().cloned();
        match annots {
            Some(Object::Reference(array_id)) => {
                if let Object::Array(items) = doc.get_object_mut(array_id)? {
                    items.retain(|a| keep(a));
                }
            }
            Some(Object::Array(mut items)) => {
                items.retain(|a| keep(a));
                let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
                if items.is_empty() {
                    page.remove(b"Annots");
                } else {
                    page.set("Annots", Object::Array(items));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn remove_acroform(doc: &mut Document) -> Result<(), PacketFormError> {
    let catalog_id = doc.trailer.get(b"Root").and_then(Object::as_reference)?;
    doc.get_object_mut(catalog_id)?
        .as_dict_mut()?
        .remove(b"AcroForm");
    Ok(())
}
