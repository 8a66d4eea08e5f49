//! AcroForm field enumeration and value writing.

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::Serialize;
use tracing::debug;

use crate::canvas::read_rect;
use crate::error::PacketFormError;
use crate::text::{encode_text_string, encode_win_ansi, object_text};

/// Field trees nested deeper than this are ignored.
const MAX_FIELD_DEPTH: usize = 32;

/// `/Ff` bit: choice field is a combo box.
const FLAG_COMBO: u32 = 1 << 17;
/// `/Ff` bit: combo box accepts typed text.
const FLAG_EDIT: u32 = 1 << 18;

/// Font size used when a field's `/DA` asks for auto sizing.
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Resource name of the font inside generated appearance streams.
const APPEARANCE_FONT: &[u8] = b"Helv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Button,
    Choice,
    Signature,
    Unknown,
}

impl FieldKind {
    fn from_type(ft: Option<&[u8]>) -> Self {
        match ft {
            Some(b"Tx") => FieldKind::Text,
            Some(b"Btn") => FieldKind::Button,
            Some(b"Ch") => FieldKind::Choice,
            Some(b"Sig") => FieldKind::Signature,
            _ => FieldKind::Unknown,
        }
    }
}

/// A terminal form field and the widget annotations that display it.
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: ObjectId,
    /// Fully qualified name (`parent.child`).
    pub name: String,
    pub kind: FieldKind,
    pub flags: u32,
    pub value: Option<String>,
    pub default_appearance: Option<String>,
    pub widgets: Vec<ObjectId>,
}

impl FormField {
    /// Whether typed text can be stored in this field.
    pub fn accepts_text(&self) -> bool {
        match self.kind {
            FieldKind::Text => true,
            FieldKind::Choice => self.flags & FLAG_COMBO != 0 && self.flags & FLAG_EDIT != 0,
            _ => false,
        }
    }

    /// True when the field holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.value.as_deref().map_or(true, |v| v.trim().is_empty())
    }
}

/// Attributes a field inherits from its ancestors.
#[derive(Clone, Default)]
struct Inherited {
    name: String,
    field_type: Option<Vec<u8>>,
    flags: Option<u32>,
    default_appearance: Option<String>,
    value: Option<String>,
}

fn acroform_dict(doc: &Document) -> Result<Option<&Dictionary>, PacketFormError> {
    let catalog = doc.catalog()?;
    let acroform = match catalog.get(b"AcroForm") {
        Ok(obj) => obj,
        Err(_) => return Ok(None),
    };
    let (_, acroform) = doc.dereference(acroform)?;
    Ok(acroform.as_dict().ok())
}

/// Enumerate every terminal field of the document's AcroForm.
///
/// Documents without an AcroForm have no fields. Malformed entries in the
/// field tree are logged and skipped.
pub fn list_fields(doc: &Document) -> Result<Vec<FormField>, PacketFormError> {
    let Some(acroform) = acroform_dict(doc)? else {
        return Ok(Vec::new());
    };
    let roots = match acroform.get(b"Fields").map(|obj| doc.dereference(obj)) {
        Ok(Ok((_, Object::Array(roots)))) => roots,
        _ => return Ok(Vec::new()),
    };

    let root = Inherited {
        default_appearance: acroform.get(b"DA").ok().and_then(object_text),
        ..Inherited::default()
    };

    let mut fields = Vec::new();
    let mut visited = HashSet::new();
    for entry in roots {
        match entry.as_reference() {
            Ok(id) => walk_field(doc, id, &root, 0, &mut visited, &mut fields),
            Err(_) => debug!("skipping direct object in /Fields"),
        }
    }
    Ok(fields)
}

fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent: &Inherited,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<FormField>,
) {
    if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
        debug!(?id, depth, "field tree cycle or excessive depth");
        return;
    }
    let dict = match doc.get_dictionary(id) {
        Ok(dict) => dict,
        Err(e) => {
            tracing::warn!(?id, error = %e, "skipping unreadable form field");
            return;
        }
    };

    let partial = dict.get(b"T").ok().and_then(object_text);
    let name = match (&partial, parent.name.is_empty()) {
        (Some(partial), true) => partial.clone(),
        (Some(partial), false) => format!("{}.{}", parent.name, partial),
        (None, _) => parent.name.clone(),
    };

    let inherited = Inherited {
        name,
        field_type: dict
            .get(b"FT")
            .and_then(Object::as_name)
            .ok()
            .map(<[u8]>::to_vec)
            .or_else(|| parent.field_type.clone()),
        flags: dict
            .get(b"Ff")
            .and_then(Object::as_i64)
            .ok()
            .map(|f| f as u32)
            .or(parent.flags),
        default_appearance: dict
            .get(b"DA")
            .ok()
            .and_then(object_text)
            .or_else(|| parent.default_appearance.clone()),
        value: read_value(doc, dict).or_else(|| parent.value.clone()),
    };

    let kids: Vec<ObjectId> = dict
        .get(b"Kids")
        .and_then(Object::as_array)
        .map(|kids| kids.iter().filter_map(|k| k.as_reference().ok()).collect())
        .unwrap_or_default();

    let (child_fields, widget_kids): (Vec<ObjectId>, Vec<ObjectId>) =
        kids.into_iter().partition(|kid| {
            doc.get_dictionary(*kid)
                .map(|d| d.has(b"T"))
                .unwrap_or(false)
        });

    if !child_fields.is_empty() {
        for child in child_fields {
            walk_field(doc, child, &inherited, depth + 1, visited, out);
        }
        return;
    }

    let widgets = if !widget_kids.is_empty() {
        widget_kids
    } else if dict.has(b"Rect") || is_widget(dict) {
        vec![id]
    } else {
        Vec::new()
    };

    out.push(FormField {
        id,
        name: inherited.name,
        kind: FieldKind::from_type(inherited.field_type.as_deref()),
        flags: inherited.flags.unwrap_or(0),
        value: inherited.value,
        default_appearance: inherited.default_appearance,
        widgets,
    });
}

fn is_widget(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Widget"))
}

fn read_value(doc: &Document, dict: &Dictionary) -> Option<String> {
    let (_, value) = doc.dereference(dict.get(b"V").ok()?).ok()?;
    match value {
        Object::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(object_text).collect();
            Some(parts.join(", "))
        }
        other => object_text(other),
    }
}

/// Font size from a default-appearance string such as `/Helv 12 Tf 0 g`.
pub(crate) fn font_size_from_da(da: &str) -> Option<f32> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let tf = tokens.iter().position(|t| *t == "Tf")?;
    tokens.get(tf.checked_sub(1)?)?.parse().ok()
}

/// Store `value` in a text-capable field and regenerate its widget
/// appearances so viewers (and flattening) show the new text.
pub fn set_text_value(
    doc: &mut Document,
    field: &FormField,
    value: &str,
    font_id: ObjectId,
) -> Result<(), PacketFormError> {
    if !field.accepts_text() {
        return Err(PacketFormError::field(&field.name, "field does not accept text"));
    }
    if field.widgets.is_empty() {
        return Err(PacketFormError::field(&field.name, "field has no widget"));
    }

    let requested_size = field
        .default_appearance
        .as_deref()
        .and_then(font_size_from_da)
        .filter(|size| *size > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE);

    let mut appearances = Vec::with_capacity(field.widgets.len());
    for widget_id in &field.widgets {
        let widget = doc.get_dictionary(*widget_id)?;
        let rect = read_rect(widget, b"Rect")
            .ok_or_else(|| PacketFormError::field(&field.name, "widget has no usable /Rect"))?;
        let stream = text_appearance(rect, value, requested_size, font_id)?;
        appearances.push((*widget_id, stream));
    }

    doc.get_object_mut(field.id)?
        .as_dict_mut()?
        .set("V", encode_text_string(value));

    for (widget_id, stream) in appearances {
        let ap_id = doc.add_object(stream);
        doc.get_object_mut(widget_id)?
            .as_dict_mut()?
            .set("AP", dictionary! { "N" => Object::Reference(ap_id) });
    }
    Ok(())
}

/// Single-line appearance stream: Helvetica, black, vertically centered.
fn text_appearance(
    rect: [f32; 4],
    value: &str,
    requested_size: f32,
    font_id: ObjectId,
) -> Result<Stream, PacketFormError> {
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];
    let size = requested_size.min((height - 2.0).max(1.0));
    let baseline = ((height - size) / 2.0 + size * 0.22).max(1.0);

    let content = Content {
        operations: vec![
            Operation::new("BMC", vec![Object::Name(b"Tx".to_vec())]),
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(APPEARANCE_FONT.to_vec()), size.into()]),
            Operation::new("g", vec![0.into()]),
            Operation::new("Td", vec![2.into(), baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(value), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("EMC", vec![]),
        ],
    };

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => dictionary! {
            "Font" => dictionary! { "Helv" => Object::Reference(font_id) },
        },
    };
    Ok(Stream::new(dict, content.encode()?))
}
