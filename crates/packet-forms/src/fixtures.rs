//! In-memory PDFs for unit tests.

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::canvas::page_ids;

pub(crate) fn blank_document(pages: usize) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            b"0.5 w 36 36 m 72 72 l S".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => Dictionary::new(),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

pub(crate) struct TestField {
    pub name: &'static str,
    pub field_type: &'static str,
    pub value: Option<&'static str>,
    pub page: usize,
    pub rect: [i64; 4],
}

impl TestField {
    pub fn text(name: &'static str, page: usize) -> Self {
        Self {
            name,
            field_type: "Tx",
            value: None,
            page,
            rect: [100, 600, 300, 620],
        }
    }

    pub fn checkbox(name: &'static str, page: usize) -> Self {
        Self {
            name,
            field_type: "Btn",
            value: None,
            page,
            rect: [100, 500, 115, 515],
        }
    }

    pub fn with_value(mut self, value: &'static str) -> Self {
        self.value = Some(value);
        self
    }
}

pub(crate) fn install_acroform(doc: &mut Document, fields: Vec<ObjectId>) {
    let acroform_id = doc.add_object(dictionary! {
        "Fields" => fields.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    });
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .unwrap();
    doc.get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .unwrap()
        .set("AcroForm", Object::Reference(acroform_id));
}

/// A document whose fields are merged field/widget dictionaries.
pub(crate) fn form_document(pages: usize, fields: &[TestField]) -> Document {
    let mut doc = blank_document(pages);
    let page_list = page_ids(&doc);
    let mut field_ids = Vec::with_capacity(fields.len());

    for field_def in fields {
        let page_id = page_list[field_def.page];
        let mut field = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => field_def.field_type,
            "T" => Object::string_literal(field_def.name),
            "Rect" => field_def.rect.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
            "P" => Object::Reference(page_id),
        };
        if let Some(value) = field_def.value {
            field.set("V", Object::string_literal(value));
        }
        let field_id = doc.add_object(field);
        field_ids.push(field_id);

        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap();
        match page.get_mut(b"Annots") {
            Ok(Object::Array(annots)) => annots.push(Object::Reference(field_id)),
            _ => page.set("Annots", vec![Object::Reference(field_id)]),
        }
    }

    install_acroform(&mut doc, field_ids);
    doc
}

pub(crate) fn to_bytes(doc: &mut Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub(crate) fn page_content(doc: &Document, page_index: usize) -> Content {
    let page_id = page_ids(doc)[page_index];
    let bytes = doc.get_page_content(page_id).unwrap();
    Content::decode(&bytes).unwrap()
}

/// `(x, y, text)` for every `Td` + `Tj` pair drawn on a page.
pub(crate) fn drawn_text(doc: &Document, page_index: usize) -> Vec<(f32, f32, String)> {
    let mut out = Vec::new();
    let mut position = None;
    for op in page_content(doc, page_index).operations {
        match op.operator.as_str() {
            "Td" if op.operands.len() == 2 => {
                let x = op.operands[0].as_float().unwrap();
                let y = op.operands[1].as_float().unwrap();
                position = Some((x, y));
            }
            "Tj" => {
                if let (Some((x, y)), Some(Object::String(bytes, _))) =
                    (position.take(), op.operands.first())
                {
                    out.push((x, y, String::from_utf8_lossy(bytes).into_owned()));
                }
            }
            _ => {}
        }
    }
    out
}
