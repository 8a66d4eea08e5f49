//! Builders for small in-memory PDFs used by integration tests.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

pub struct TemplateBuilder {
    doc: Document,
    pages: Vec<ObjectId>,
    fields: Vec<ObjectId>,
}

impl TemplateBuilder {
    pub fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut pages = Vec::with_capacity(page_count);

        for index in 0..page_count {
            let body = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", index + 1);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), body.into_bytes()));
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Times-Roman",
            });
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => Object::Reference(font_id) },
                },
            });
            pages.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => pages.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            doc,
            pages,
            fields: Vec::new(),
        }
    }

    /// Add a text field whose dictionary doubles as its widget.
    pub fn text_field(mut self, name: &str, page: usize, value: Option<&str>) -> Self {
        let page_id = self.pages[page];
        let mut field = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(name),
            "Rect" => vec![100.into(), 600.into(), 300.into(), 620.into()],
            "P" => Object::Reference(page_id),
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
        };
        if let Some(value) = value {
            field.set("V", Object::string_literal(value));
        }
        let field_id = self.doc.add_object(field);
        self.fields.push(field_id);

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .unwrap();
        match page.get_mut(b"Annots") {
            Ok(Object::Array(annots)) => annots.push(Object::Reference(field_id)),
            _ => page.set("Annots", vec![Object::Reference(field_id)]),
        }
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.fields.is_empty() {
            let acroform_id = self.doc.add_object(dictionary! {
                "Fields" => self.fields.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            });
            let catalog_id = self
                .doc
                .trailer
                .get(b"Root")
                .and_then(Object::as_reference)
                .unwrap();
            self.doc
                .get_object_mut(catalog_id)
                .and_then(Object::as_dict_mut)
                .unwrap()
                .set("AcroForm", Object::Reference(acroform_id));
        }
        let mut out = Vec::new();
        self.doc.save_to(&mut out).unwrap();
        out
    }
}

/// `(x, y, text)` for every `Td` + `Tj` pair on a page, ignoring the
/// template's own text (drawn with `/F1`).
pub fn overlay_text(doc: &Document, page_index: usize) -> Vec<(f32, f32, String)> {
    let pages = doc.get_pages();
    let page_id = *pages.values().nth(page_index).unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

    let mut out = Vec::new();
    let mut font_is_template = false;
    let mut position = None;
    for op in content.operations {
        match op.operator.as_str() {
            "Tf" => {
                font_is_template = matches!(op.operands.first(), Some(Object::Name(n)) if n == b"F1");
            }
            "Td" => {
                position = Some((
                    op.operands[0].as_float().unwrap(),
                    op.operands[1].as_float().unwrap(),
                ));
            }
            "Tj" if !font_is_template => {
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
