//! Writing fill values into a document's live text fields.

use lopdf::{Document, ObjectId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::acroform::{set_text_value, FormField};
use crate::canvas::add_standard_font;
use crate::classify::FieldRoleTable;
use crate::values::FillValues;

/// What a native fill pass did, field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NativeFillReport {
    /// Fields that received a value.
    pub written: Vec<String>,
    /// Classified fields left alone because they already hold text.
    pub prefilled: Vec<String>,
    /// Fields whose update failed and was skipped.
    pub failed: Vec<String>,
}

impl NativeFillReport {
    pub fn changed(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Fill every empty, text-capable, classified field.
///
/// Fields that already hold non-blank text are never overwritten. A failure
/// on one field is logged and does not stop the others.
pub fn fill_native_fields(
    doc: &mut Document,
    fields: &[FormField],
    table: &FieldRoleTable,
    values: &FillValues,
) -> NativeFillReport {
    let mut report = NativeFillReport::default();
    let mut font: Option<ObjectId> = None;

    for field in fields {
        if !field.accepts_text() {
            continue;
        }
        let Some(value) = table.value_for(&field.name, values) else {
            continue;
        };
        if !field.is_blank() {
            debug!(field = %field.name, "field already filled; leaving it");
            report.prefilled.push(field.name.clone());
            continue;
        }

        let font_id = *font.get_or_insert_with(|| add_standard_font(doc, "Helvetica"));
        match set_text_value(doc, field, value, font_id) {
            Ok(()) => {
                debug!(field = %field.name, "filled field");
                report.written.push(field.name.clone());
            }
            Err(e) => {
                warn!(field = %field.name, error = %e, "could not fill field; skipping");
                report.failed.push(field.name.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acroform::list_fields;
    use crate::classify::FieldRole;
    use crate::fixtures::{form_document, TestField};
    use lopdf::{dictionary, Object};

    fn table() -> FieldRoleTable {
        FieldRoleTable::new()
            .with(FieldRole::Name, "employee_name")
            .with(FieldRole::Initials, "employee_initials")
            .with(FieldRole::Date, "acknowledgment_date")
    }

    fn values() -> FillValues {
        FillValues {
            full_name: "Jordan Lee".into(),
            initials: "JL".into(),
            date_string: "03/02/2024".into(),
        }
    }

    fn value_of(doc: &Document, name: &str) -> Option<String> {
        list_fields(doc)
            .unwrap()
            .into_iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value)
    }

    #[test]
    fn fills_empty_classified_fields() {
        let mut doc = form_document(
            1,
            &[
                TestField::text("employee_name", 0),
                TestField::text("employee_initials", 0),
                TestField::text("acknowledgment_date", 0),
                TestField::text("emergency_contact", 0),
            ],
        );
        let fields = list_fields(&doc).unwrap();
        let report = fill_native_fields(&mut doc, &fields, &table(), &values());

        assert!(report.changed());
        assert_eq!(report.written.len(), 3);
        assert_eq!(value_of(&doc, "employee_name").as_deref(), Some("Jordan Lee"));
        assert_eq!(value_of(&doc, "employee_initials").as_deref(), Some("JL"));
        assert_eq!(value_of(&doc, "acknowledgment_date").as_deref(), Some("03/02/2024"));
        assert_eq!(value_of(&doc, "emergency_contact"), None);
    }

    #[test]
    fn never_overwrites_user_entered_text() {
        let mut doc = form_document(
            1,
            &[TestField::text("employee_name", 0).with_value("Jordan M. Lee")],
        );
        let fields = list_fields(&doc).unwrap();
        let report = fill_native_fields(&mut doc, &fields, &table(), &values());

        assert!(!report.changed());
        assert_eq!(report.prefilled, vec!["employee_name".to_string()]);
        assert_eq!(value_of(&doc, "employee_name").as_deref(), Some("Jordan M. Lee"));
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let mut doc = form_document(1, &[TestField::text("employee_name", 0).with_value("   ")]);
        let fields = list_fields(&doc).unwrap();
        let report = fill_native_fields(&mut doc, &fields, &table(), &values());
        assert_eq!(report.written, vec!["employee_name".to_string()]);
    }

    #[test]
    fn skips_non_text_fields() {
        let mut doc = form_document(1, &[TestField::checkbox("employee_name", 0)]);
        let fields = list_fields(&doc).unwrap();
        let report = fill_native_fields(&mut doc, &fields, &table(), &values());
        assert_eq!(report, NativeFillReport::default());
    }

    #[test]
    fn malformed_field_is_skipped_without_aborting() {
        let mut doc = form_document(
            1,
            &[
                TestField::text("employee_name", 0),
                TestField::text("acknowledgment_date", 0),
            ],
        );
        let fields = list_fields(&doc).unwrap();
        let broken = fields.iter().find(|f| f.name == "employee_name").unwrap();
        doc.get_object_mut(broken.id)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .remove(b"Rect");

        let report = fill_native_fields(&mut doc, &fields, &table(), &values());
        assert_eq!(report.failed, vec!["employee_name".to_string()]);
        assert_eq!(report.written, vec!["acknowledgment_date".to_string()]);
        assert_eq!(value_of(&doc, "employee_name"), None);
    }

    #[test]
    fn field_without_widgets_is_reported_as_failed() {
        let mut doc = form_document(1, &[TestField::text("acknowledgment_date", 0)]);
        let bare = doc.add_object(lopdf::dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("employee_name"),
        });
        let acroform_id = doc
            .catalog()
            .and_then(|c| c.get(b"AcroForm"))
            .and_then(Object::as_reference)
            .unwrap();
        doc.get_object_mut(acroform_id)
            .and_then(Object::as_dict_mut)
            .and_then(|form| form.get_mut(b"Fields"))
            .and_then(Object::as_array_mut)
            .unwrap()
            .push(Object::Reference(bare));

        let fields = list_fields(&doc).unwrap();
        assert!(fields.iter().any(|f| f.name == "employee_name" && f.widgets.is_empty()));

        let report = fill_native_fields(&mut doc, &fields, &table(), &values());
        assert_eq!(report.failed, vec!["employee_name".to_string()]);
        assert_eq!(report.written, vec!["acknowledgment_date".to_string()]);
        assert_eq!(value_of(&doc, "employee_name"), None);
    }
}
