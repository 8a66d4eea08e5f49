//! Payroll-packet form engine
//!
//! Fills employee name, initials and date into PDF templates. Templates with
//! live AcroForm fields are filled natively (empty fields only); templates
//! without fields get the values drawn at fixed coordinates from a
//! [`FormProfile`]. Filled documents are flattened before they are saved.
//!
//! ```no_run
//! use packet_forms::{fill_base64, FillValues, FormProfile};
//!
//! # fn run(template_base64: &str) -> Result<(), packet_forms::PacketFormError> {
//! let profile = FormProfile::employee_handbook()?;
//! let values = FillValues::derive("Jordan Lee", Some("2024-03-02"), None);
//! match fill_base64(template_base64, &profile, &values)? {
//!     Some(filled) => println!("{} bytes of base64", filled.len()),
//!     None => println!("nothing to fill"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod acroform;
pub(crate) mod canvas;
pub mod classify;
pub mod error;
pub mod fill;
pub mod flatten;
pub mod inspect;
pub mod native;
pub mod overlay;
pub mod profile;
pub mod template;
pub mod text;
pub mod values;

#[cfg(test)]
mod fixtures;

pub use acroform::{list_fields, FieldKind, FormField};
pub use classify::{FieldRole, FieldRoleTable};
pub use error::PacketFormError;
pub use fill::{decode_pdf_base64, fill_base64, fill_document, load_document, FillMode, FilledDocument};
pub use flatten::flatten_form;
pub use inspect::{inspect_document, FieldReport, FormReport};
pub use native::{fill_native_fields, NativeFillReport};
pub use overlay::{draw_overlay_targets, DrawnText, OverlayReport};
pub use profile::{FormProfile, OverlayTarget, LAST_PAGE};
pub use template::TemplateStore;
pub use values::{derive_initials, format_date, FillValues};
