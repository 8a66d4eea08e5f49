//! Form profiles: the role table and overlay coordinates for one template.
//!
//! Profiles are plain data so a new template revision only needs a new
//! TOML (or JSON) file:
//!
//! ```toml
//! name = "employee-handbook"
//!
//! [fields]
//! name = ["employee_name"]
//! initials = ["initials_page_1"]
//! date = ["acknowledgment_date"]
//!
//! [[overlay]]
//! label = "acknowledgment-name"
//! role = "name"
//! page = -1
//! x = 120.0
//! y = 186.0
//! ```
//!
//! Overlay coordinates are PDF user-space points (origin bottom-left) and
//! belong to one specific revision of the template.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classify::{FieldRole, FieldRoleTable};
use crate::error::PacketFormError;

/// Page index meaning "the last page of the document".
pub const LAST_PAGE: i32 = -1;

const EMPLOYEE_HANDBOOK_PROFILE: &str = include_str!("../profiles/employee_handbook.toml");

/// Where to draw a value on a template that has no live fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayTarget {
    pub label: String,
    pub role: FieldRole,
    /// Zero-based page index, or [`LAST_PAGE`].
    pub page: i32,
    pub x: f32,
    pub y: f32,
}

impl OverlayTarget {
    pub fn new(label: impl Into<String>, role: FieldRole, page: i32, x: f32, y: f32) -> Self {
        Self {
            label: label.into(),
            role,
            page,
            x,
            y,
        }
    }

    /// Resolve the page index against a document's page count.
    ///
    /// Returns `None` when the index is out of bounds.
    pub fn resolve_page(&self, page_count: usize) -> Option<usize> {
        let index = if self.page == LAST_PAGE {
            page_count.checked_sub(1)?
        } else {
            usize::try_from(self.page).ok()?
        };
        (index < page_count).then_some(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormProfile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: FieldRoleTable,
    #[serde(default)]
    pub overlay: Vec<OverlayTarget>,
}

impl FormProfile {
    pub fn new(name: impl Into<String>, fields: FieldRoleTable, overlay: Vec<OverlayTarget>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            overlay,
        }
    }

    /// The profile for the employee handbook acknowledgment packet.
    pub fn employee_handbook() -> Result<Self, PacketFormError> {
        Self::from_toml_str(EMPLOYEE_HANDBOOK_PROFILE)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, PacketFormError> {
        let profile: Self =
            toml::from_str(s).map_err(|e| PacketFormError::Profile(e.to_string()))?;
        profile.validated()
    }

    pub fn from_json_str(s: &str) -> Result<Self, PacketFormError> {
        let profile: Self =
            serde_json::from_str(s).map_err(|e| PacketFormError::Profile(e.to_string()))?;
        profile.validated()
    }

    /// Load a profile file; `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PacketFormError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PacketFormError::Profile(format!("failed to read {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    fn validated(self) -> Result<Self, PacketFormError> {
        if self.name.trim().is_empty() {
            return Err(PacketFormError::Profile("profile name is empty".into()));
        }
        if let Some(target) = self.overlay.iter().find(|t| t.page < LAST_PAGE) {
            return Err(PacketFormError::Profile(format!(
                "overlay target '{}' has invalid page index {}",
                target.label, target.page
            )));
        }
        let overlaps = self.fields.overlaps();
        if !overlaps.is_empty() {
            warn!(
                profile = %self.name,
                ?overlaps,
                "field names listed under several roles; resolving name > initials > date"
            );
        }
        Ok(self)
    }
}
