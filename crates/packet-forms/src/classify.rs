//! Field-name classification against a profile's role table.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::values::FillValues;

/// What a form field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Name,
    Initials,
    Date,
}

impl FieldRole {
    /// Resolution order when a field name appears in more than one set.
    pub const PRECEDENCE: [FieldRole; 3] = [FieldRole::Name, FieldRole::Initials, FieldRole::Date];
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Name => write!(f, "name"),
            FieldRole::Initials => write!(f, "initials"),
            FieldRole::Date => write!(f, "date"),
        }
    }
}

/// Exact, case-sensitive field-name sets for each role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRoleTable {
    #[serde(default)]
    pub name: BTreeSet<String>,
    #[serde(default)]
    pub initials: BTreeSet<String>,
    #[serde(default)]
    pub date: BTreeSet<String>,
}

impl FieldRoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic profiles.
    pub fn with(mut self, role: FieldRole, field_name: impl Into<String>) -> Self {
        self.set_mut(role).insert(field_name.into());
        self
    }

    fn set(&self, role: FieldRole) -> &BTreeSet<String> {
        match role {
            FieldRole::Name => &self.name,
            FieldRole::Initials => &self.initials,
            FieldRole::Date => &self.date,
        }
    }

    fn set_mut(&mut self, role: FieldRole) -> &mut BTreeSet<String> {
        match role {
            FieldRole::Name => &mut self.name,
            FieldRole::Initials => &mut self.initials,
            FieldRole::Date => &mut self.date,
        }
    }

    /// Role of a field name; names in several sets resolve name, then
    /// initials, then date.
    pub fn classify(&self, field_name: &str) -> Option<FieldRole> {
        FieldRole::PRECEDENCE
            .into_iter()
            .find(|role| self.set(*role).contains(field_name))
    }

    /// The fill value for a field, or `None` if the field is unclassified or
    /// its role's value is empty.
    pub fn value_for<'v>(&self, field_name: &str, values: &'v FillValues) -> Option<&'v str> {
        self.classify(field_name).and_then(|role| values.get(role))
    }

    /// Field names listed under more than one role.
    pub fn overlaps(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut dupes = BTreeSet::new();
        for role in FieldRole::PRECEDENCE {
            for name in self.set(role) {
                if !seen.insert(name.as_str()) {
                    dupes.insert(name.clone());
                }
            }
        }
        dupes.into_iter().collect()
    }

    /// Every listed field name, deduplicated, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let all: BTreeSet<&str> = FieldRole::PRECEDENCE
            .into_iter()
            .flat_map(|role| self.set(role).iter().map(String::as_str))
            .collect();
        all.into_iter()
    }

    pub fn len(&self) -> usize {
        self.name.len() + self.initials.len() + self.date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
