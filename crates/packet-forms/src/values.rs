//! Values stamped onto a packet: full name, initials and a formatted date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::FieldRole;

/// The three strings a fill operation writes, derived once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillValues {
    pub full_name: String,
    pub initials: String,
    pub date_string: String,
}

impl FillValues {
    /// Derive fill values from a name and up to two candidate dates.
    ///
    /// The first non-blank date wins; when both are blank the current UTC
    /// date is used. A chosen date that does not parse renders as an empty
    /// string rather than falling through to the next candidate.
    pub fn derive(full_name: &str, primary_date: Option<&str>, fallback_date: Option<&str>) -> Self {
        let full_name = full_name.trim().to_string();
        let initials = derive_initials(&full_name);

        let chosen = [primary_date, fallback_date]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty());

        let date_string = match chosen {
            Some(iso) => format_date(iso),
            None => Utc::now().format(DATE_FORMAT).to_string(),
        };

        Self {
            full_name,
            initials,
            date_string,
        }
    }

    /// The value for a role, or `None` when it is empty.
    pub fn get(&self, role: FieldRole) -> Option<&str> {
        let value = match role {
            FieldRole::Name => &self.full_name,
            FieldRole::Initials => &self.initials,
            FieldRole::Date => &self.date_string,
        };
        if value.is_empty() {
            None
        } else {
            Some(value.as_str())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty() && self.initials.is_empty() && self.date_string.is_empty()
    }
}

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Initials for a display name.
///
/// One word yields its first two characters; several words yield the first
/// character of the first and last word. Always uppercased.
pub fn derive_initials(full_name: &str) -> String {
    let words: Vec<&str> = full_name.split_whitespace().collect();
    match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).flat_map(char::to_uppercase).collect(),
        [first, .., last] => first
            .chars()
            .take(1)
            .chain(last.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect(),
    }
}

/// Render an ISO 8601 date or timestamp as `MM/DD/YYYY`.
///
/// Timestamps carrying an offset are converted to UTC first. Anything that
/// does not parse yields an empty string.
pub fn format_date(iso: &str) -> String {
    parse_date(iso.trim())
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    if input.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(input, pattern) {
            return Some(ts.date());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn initials_from_two_words() {
        assert_eq!(derive_initials("Maria Garcia"), "MG");
    }

    #[test]
    fn initials_from_single_word_take_two_chars() {
        assert_eq!(derive_initials("Prince"), "PR");
        assert_eq!(derive_initials("x"), "X");
    }

    #[test]
    fn initials_use_first_and_last_word() {
        assert_eq!(derive_initials("jordan  michael   lee"), "JL");
    }

    #[test]
    fn initials_of_blank_name_are_empty() {
        assert_eq!(derive_initials(""), "");
        assert_eq!(derive_initials("   "), "");
    }

    #[test]
    fn formats_utc_timestamp() {
        assert_eq!(format_date("2025-01-15T00:00:00Z"), "01/15/2025");
    }

    #[test]
    fn offset_timestamps_are_rendered_in_utc() {
        assert_eq!(format_date("2025-01-15T23:30:00-05:00"), "01/16/2025");
    }

    #[test]
    fn formats_plain_date_and_local_timestamp() {
        assert_eq!(format_date("2024-03-02"), "03/02/2024");
        assert_eq!(format_date("2024-03-02T08:15:00.250"), "03/02/2024");
    }

    #[test]
    fn unparseable_date_is_empty() {
        assert_eq!(format_date("not a date"), "");
        assert_eq!(format_date("2024-13-45"), "");
    }

    #[test]
    fn derive_prefers_primary_date() {
        let values = FillValues::derive(" Jordan Lee ", Some("2024-03-02"), Some("2020-01-01"));
        assert_eq!(values.full_name, "Jordan Lee");
        assert_eq!(values.initials, "JL");
        assert_eq!(values.date_string, "03/02/2024");
    }

    #[test]
    fn derive_falls_back_when_primary_blank() {
        let values = FillValues::derive("Jordan Lee", Some("  "), Some("2020-01-01T12:00:00Z"));
        assert_eq!(values.date_string, "01/01/2020");
    }

    #[test]
    fn invalid_primary_does_not_fall_through() {
        let values = FillValues::derive("Jordan Lee", Some("garbage"), Some("2020-01-01"));
        assert_eq!(values.date_string, "");
    }

    #[test]
    fn derive_defaults_to_today() {
        let values = FillValues::derive("Jordan Lee", None, None);
        assert_eq!(values.date_string, Utc::now().format("%m/%d/%Y").to_string());
    }

    #[test]
    fn empty_roles_yield_none() {
        let values = FillValues::derive("", Some("bad"), None);
        assert!(values.get(FieldRole::Name).is_none());
        assert!(values.get(FieldRole::Initials).is_none());
        assert!(values.get(FieldRole::Date).is_none());
        assert!(values.is_empty());
    }
}
