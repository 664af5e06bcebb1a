//! Leave record types.
//!
//! Records are deserialised straight from the dataset JSON. Date fields stay
//! as raw strings so that malformed source data can still be loaded; parsing
//! happens when a duration is asked for.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by the dataset (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kind of leave. The dataset currently only contains caregiver leave.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeaveType {
    /// Leave taken to care for a family member.
    Caregiver,
    /// Any tag this build does not know about.
    Other(String),
}

impl LeaveType {
    /// Returns the tag as it appears in the dataset.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Caregiver => "CAREGIVER",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for LeaveType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "CAREGIVER" => Self::Caregiver,
            _ => Self::Other(tag),
        }
    }
}

impl From<LeaveType> for String {
    fn from(value: LeaveType) -> Self {
        value.as_str().to_string()
    }
}

/// Relationship of the cared-for person to the employee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaregiverType {
    /// Child under 18.
    ChildUnder18,
    /// Child 18 or over.
    ChildOver18,
    /// Parent.
    Parent,
    /// Spouse or partner.
    Spouse,
    /// Any other relationship tag, kept verbatim.
    Other(String),
}

impl CaregiverType {
    /// Returns the tag as it appears in the dataset.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChildUnder18 => "CHILD_U18",
            Self::ChildOver18 => "CHILD_O18",
            Self::Parent => "PARENT",
            Self::Spouse => "SPOUSE",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for CaregiverType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "CHILD_U18" => Self::ChildUnder18,
            "CHILD_O18" => Self::ChildOver18,
            "PARENT" => Self::Parent,
            "SPOUSE" => Self::Spouse,
            _ => Self::Other(tag),
        }
    }
}

impl From<CaregiverType> for String {
    fn from(value: CaregiverType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CaregiverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    /// Opaque leave identifier.
    pub leave_id: String,
    /// Employee the leave belongs to.
    pub employee_id: String,
    /// Leave category.
    pub leave_type: LeaveType,
    /// First day of leave, `YYYY-MM-DD`.
    #[serde(default)]
    pub expected_leave_date: Option<String>,
    /// Expected return day, `YYYY-MM-DD`.
    #[serde(default)]
    pub expected_return_date: Option<String>,
    /// Whether the leave is taken as one continuous block.
    #[serde(default)]
    pub is_leave_continuous: bool,
    /// Whether the leave is taken intermittently.
    #[serde(default)]
    pub is_leave_intermittent: bool,
    /// Who is being cared for, if recorded.
    #[serde(default)]
    pub caregiver_type: Option<CaregiverType>,
}

impl LeaveRecord {
    /// Whole calendar days between the leave date and the return date.
    ///
    /// Returns `None` when either date is missing or does not parse. The
    /// result may be zero or negative for non-chronological records.
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        let start = parse_calendar_date(self.expected_leave_date.as_deref()?).ok()?;
        let end = parse_calendar_date(self.expected_return_date.as_deref()?).ok()?;
        Some((end - start).num_days())
    }

    /// Duration in days if it is strictly positive.
    ///
    /// Only these durations take part in aggregates.
    #[must_use]
    pub fn contributing_duration(&self) -> Option<i64> {
        self.duration_days().filter(|days| *days > 0)
    }
}

/// Parses a dataset date.
///
/// # Errors
///
/// Returns the chrono parse error if `raw` is not a valid `YYYY-MM-DD` date.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(leave: Option<&str>, ret: Option<&str>) -> LeaveRecord {
        LeaveRecord {
            leave_id: "test".to_string(),
            employee_id: "1".to_string(),
            leave_type: LeaveType::Caregiver,
            expected_leave_date: leave.map(str::to_string),
            expected_return_date: ret.map(str::to_string),
            is_leave_continuous: false,
            is_leave_intermittent: false,
            caregiver_type: None,
        }
    }

    #[test]
    fn duration_counts_calendar_days() {
        let r = record(Some("2024-11-07"), Some("2025-11-08"));
        assert_eq!(r.duration_days(), Some(366));
    }

    #[test]
    fn duration_across_leap_day() {
        let r = record(Some("2024-02-28"), Some("2024-03-01"));
        assert_eq!(r.duration_days(), Some(2));
    }

    #[test]
    fn reversed_dates_do_not_contribute() {
        let r = record(Some("2024-05-09"), Some("2024-05-02"));
        assert_eq!(r.duration_days(), Some(-7));
        assert_eq!(r.contributing_duration(), None);
    }

    #[test]
    fn same_day_does_not_contribute() {
        let r = record(Some("2024-05-02"), Some("2024-05-02"));
        assert_eq!(r.contributing_duration(), None);
    }

    #[test]
    fn malformed_or_missing_dates_yield_none() {
        assert_eq!(record(Some("2024-13-01"), Some("2024-12-01")).duration_days(), None);
        assert_eq!(record(Some("not a date"), Some("2024-12-01")).duration_days(), None);
        assert_eq!(record(None, Some("2024-12-01")).duration_days(), None);
        assert_eq!(record(Some("2024-12-01"), None).duration_days(), None);
    }

    #[test]
    fn unknown_tags_are_preserved() {
        let json = r#"{
            "leave_id": "x",
            "employee_id": "1",
            "leave_type": "MEDICAL",
            "caregiver_type": "GRANDPARENT"
        }"#;
        let r: LeaveRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.leave_type, LeaveType::Other("MEDICAL".to_string()));
        assert_eq!(r.caregiver_type.as_ref().map(CaregiverType::as_str), Some("GRANDPARENT"));
        assert!(!r.is_leave_continuous);
        assert!(!r.is_leave_intermittent);
    }

    #[test]
    fn known_tags_round_trip_through_strings() {
        let r: LeaveRecord = serde_json::from_str(
            r#"{"leave_id": "x", "employee_id": "1", "leave_type": "CAREGIVER", "caregiver_type": "CHILD_O18"}"#,
        )
        .unwrap();
        assert_eq!(r.leave_type, LeaveType::Caregiver);
        assert_eq!(r.caregiver_type, Some(CaregiverType::ChildOver18));

        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["caregiver_type"], "CHILD_O18");
        assert_eq!(value["leave_type"], "CAREGIVER");
    }
}
