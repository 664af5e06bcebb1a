//! The canned aggregations a query can be routed to.
//!
//! Each function takes the whole record set and builds a [`QueryResult`].
//! Duration-based figures only use records whose return date is strictly
//! after the leave date; anything else is left out without complaint.

use indexmap::IndexMap;

use crate::dataset::{LeaveRecord, RecordSet};
use crate::query::result::{Cell, QueryResult};

/// Tag reported for records without a caregiver type.
pub const UNKNOWN_CAREGIVER_TYPE: &str = "UNKNOWN";

/// Min/max/mean over the contributing durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    /// Number of records with a positive duration.
    pub count: usize,
    /// Arithmetic mean in days (unrounded).
    pub mean: f64,
    /// Shortest duration in days.
    pub min: i64,
    /// Longest duration in days.
    pub max: i64,
}

impl DurationStats {
    /// Computes statistics over the records' contributing durations.
    ///
    /// Returns `None` when no record contributes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // day counts are far below 2^52
    pub fn collect(records: &RecordSet) -> Option<Self> {
        let durations: Vec<i64> = records
            .iter()
            .filter_map(LeaveRecord::contributing_duration)
            .collect();

        let min = *durations.iter().min()?;
        let max = *durations.iter().max()?;
        let total: i64 = durations.iter().sum();

        Some(Self {
            count: durations.len(),
            mean: total as f64 / durations.len() as f64,
            min,
            max,
        })
    }
}

/// Continuous and intermittent flag counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ContinuityCounts {
    continuous: usize,
    intermittent: usize,
}

impl ContinuityCounts {
    fn collect(records: &RecordSet) -> Self {
        Self {
            continuous: records.iter().filter(|r| r.is_leave_continuous).count(),
            intermittent: records.iter().filter(|r| r.is_leave_intermittent).count(),
        }
    }
}

/// `AVG_DURATION_DAYS | TOTAL_LEAVES | MIN_DAYS | MAX_DAYS`.
///
/// Yields nothing when no record has a positive duration.
#[must_use]
pub fn duration_statistics(records: &RecordSet) -> Option<QueryResult> {
    let stats = DurationStats::collect(records)?;

    Some(
        QueryResult::with_columns(&["AVG_DURATION_DAYS", "TOTAL_LEAVES", "MIN_DAYS", "MAX_DAYS"])
            .row(vec![
                Cell::rounded(stats.mean),
                Cell::from(stats.count),
                Cell::from(stats.min),
                Cell::from(stats.max),
            ]),
    )
}

/// `CONTINUOUS_LEAVES | INTERMITTENT_LEAVES | TOTAL`.
///
/// The flags are counted independently, so the first two columns need not
/// add up to `TOTAL`.
#[must_use]
pub fn continuity_breakdown(records: &RecordSet) -> QueryResult {
    let counts = ContinuityCounts::collect(records);

    QueryResult::with_columns(&["CONTINUOUS_LEAVES", "INTERMITTENT_LEAVES", "TOTAL"]).row(vec![
        Cell::from(counts.continuous),
        Cell::from(counts.intermittent),
        Cell::from(records.len()),
    ])
}

/// `CAREGIVER_TYPE | COUNT`, one row per tag in first-seen order.
#[must_use]
pub fn caregiver_type_breakdown(records: &RecordSet) -> QueryResult {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for record in records {
        let tag = record
            .caregiver_type
            .as_ref()
            .map_or(UNKNOWN_CAREGIVER_TYPE, |t| t.as_str());
        *counts.entry(tag).or_default() += 1;
    }

    counts.into_iter().fold(
        QueryResult::with_columns(&["CAREGIVER_TYPE", "COUNT"]),
        |result, (tag, count)| result.row(vec![Cell::from(tag), Cell::from(count)]),
    )
}

/// `METRIC | VALUE` overview with six fixed rows.
#[must_use]
pub fn default_summary(records: &RecordSet) -> QueryResult {
    let stats = DurationStats::collect(records);
    let counts = ContinuityCounts::collect(records);

    let (average, min, max) = stats.map_or((Cell::Integer(0), 0, 0), |s| {
        (Cell::rounded(s.mean), s.min, s.max)
    });

    QueryResult::with_columns(&["METRIC", "VALUE"])
        .row(vec![Cell::from("Average Duration (days)"), average])
        .row(vec![Cell::from("Total Leaves"), Cell::from(records.len())])
        .row(vec![Cell::from("Continuous Leaves"), Cell::from(counts.continuous)])
        .row(vec![Cell::from("Intermittent Leaves"), Cell::from(counts.intermittent)])
        .row(vec![Cell::from("Min Duration (days)"), Cell::from(min)])
        .row(vec![Cell::from("Max Duration (days)"), Cell::from(max)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CaregiverType, LeaveType};

    fn record(
        leave: &str,
        ret: &str,
        continuous: bool,
        intermittent: bool,
        caregiver: Option<CaregiverType>,
    ) -> LeaveRecord {
        LeaveRecord {
            leave_id: format!("{leave}-{ret}"),
            employee_id: "1".to_string(),
            leave_type: LeaveType::Caregiver,
            expected_leave_date: Some(leave.to_string()),
            expected_return_date: Some(ret.to_string()),
            is_leave_continuous: continuous,
            is_leave_intermittent: intermittent,
            caregiver_type: caregiver,
        }
    }

    #[test]
    fn stats_skip_bad_and_reversed_records() {
        let records: RecordSet = vec![
            record("2024-01-01", "2024-01-11", false, false, None),
            record("2024-01-01", "2024-01-05", false, false, None),
            record("2024-01-10", "2024-01-01", false, false, None),
            record("2024-01-01", "2024-01-01", false, false, None),
            record("garbage", "2024-01-01", false, false, None),
        ]
        .into_iter()
        .collect();

        let stats = DurationStats::collect(&records).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, 4);
        assert_eq!(stats.max, 10);
        assert!((stats.mean - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_statistics_empty_when_nothing_contributes() {
        let records: RecordSet = vec![record("2024-01-10", "2024-01-01", true, false, None)]
            .into_iter()
            .collect();
        assert!(duration_statistics(&records).is_none());
    }

    #[test]
    fn continuity_flags_are_independent() {
        let records: RecordSet = vec![
            record("2024-01-01", "2024-01-02", true, true, None),
            record("2024-01-01", "2024-01-02", true, true, None),
            record("2024-01-01", "2024-01-02", true, true, None),
        ]
        .into_iter()
        .collect();

        let result = continuity_breakdown(&records);
        assert_eq!(result.rows, vec![vec![Cell::Integer(3), Cell::Integer(3), Cell::Integer(3)]]);
    }

    #[test]
    fn continuity_counts_neither_flag() {
        let records: RecordSet = vec![
            record("2024-01-01", "2024-01-02", false, false, None),
            record("2024-01-01", "2024-01-02", true, false, None),
        ]
        .into_iter()
        .collect();

        let result = continuity_breakdown(&records);
        assert_eq!(result.rows[0], vec![Cell::Integer(1), Cell::Integer(0), Cell::Integer(2)]);
    }

    #[test]
    fn caregiver_breakdown_uses_first_seen_order_and_unknown() {
        let records: RecordSet = vec![
            record("2024-01-01", "2024-01-02", false, false, Some(CaregiverType::Spouse)),
            record("2024-01-01", "2024-01-02", false, false, None),
            record("2024-01-01", "2024-01-02", false, false, Some(CaregiverType::Parent)),
            record("2024-01-01", "2024-01-02", false, false, Some(CaregiverType::Spouse)),
        ]
        .into_iter()
        .collect();

        let result = caregiver_type_breakdown(&records);
        assert_eq!(
            result.rows,
            vec![
                vec![Cell::from("SPOUSE"), Cell::Integer(2)],
                vec![Cell::from("UNKNOWN"), Cell::Integer(1)],
                vec![Cell::from("PARENT"), Cell::Integer(1)],
            ]
        );
    }

    #[test]
    fn default_summary_on_empty_set_uses_zeros() {
        let result = default_summary(&RecordSet::default());
        assert_eq!(result.rows.len(), 6);
        assert!(result.rows.iter().all(|row| row.len() == 2));
        assert_eq!(result.rows[0][1], Cell::Integer(0));
        assert_eq!(result.rows[4][1], Cell::Integer(0));
        assert_eq!(result.rows[5][1], Cell::Integer(0));
    }
}
