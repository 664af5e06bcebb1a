//! Query classification and aggregation.
//!
//! There is no SQL parser here. A query string is lower-cased and checked
//! against an ordered list of keyword rules; the first rule whose predicate
//! matches decides which canned aggregation runs over the record set. When
//! nothing matches (or the matching aggregation has nothing to report) the
//! default summary is returned, so every query produces a table.
//!
//! | Rule | Keywords | Result columns |
//! |------|----------|----------------|
//! | duration statistics | `avg` and `datediff` | `AVG_DURATION_DAYS`, `TOTAL_LEAVES`, `MIN_DAYS`, `MAX_DAYS` |
//! | continuity breakdown | `continuous` or `intermittent` | `CONTINUOUS_LEAVES`, `INTERMITTENT_LEAVES`, `TOTAL` |
//! | caregiver breakdown | `caregiver_type` | `CAREGIVER_TYPE`, `COUNT` |
//! | default summary | anything else | `METRIC`, `VALUE` |

pub mod aggregate;
mod result;

pub use result::{round_one_place, Cell, QueryResult, CELL_DELIMITER, SEPARATOR_WIDTH};

use crate::dataset::RecordSet;

/// Which aggregation a query was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Mean/min/max of leave durations.
    DurationStatistics,
    /// Continuous vs intermittent counts.
    ContinuityBreakdown,
    /// Counts per caregiver type.
    CaregiverTypeBreakdown,
    /// Six-row overview.
    DefaultSummary,
}

/// A classification rule: a keyword predicate over the lower-cased query and
/// the aggregation it selects.
pub struct Rule {
    /// Aggregation selected by this rule.
    pub kind: QueryKind,
    /// Matches against the lower-cased query text.
    pub matches: fn(&str) -> bool,
    /// Computes the result; `None` means "nothing to report".
    pub aggregate: fn(&RecordSet) -> Option<QueryResult>,
}

/// The rules, in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        kind: QueryKind::DurationStatistics,
        matches: wants_duration_statistics,
        aggregate: aggregate::duration_statistics,
    },
    Rule {
        kind: QueryKind::ContinuityBreakdown,
        matches: wants_continuity_breakdown,
        aggregate: continuity_rule,
    },
    Rule {
        kind: QueryKind::CaregiverTypeBreakdown,
        matches: wants_caregiver_type_breakdown,
        aggregate: caregiver_type_rule,
    },
];

fn continuity_rule(records: &RecordSet) -> Option<QueryResult> {
    Some(aggregate::continuity_breakdown(records))
}

fn caregiver_type_rule(records: &RecordSet) -> Option<QueryResult> {
    Some(aggregate::caregiver_type_breakdown(records))
}

/// `avg` and `datediff` both present.
#[must_use]
pub fn wants_duration_statistics(query: &str) -> bool {
    query.contains("avg") && query.contains("datediff")
}

/// `continuous` or `intermittent` present.
#[must_use]
pub fn wants_continuity_breakdown(query: &str) -> bool {
    query.contains("continuous") || query.contains("intermittent")
}

/// `caregiver_type` present.
#[must_use]
pub fn wants_caregiver_type_breakdown(query: &str) -> bool {
    query.contains("caregiver_type")
}

/// Returns the aggregation the query's keywords select.
///
/// This only looks at the text; the duration rule can still fall back to the
/// default summary at run time if no record has a usable duration.
#[must_use]
pub fn classify(query: &str) -> QueryKind {
    let query = query.to_lowercase();
    RULES
        .iter()
        .find(|rule| (rule.matches)(&query))
        .map_or(QueryKind::DefaultSummary, |rule| rule.kind)
}

/// Classifies `query` and computes the matching aggregation over `records`.
///
/// Never fails: if the first matching rule has nothing to report, or no rule
/// matches, the default summary is returned.
#[must_use]
pub fn classify_and_aggregate(query: &str, records: &RecordSet) -> QueryResult {
    let lowered = query.to_lowercase();

    RULES
        .iter()
        .find(|rule| (rule.matches)(&lowered))
        .and_then(|rule| {
            let result = (rule.aggregate)(records);
            if result.is_none() {
                tracing::debug!(kind = ?rule.kind, "No data for query, using default summary");
            }
            result
        })
        .unwrap_or_else(|| aggregate::default_summary(records))
}
