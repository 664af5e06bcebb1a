//! Tabular query results and their text rendering.

use std::fmt;

use serde::Serialize;

/// Width of the separator line between the header and the rows.
pub const SEPARATOR_WIDTH: usize = 50;

/// Delimiter placed between cells.
pub const CELL_DELIMITER: &str = " | ";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Free text.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Decimal already rounded for display.
    Decimal(f64),
}

impl Cell {
    /// Builds a decimal cell rounded to one place (ties to even).
    #[must_use]
    pub fn rounded(value: f64) -> Self {
        Self::Decimal(round_one_place(value))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(n) => write!(f, "{n}"),
            // Always show a fractional digit so 120.0 reads as a decimal
            Self::Decimal(x) if x.fract() == 0.0 => write!(f, "{x:.1}"),
            Self::Decimal(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Rounds to one decimal place, ties to even.
#[must_use]
pub fn round_one_place(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// Columns plus rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Rows; each has one cell per column.
    pub rows: Vec<Vec<Cell>>,
}

impl QueryResult {
    /// Creates an empty result with the given columns.
    #[must_use]
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// # Panics
    ///
    /// Debug builds assert that the row arity matches the column count.
    #[must_use]
    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(
            cells.len(),
            self.columns.len(),
            "row arity must match column count"
        );
        self.rows.push(cells);
        self
    }

    /// Renders the result as a pipe-delimited text table.
    ///
    /// The header line is followed by a line of dashes and then one line per
    /// row. There is no trailing newline.
    #[must_use]
    pub fn to_text_table(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(self.columns.join(CELL_DELIMITER));
        lines.push("-".repeat(SEPARATOR_WIDTH));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            lines.push(cells.join(CELL_DELIMITER));
        }
        lines.join("\n")
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text_table())
    }
}
