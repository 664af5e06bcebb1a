//! The leave-record dataset.
//!
//! The record set is loaded once at startup and then shared read-only by
//! every session. By default the reference dataset compiled into the binary
//! is used; a JSON file with the same shape can be supplied instead through
//! the configuration or the `--dataset` flag.

mod record;

pub use record::{parse_calendar_date, CaregiverType, LeaveRecord, LeaveType, DATE_FORMAT};

use std::path::Path;

use crate::error::DatasetError;

/// The reference dataset shipped with the server.
const EMBEDDED_DATASET: &str = include_str!("../../data/leave_records.json");

/// An ordered, immutable collection of leave records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<LeaveRecord>,
}

impl RecordSet {
    /// Creates a record set from already-built records.
    #[must_use]
    pub const fn new(records: Vec<LeaveRecord>) -> Self {
        Self { records }
    }

    /// Loads the reference dataset embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON is malformed.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_json(EMBEDDED_DATASET, "embedded dataset")
    }

    /// Loads a dataset from a JSON file containing an array of records.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DatasetError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&contents, &path.display().to_string())
    }

    /// Loads the dataset from `path` if given, otherwise the embedded one.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected dataset cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, DatasetError> {
        path.map_or_else(Self::embedded, Self::from_file)
    }

    fn from_json(json: &str, origin: &str) -> Result<Self, DatasetError> {
        let records: Vec<LeaveRecord> =
            serde_json::from_str(json).map_err(|e| DatasetError::ParseError {
                origin: origin.to_string(),
                source: e,
            })?;

        tracing::debug!(origin, count = records.len(), "Loaded leave records");

        Ok(Self::new(records))
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates the records in load order.
    pub fn iter(&self) -> std::slice::Iter<'_, LeaveRecord> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[LeaveRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a LeaveRecord;
    type IntoIter = std::slice::Iter<'a, LeaveRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<LeaveRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = LeaveRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
