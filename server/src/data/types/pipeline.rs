//! Aggregation stages and their results
//!
//! Stages are backend-neutral. The in-memory executor evaluates them one by
//! one; a record store may also translate a whole stage list into a native
//! query and return the final rows itself.

use serde::Serialize;

use super::charts::AggregateKind;
use super::records::{FieldValue, RecordData};

/// Reduction applied to the measure values of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    First,
}

impl From<AggregateKind> for Accumulator {
    fn from(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::Sum => Self::Sum,
            AggregateKind::Avg => Self::Avg,
            AggregateKind::Min => Self::Min,
            AggregateKind::Max => Self::Max,
            AggregateKind::Count => Self::Count,
            AggregateKind::None => Self::First,
        }
    }
}

/// One step of an aggregation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep records of one data source
    Match { data_source: String },
    /// Keep the first `n` rows
    Limit(usize),
    /// Drop store metadata, keeping only the record payload
    ProjectData,
    /// Group by a payload field and reduce a measure field
    Group {
        key_field: String,
        measure_field: String,
        accumulator: Accumulator,
    },
    /// Order grouped rows by value, largest first
    SortByValueDesc,
}

/// Row produced by a pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultRow {
    Grouped {
        #[serde(rename = "_id")]
        id: FieldValue,
        value: FieldValue,
    },
    Raw {
        data: RecordData,
    },
}

impl ResultRow {
    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped { .. })
    }
}
