//! Aggregation executor
//!
//! Runs a stage list against a [`RecordStore`]. When server-side aggregation
//! is enabled the store may evaluate the whole list natively; otherwise the
//! leading `Match` (and a directly following `Limit`) become the store query
//! and the remaining stages run in memory, strictly in order.
//!
//! Measure coercion is strict here: only numbers count, anything else is 0.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::constants::RECORD_QUERY_MAX;
use crate::data::DataError;
use crate::data::traits::RecordStore;
use crate::data::types::{Accumulator, FieldValue, RecordData, ResultRow, Stage};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline must start with a match stage")]
    MissingMatch,

    #[error("Stage {0} cannot follow a group stage")]
    AfterGroup(&'static str),

    #[error("Record store error: {0}")]
    Store(#[from] DataError),
}

/// Row flowing between in-memory stages
#[derive(Debug, Clone)]
enum Row {
    Record(RecordData),
    Grouped { id: FieldValue, value: FieldValue },
}

impl Row {
    fn sort_key(&self) -> f64 {
        match self {
            Self::Grouped { value, .. } => value.numeric().unwrap_or(0.0),
            Self::Record(_) => 0.0,
        }
    }
}

impl From<Row> for ResultRow {
    fn from(row: Row) -> Self {
        match row {
            Row::Record(data) => ResultRow::Raw { data },
            Row::Grouped { id, value } => ResultRow::Grouped { id, value },
        }
    }
}

/// Running reduction state of one group
#[derive(Debug)]
struct GroupState {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    first: FieldValue,
}

impl GroupState {
    fn new(first: FieldValue) -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            first,
        }
    }

    fn push(&mut self, measure: f64) {
        self.count += 1;
        self.sum += measure;
        self.min = self.min.min(measure);
        self.max = self.max.max(measure);
    }

    fn finish(self, accumulator: Accumulator) -> FieldValue {
        match accumulator {
            Accumulator::Sum => FieldValue::from_f64(self.sum),
            Accumulator::Avg => FieldValue::from_f64(self.sum / self.count as f64),
            Accumulator::Min => FieldValue::from_f64(self.min),
            Accumulator::Max => FieldValue::from_f64(self.max),
            Accumulator::Count => FieldValue::from(self.count as i64),
            Accumulator::First => self.first,
        }
    }
}

fn group(
    rows: Vec<Row>,
    key_field: &str,
    measure_field: &str,
    accumulator: Accumulator,
) -> Result<Vec<Row>, PipelineError> {
    let mut groups: IndexMap<FieldValue, GroupState> = IndexMap::new();

    for row in rows {
        let Row::Record(data) = row else {
            return Err(PipelineError::AfterGroup("group"));
        };
        let measure = FieldValue::field(&data, measure_field);
        let numeric = measure.numeric().unwrap_or(0.0);
        groups
            .entry(FieldValue::field(&data, key_field))
            .or_insert_with(|| GroupState::new(measure))
            .push(numeric);
    }

    Ok(groups
        .into_iter()
        .map(|(id, state)| Row::Grouped {
            id,
            value: state.finish(accumulator),
        })
        .collect())
}

fn apply(stage: &Stage, mut rows: Vec<Row>) -> Result<Vec<Row>, PipelineError> {
    match stage {
        // Only the first stage may select a data source; rows are already scoped
        Stage::Match { .. } => Ok(rows),
        Stage::Limit(n) => {
            rows.truncate(*n);
            Ok(rows)
        }
        Stage::ProjectData => {
            if rows.iter().any(|r| matches!(r, Row::Grouped { .. })) {
                return Err(PipelineError::AfterGroup("project"));
            }
            Ok(rows)
        }
        Stage::Group {
            key_field,
            measure_field,
            accumulator,
        } => group(rows, key_field, measure_field, *accumulator),
        Stage::SortByValueDesc => {
            rows.sort_by(|a, b| {
                b.sort_key()
                    .partial_cmp(&a.sort_key())
                    .unwrap_or(Ordering::Equal)
            });
            Ok(rows)
        }
    }
}

/// Evaluates chart pipelines for one record store
pub struct AggregationExecutor {
    store: Arc<dyn RecordStore>,
    server_side_aggregation: bool,
}

impl AggregationExecutor {
    pub fn new(store: Arc<dyn RecordStore>, server_side_aggregation: bool) -> Self {
        Self {
            store,
            server_side_aggregation,
        }
    }

    /// Run a stage list for an organization
    ///
    /// Zero matching records yield an empty result, never an error.
    pub async fn run(
        &self,
        org_id: &str,
        stages: &[Stage],
    ) -> Result<Vec<ResultRow>, PipelineError> {
        let Some((Stage::Match { data_source }, rest)) = stages.split_first() else {
            return Err(PipelineError::MissingMatch);
        };

        if self.server_side_aggregation
            && let Some(rows) = self.store.aggregate(org_id, stages).await?
        {
            tracing::debug!(org_id, data_source, rows = rows.len(), "Pipeline run by store");
            return Ok(rows);
        }

        let (limit, rest) = match rest.split_first() {
            Some((Stage::Limit(n), rest)) => (*n, rest),
            _ => (RECORD_QUERY_MAX, rest),
        };

        let records = self.store.query_records(org_id, data_source, limit).await?;
        let mut rows: Vec<Row> = records.into_iter().map(|r| Row::Record(r.data)).collect();

        for stage in rest {
            rows = apply(stage, rows)?;
        }

        tracing::debug!(org_id, data_source, rows = rows.len(), "Pipeline run in memory");
        Ok(rows.into_iter().map(ResultRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::data::types::StoredRecord;

    /// Record store backed by a vector of `(org_id, record)` pairs
    struct VecStore {
        records: Vec<(String, StoredRecord)>,
        native: Option<Vec<ResultRow>>,
    }

    impl VecStore {
        fn new(org_id: &str, data_source: &str, rows: &[&str]) -> Self {
            let records = rows
                .iter()
                .enumerate()
                .map(|(i, json)| {
                    (
                        org_id.to_string(),
                        StoredRecord {
                            seq: i as i64 + 1,
                            id: format!("r{}", i),
                            data_source: data_source.to_string(),
                            data: serde_json::from_str(json).unwrap(),
                            created_at: 0,
                        },
                    )
                })
                .collect();
            Self {
                records,
                native: None,
            }
        }

        fn with_native(mut self, rows: Vec<ResultRow>) -> Self {
            self.native = Some(rows);
            self
        }
    }

    #[async_trait]
    impl RecordStore for VecStore {
        async fn query_records(
            &self,
            org_id: &str,
            data_source: &str,
            limit: usize,
        ) -> Result<Vec<StoredRecord>, DataError> {
            Ok(self
                .records
                .iter()
                .filter(|(org, r)| org == org_id && r.data_source == data_source)
                .take(limit)
                .map(|(_, r)| r.clone())
                .collect())
        }

        async fn aggregate(
            &self,
            _org_id: &str,
            _stages: &[Stage],
        ) -> Result<Option<Vec<ResultRow>>, DataError> {
            Ok(self.native.clone())
        }
    }

    fn executor(store: VecStore) -> AggregationExecutor {
        AggregationExecutor::new(Arc::new(store), false)
    }

    fn grouped_stages(accumulator: Accumulator) -> Vec<Stage> {
        vec![
            Stage::Match {
                data_source: "people".to_string(),
            },
            Stage::Limit(1000),
            Stage::ProjectData,
            Stage::Group {
                key_field: "dept".to_string(),
                measure_field: "count".to_string(),
                accumulator,
            },
            Stage::SortByValueDesc,
            Stage::Limit(20),
        ]
    }

    fn pairs(rows: Vec<ResultRow>) -> Vec<(FieldValue, FieldValue)> {
        rows.into_iter()
            .map(|r| match r {
                ResultRow::Grouped { id, value } => (id, value),
                ResultRow::Raw { .. } => panic!("expected grouped row"),
            })
            .collect()
    }

    const PEOPLE: &[&str] = &[
        r#"{"dept": "A", "count": 5}"#,
        r#"{"dept": "B", "count": 3}"#,
        r#"{"dept": "A", "count": 2}"#,
    ];

    #[tokio::test]
    async fn test_sum_groups_and_sorts() {
        let rows = executor(VecStore::new("org", "people", PEOPLE))
            .run("org", &grouped_stages(Accumulator::Sum))
            .await
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("A"), FieldValue::from(7)),
                (FieldValue::from("B"), FieldValue::from(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_avg_min_max() {
        let exec = executor(VecStore::new("org", "people", PEOPLE));

        let avg = pairs(exec.run("org", &grouped_stages(Accumulator::Avg)).await.unwrap());
        assert_eq!(avg[0], (FieldValue::from("A"), FieldValue::from(3.5)));

        let min = pairs(exec.run("org", &grouped_stages(Accumulator::Min)).await.unwrap());
        assert_eq!(min[0], (FieldValue::from("B"), FieldValue::from(3)));
        assert_eq!(min[1], (FieldValue::from("A"), FieldValue::from(2)));

        let max = pairs(exec.run("org", &grouped_stages(Accumulator::Max)).await.unwrap());
        assert_eq!(max[0], (FieldValue::from("A"), FieldValue::from(5)));
    }

    #[tokio::test]
    async fn test_count_ignores_measure() {
        let store = VecStore::new(
            "org",
            "people",
            &[
                r#"{"dept": "A"}"#,
                r#"{"dept": "A", "count": "many"}"#,
                r#"{"dept": "A", "count": null}"#,
                r#"{"dept": "B", "count": 1000}"#,
            ],
        );
        let rows = executor(store)
            .run("org", &grouped_stages(Accumulator::Count))
            .await
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("A"), FieldValue::from(3)),
                (FieldValue::from("B"), FieldValue::from(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_value_in_store_order() {
        let store = VecStore::new(
            "org",
            "people",
            &[
                r#"{"dept": "A", "count": 1}"#,
                r#"{"dept": "A", "count": 99}"#,
                r#"{"dept": "B"}"#,
            ],
        );
        let rows = executor(store)
            .run("org", &grouped_stages(Accumulator::First))
            .await
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("A"), FieldValue::from(1)),
                (FieldValue::from("B"), FieldValue::Null),
            ]
        );
    }

    #[tokio::test]
    async fn test_non_numeric_measure_counts_as_zero() {
        let store = VecStore::new(
            "org",
            "people",
            &[
                r#"{"dept": "A", "count": "12"}"#,
                r#"{"dept": "A", "count": 4}"#,
                r#"{"dept": "B", "count": true}"#,
            ],
        );
        let exec = executor(store);

        let sum = pairs(exec.run("org", &grouped_stages(Accumulator::Sum)).await.unwrap());
        assert_eq!(sum[0], (FieldValue::from("A"), FieldValue::from(4)));
        assert_eq!(sum[1], (FieldValue::from("B"), FieldValue::from(0)));

        let avg = pairs(exec.run("org", &grouped_stages(Accumulator::Avg)).await.unwrap());
        assert_eq!(avg[0], (FieldValue::from("A"), FieldValue::from(2)));
    }

    #[tokio::test]
    async fn test_group_keys_by_value_identity() {
        let store = VecStore::new(
            "org",
            "people",
            &[
                r#"{"dept": 1, "count": 1}"#,
                r#"{"dept": "1", "count": 1}"#,
                r#"{"count": 1}"#,
                r#"{"dept": null, "count": 1}"#,
            ],
        );
        let rows = executor(store)
            .run("org", &grouped_stages(Accumulator::Count))
            .await
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::Null, FieldValue::from(2)),
                (FieldValue::from(1), FieldValue::from(1)),
                (FieldValue::from("1"), FieldValue::from(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_group_limit_and_stable_ties() {
        let rows: Vec<String> = (0..30)
            .map(|i| format!(r#"{{"dept": "d{}", "count": 1}}"#, i))
            .collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

        let result = executor(VecStore::new("org", "people", &refs))
            .run("org", &grouped_stages(Accumulator::Sum))
            .await
            .unwrap();

        let labels: Vec<String> = pairs(result).into_iter().map(|(id, _)| id.as_label()).collect();
        assert_eq!(labels.len(), 20);
        assert_eq!(labels[0], "d0");
        assert_eq!(labels[19], "d19");
    }

    #[tokio::test]
    async fn test_source_limit_applies_before_grouping() {
        let store = VecStore::new(
            "org",
            "people",
            &[
                r#"{"dept": "A", "count": 1}"#,
                r#"{"dept": "B", "count": 1}"#,
                r#"{"dept": "C", "count": 100}"#,
            ],
        );
        let mut stages = grouped_stages(Accumulator::Sum);
        stages[1] = Stage::Limit(2);

        let rows = executor(store).run("org", &stages).await.unwrap();
        let labels: Vec<String> = pairs(rows).into_iter().map(|(id, _)| id.as_label()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_raw_pass_through() {
        let stages = vec![
            Stage::Match {
                data_source: "people".to_string(),
            },
            Stage::Limit(1000),
            Stage::ProjectData,
            Stage::Limit(2),
        ];
        let rows = executor(VecStore::new("org", "people", PEOPLE))
            .run("org", &stages)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.is_grouped()));
    }

    #[tokio::test]
    async fn test_empty_source_returns_empty() {
        let rows = executor(VecStore::new("org", "people", &[]))
            .run("org", &grouped_stages(Accumulator::Sum))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_scoped_by_org() {
        let rows = executor(VecStore::new("org", "people", PEOPLE))
            .run("other", &grouped_stages(Accumulator::Sum))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_missing_match_is_error() {
        let err = executor(VecStore::new("org", "people", PEOPLE))
            .run("org", &[Stage::Limit(10)])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingMatch));
    }

    #[tokio::test]
    async fn test_group_after_group_is_error() {
        let mut stages = grouped_stages(Accumulator::Sum);
        stages.push(stages[3].clone());
        let err = executor(VecStore::new("org", "people", PEOPLE))
            .run("org", &stages)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AfterGroup("group")));
    }

    #[tokio::test]
    async fn test_native_rows_used_when_enabled() {
        let native = vec![ResultRow::Grouped {
            id: FieldValue::from("native"),
            value: FieldValue::from(1),
        }];

        let store = VecStore::new("org", "people", PEOPLE).with_native(native.clone());
        let rows = AggregationExecutor::new(Arc::new(store), true)
            .run("org", &grouped_stages(Accumulator::Sum))
            .await
            .unwrap();
        assert_eq!(rows, native);

        let store = VecStore::new("org", "people", PEOPLE).with_native(native);
        let rows = AggregationExecutor::new(Arc::new(store), false)
            .run("org", &grouped_stages(Accumulator::Sum))
            .await
            .unwrap();
        assert_eq!(pairs(rows)[0].0, FieldValue::from("A"));
    }
}
