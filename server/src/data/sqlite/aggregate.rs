//! Native evaluation of grouped chart pipelines
//!
//! The grouped pipeline shape
//! `Match, Limit, [ProjectData], Group, SortByValueDesc, Limit` is translated
//! into a single SQL statement over the JSON `data` column. Any other stage
//! list is left to the in-memory executor.
//!
//! Results match the in-memory evaluation: non-numeric measures count as 0,
//! a missing group key and an explicit null share one group, and ties keep
//! the order in which groups were first seen.

use sqlx::SqlitePool;

use crate::core::constants::RECORD_QUERY_MAX;
use crate::data::sqlite::SqliteError;
use crate::data::types::{Accumulator, FieldValue, ResultRow, Stage};

/// Grouped pipeline reduced to its parameters
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupPlan<'a> {
    pub data_source: &'a str,
    pub source_limit: usize,
    pub key_field: &'a str,
    pub measure_field: &'a str,
    pub accumulator: Accumulator,
    pub group_limit: usize,
}

/// Recognize the grouped pipeline shape
pub(crate) fn plan(stages: &[Stage]) -> Option<GroupPlan<'_>> {
    let stages: Vec<&Stage> = stages
        .iter()
        .filter(|s| !matches!(s, Stage::ProjectData))
        .collect();

    match stages.as_slice() {
        [
            Stage::Match { data_source },
            Stage::Limit(source_limit),
            Stage::Group {
                key_field,
                measure_field,
                accumulator,
            },
            Stage::SortByValueDesc,
            Stage::Limit(group_limit),
        ] => Some(GroupPlan {
            data_source,
            source_limit: *source_limit,
            key_field: key_field.as_str(),
            measure_field: measure_field.as_str(),
            accumulator: *accumulator,
            group_limit: *group_limit,
        }),
        _ => None,
    }
}

/// JSON path for a top-level field, e.g. `$."revenue"`
///
/// Field names containing a double quote cannot be addressed safely.
pub(crate) fn json_path(field: &str) -> Option<String> {
    if field.contains('"') {
        return None;
    }
    Some(format!("$.\"{}\"", field))
}

const SOURCE: &str = "(SELECT seq, data FROM records WHERE organization_id = ?3 AND data_source = ?4 ORDER BY seq LIMIT ?5)";
const GROUP_KEY: &str = "COALESCE(data -> ?1, 'null')";
// Reduced as REAL so integer totals past i64 do not raise SQLite's overflow error
const NUMERIC_MEASURE: &str = "CASE WHEN json_type(data, ?2) IN ('integer', 'real') THEN CAST(json_extract(data, ?2) AS REAL) ELSE 0.0 END";

fn numeric_sql(accumulator: Accumulator) -> Option<String> {
    let reduce = match accumulator {
        Accumulator::Sum => format!("TOTAL({})", NUMERIC_MEASURE),
        Accumulator::Avg => format!("AVG({})", NUMERIC_MEASURE),
        Accumulator::Min => format!("MIN({})", NUMERIC_MEASURE),
        Accumulator::Max => format!("MAX({})", NUMERIC_MEASURE),
        Accumulator::Count => "COUNT(*)".to_string(),
        Accumulator::First => return None,
    };
    Some(format!(
        "SELECT {key} AS grp, CAST({reduce} AS REAL) AS value FROM {src} GROUP BY grp ORDER BY value DESC, MIN(seq) ASC LIMIT ?6",
        key = GROUP_KEY,
        reduce = reduce,
        src = SOURCE,
    ))
}

// Bare columns next to MIN(seq) come from the group's first record
fn first_value_sql() -> String {
    format!(
        "SELECT {key} AS grp, COALESCE(data -> ?2, 'null') AS value, {num} AS sort_value, MIN(seq) AS first_seq FROM {src} GROUP BY grp ORDER BY sort_value DESC, first_seq ASC LIMIT ?6",
        key = GROUP_KEY,
        num = NUMERIC_MEASURE,
        src = SOURCE,
    )
}

fn parse_json_value(text: &str) -> Result<FieldValue, SqliteError> {
    serde_json::from_str(text).map_err(|e| SqliteError::json("data", e))
}

/// Run a grouped pipeline in SQLite
///
/// Returns `Ok(None)` when the stage list is not a grouped pipeline.
pub async fn aggregate(
    pool: &SqlitePool,
    org_id: &str,
    stages: &[Stage],
) -> Result<Option<Vec<ResultRow>>, SqliteError> {
    let Some(plan) = plan(stages) else {
        return Ok(None);
    };
    let (Some(key_path), Some(measure_path)) =
        (json_path(plan.key_field), json_path(plan.measure_field))
    else {
        return Ok(None);
    };

    let source_limit = plan.source_limit.min(RECORD_QUERY_MAX) as i64;
    let group_limit = plan.group_limit as i64;

    let rows = match numeric_sql(plan.accumulator) {
        Some(sql) => {
            let rows = sqlx::query_as::<_, (String, f64)>(&sql)
                .bind(&key_path)
                .bind(&measure_path)
                .bind(org_id)
                .bind(plan.data_source)
                .bind(source_limit)
                .bind(group_limit)
                .fetch_all(pool)
                .await?;

            rows.into_iter()
                .map(|(grp, value)| {
                    Ok(ResultRow::Grouped {
                        id: parse_json_value(&grp)?,
                        value: FieldValue::from_f64(value),
                    })
                })
                .collect::<Result<Vec<_>, SqliteError>>()?
        }
        None => {
            let rows = sqlx::query_as::<_, (String, String, f64, i64)>(&first_value_sql())
                .bind(&key_path)
                .bind(&measure_path)
                .bind(org_id)
                .bind(plan.data_source)
                .bind(source_limit)
                .bind(group_limit)
                .fetch_all(pool)
                .await?;

            rows.into_iter()
                .map(|(grp, value, _, _)| {
                    Ok(ResultRow::Grouped {
                        id: parse_json_value(&grp)?,
                        value: parse_json_value(&value)?,
                    })
                })
                .collect::<Result<Vec<_>, SqliteError>>()?
        }
    };

    tracing::trace!(
        org_id,
        data_source = plan.data_source,
        accumulator = ?plan.accumulator,
        groups = rows.len(),
        "Grouped pipeline evaluated in SQLite"
    );
    Ok(Some(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::record::append_record;
    use crate::data::types::{RecordData, SourceType};

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    async fn seed(pool: &SqlitePool, rows: &[&str]) {
        for json in rows {
            let data: RecordData = serde_json::from_str(json).unwrap();
            append_record(pool, "default", "people", SourceType::Api, &data)
                .await
                .unwrap();
        }
    }

    fn grouped(accumulator: Accumulator) -> Vec<Stage> {
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

    #[test]
    fn test_plan_recognizes_grouped_shape() {
        let stages = grouped(Accumulator::Sum);
        let plan = plan(&stages).unwrap();
        assert_eq!(plan.data_source, "people");
        assert_eq!(plan.source_limit, 1000);
        assert_eq!(plan.group_limit, 20);
        assert_eq!(plan.accumulator, Accumulator::Sum);
    }

    #[test]
    fn test_plan_rejects_raw_shape() {
        let stages = vec![
            Stage::Match {
                data_source: "people".to_string(),
            },
            Stage::Limit(1000),
            Stage::ProjectData,
            Stage::Limit(100),
        ];
        assert!(plan(&stages).is_none());
    }

    #[test]
    fn test_json_path() {
        assert_eq!(json_path("dept").unwrap(), "$.\"dept\"");
        assert_eq!(json_path("a.b").unwrap(), "$.\"a.b\"");
        assert!(json_path("a\"b").is_none());
    }

    #[tokio::test]
    async fn test_sum_groups_sorted_desc() {
        let pool = setup_test_pool().await;
        seed(
            &pool,
            &[
                r#"{"dept": "A", "count": 5}"#,
                r#"{"dept": "B", "count": 3}"#,
                r#"{"dept": "A", "count": 2}"#,
                r#"{"dept": "C", "count": "n/a"}"#,
            ],
        )
        .await;

        let rows = aggregate(&pool, "default", &grouped(Accumulator::Sum))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("A"), FieldValue::from(7)),
                (FieldValue::from("B"), FieldValue::from(3)),
                (FieldValue::from("C"), FieldValue::from(0)),
            ]
        );
    }

    #[tokio::test]
    async fn test_sum_past_i64_does_not_overflow() {
        let pool = setup_test_pool().await;
        seed(
            &pool,
            &[
                r#"{"dept": "A", "count": 9223372036854775807}"#,
                r#"{"dept": "B", "count": 1}"#,
                r#"{"dept": "A", "count": 9223372036854775807}"#,
            ],
        )
        .await;

        let rows = aggregate(&pool, "default", &grouped(Accumulator::Sum))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("A"), FieldValue::from_f64(2f64.powi(64))),
                (FieldValue::from("B"), FieldValue::from(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_count_ignores_measure() {
        let pool = setup_test_pool().await;
        seed(
            &pool,
            &[
                r#"{"dept": "A"}"#,
                r#"{"dept": "A", "count": "x"}"#,
                r#"{"dept": "B", "count": 100}"#,
            ],
        )
        .await;

        let rows = aggregate(&pool, "default", &grouped(Accumulator::Count))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("A"), FieldValue::from(2)),
                (FieldValue::from("B"), FieldValue::from(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_value_per_group() {
        let pool = setup_test_pool().await;
        seed(
            &pool,
            &[
                r#"{"dept": "A", "count": "first"}"#,
                r#"{"dept": "B", "count": 9}"#,
                r#"{"dept": "A", "count": 50}"#,
            ],
        )
        .await;

        let rows = aggregate(&pool, "default", &grouped(Accumulator::First))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("B"), FieldValue::from(9)),
                (FieldValue::from("A"), FieldValue::from("first")),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_and_null_keys_share_group() {
        let pool = setup_test_pool().await;
        seed(
            &pool,
            &[
                r#"{"count": 1}"#,
                r#"{"dept": null, "count": 2}"#,
                r#"{"dept": 1, "count": 4}"#,
                r#"{"dept": "1", "count": 8}"#,
            ],
        )
        .await;

        let rows = aggregate(&pool, "default", &grouped(Accumulator::Sum))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            pairs(rows),
            vec![
                (FieldValue::from("1"), FieldValue::from(8)),
                (FieldValue::from(1), FieldValue::from(4)),
                (FieldValue::Null, FieldValue::from(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_ties_keep_first_seen_order() {
        let pool = setup_test_pool().await;
        seed(
            &pool,
            &[
                r#"{"dept": "Z", "count": 1}"#,
                r#"{"dept": "A", "count": 1}"#,
                r#"{"dept": "M", "count": 1}"#,
            ],
        )
        .await;

        let rows = aggregate(&pool, "default", &grouped(Accumulator::Max))
            .await
            .unwrap()
            .unwrap();
        let labels: Vec<_> = pairs(rows).into_iter().map(|(id, _)| id.as_label()).collect();
        assert_eq!(labels, vec!["Z", "A", "M"]);
    }

    #[tokio::test]
    async fn test_empty_source_returns_no_rows() {
        let pool = setup_test_pool().await;
        let rows = aggregate(&pool, "default", &grouped(Accumulator::Avg))
            .await
            .unwrap()
            .unwrap();
        assert!(rows.is_empty());
    }
}
