//! Record repository for SQLite operations
//!
//! Records are append-only. `seq` is the insertion order every read uses.

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::core::constants::RECORD_QUERY_MAX;
use crate::data::sqlite::SqliteError;
use crate::data::types::{DataSourceRow, RecordData, SourceType, StoredRecord, merge_columns};

use super::data_source::{get_by_name_tx, insert_if_absent_tx, record_appended_tx};

type RecordTuple = (i64, String, String, String, i64);

fn into_record(t: RecordTuple) -> Result<StoredRecord, SqliteError> {
    let (seq, id, data_source, data, created_at) = t;
    Ok(StoredRecord {
        seq,
        id,
        data_source,
        data: serde_json::from_str(&data).map_err(|e| SqliteError::json("data", e))?,
        created_at,
    })
}

/// Insert one record row inside an open transaction
pub(super) async fn insert_record(
    tx: &mut Transaction<'_, Sqlite>,
    org_id: &str,
    data_source_id: &str,
    data_source: &str,
    data: &RecordData,
) -> Result<StoredRecord, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();
    let json = serde_json::to_string(data).map_err(|e| SqliteError::json("data", e))?;

    let result = sqlx::query(
        "INSERT INTO records (id, organization_id, data_source_id, data_source, data, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(org_id)
    .bind(data_source_id)
    .bind(data_source)
    .bind(&json)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(StoredRecord {
        seq: result.last_insert_rowid(),
        id,
        data_source: data_source.to_string(),
        data: data.clone(),
        created_at: now,
    })
}

/// Append a record, creating its data source on first use
///
/// The conditional insert takes the write lock first, so concurrent first
/// writes for the same name end up in one data source.
pub async fn append_record(
    pool: &SqlitePool,
    org_id: &str,
    data_source: &str,
    source_type: SourceType,
    data: &RecordData,
) -> Result<(DataSourceRow, StoredRecord), SqliteError> {
    let mut tx = pool.begin().await?;

    if insert_if_absent_tx(&mut tx, org_id, data_source, None, source_type).await? {
        tracing::debug!(org_id, data_source, "Created data source");
    }

    let mut source = get_by_name_tx(&mut tx, org_id, data_source)
        .await?
        .ok_or_else(|| SqliteError::Database(sqlx::Error::RowNotFound))?;

    merge_columns(&mut source.columns, data);
    record_appended_tx(&mut tx, &source.id, &source.columns, 1).await?;
    let record = insert_record(&mut tx, org_id, &source.id, data_source, data).await?;

    tx.commit().await?;

    source.record_count += 1;
    Ok((source, record))
}

/// Records of one data source in insertion order
pub async fn query_records(
    pool: &SqlitePool,
    org_id: &str,
    data_source: &str,
    limit: usize,
) -> Result<Vec<StoredRecord>, SqliteError> {
    let limit = limit.min(RECORD_QUERY_MAX) as i64;

    let rows = sqlx::query_as::<_, RecordTuple>(
        "SELECT seq, id, data_source, data, created_at FROM records WHERE organization_id = ? AND data_source = ? ORDER BY seq LIMIT ?",
    )
    .bind(org_id)
    .bind(data_source)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(into_record).collect()
}

/// Page through a data source's records, returning the page and the total count
pub async fn list_records(
    pool: &SqlitePool,
    org_id: &str,
    data_source_id: &str,
    page: u32,
    limit: u32,
) -> Result<(Vec<StoredRecord>, u64), SqliteError> {
    let offset = page.saturating_sub(1) as i64 * limit as i64;

    let rows = sqlx::query_as::<_, RecordTuple>(
        "SELECT seq, id, data_source, data, created_at FROM records WHERE organization_id = ? AND data_source_id = ? ORDER BY seq LIMIT ? OFFSET ?",
    )
    .bind(org_id)
    .bind(data_source_id)
    .bind(limit as i64)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM records WHERE organization_id = ? AND data_source_id = ?",
    )
    .bind(org_id)
    .bind(data_source_id)
    .fetch_one(pool)
    .await?;

    let records = rows
        .into_iter()
        .map(into_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((records, total.0 as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::FieldValue;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    fn record(pairs: &[(&str, FieldValue)]) -> RecordData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_append_creates_source_then_increments() {
        let pool = setup_test_pool().await;

        let (source, first) = append_record(
            &pool,
            "default",
            "events",
            SourceType::Api,
            &record(&[("kind", "click".into())]),
        )
        .await
        .unwrap();
        assert_eq!(source.record_count, 1);
        assert_eq!(source.source_type, SourceType::Api);
        assert_eq!(source.columns, vec!["kind"]);

        let (source2, second) = append_record(
            &pool,
            "default",
            "events",
            SourceType::Api,
            &record(&[("kind", "view".into()), ("ms", 12.into())]),
        )
        .await
        .unwrap();
        assert_eq!(source2.id, source.id);
        assert_eq!(source2.record_count, 2);
        assert_eq!(source2.columns, vec!["kind", "ms"]);
        assert!(second.seq > first.seq);
    }

    #[tokio::test]
    async fn test_query_records_in_insertion_order_with_limit() {
        let pool = setup_test_pool().await;
        for i in 0..5 {
            append_record(
                &pool,
                "default",
                "nums",
                SourceType::Api,
                &record(&[("i", i.into())]),
            )
            .await
            .unwrap();
        }

        let rows = query_records(&pool, "default", "nums", 3).await.unwrap();
        let values: Vec<_> = rows.iter().map(|r| r.data["i"].clone()).collect();
        assert_eq!(
            values,
            vec![FieldValue::from(0), FieldValue::from(1), FieldValue::from(2)]
        );
    }

    #[tokio::test]
    async fn test_query_records_scoped_by_org_and_source() {
        let pool = setup_test_pool().await;
        append_record(&pool, "default", "a", SourceType::Api, &record(&[("x", 1.into())]))
            .await
            .unwrap();

        assert!(query_records(&pool, "default", "b", 10).await.unwrap().is_empty());
        assert!(query_records(&pool, "other", "a", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_records_pagination() {
        let pool = setup_test_pool().await;
        let mut source_id = String::new();
        for i in 0..5 {
            let (source, _) = append_record(
                &pool,
                "default",
                "nums",
                SourceType::Api,
                &record(&[("i", i.into())]),
            )
            .await
            .unwrap();
            source_id = source.id;
        }

        let (page2, total) = list_records(&pool, "default", &source_id, 2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page2.len(), 2);
        assert_eq!(page2[0].data["i"], FieldValue::from(2));
    }
}
