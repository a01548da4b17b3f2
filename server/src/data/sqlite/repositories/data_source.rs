//! Data source repository for SQLite operations

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::data::sqlite::SqliteError;
use crate::data::types::{DataSourceRow, RecordData, SourceType, merge_columns};

use super::record::insert_record;

const SELECT_COLUMNS: &str = "SELECT id, organization_id, name, description, source_type, columns, record_count, created_at, updated_at FROM data_sources";

type DataSourceTuple = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    i64,
    i64,
    i64,
);

fn into_row(t: DataSourceTuple) -> Result<DataSourceRow, SqliteError> {
    let (id, organization_id, name, description, source_type, columns, record_count, created_at, updated_at) =
        t;
    Ok(DataSourceRow {
        id,
        organization_id,
        name,
        description,
        source_type: SourceType::parse(&source_type).unwrap_or_default(),
        columns: serde_json::from_str(&columns).map_err(|e| SqliteError::json("columns", e))?,
        record_count,
        created_at,
        updated_at,
    })
}

/// List an organization's data sources, newest first
pub async fn list_for_org(
    pool: &SqlitePool,
    org_id: &str,
) -> Result<Vec<DataSourceRow>, SqliteError> {
    let rows = sqlx::query_as::<_, DataSourceTuple>(&format!(
        "{} WHERE organization_id = ? ORDER BY created_at DESC, name ASC",
        SELECT_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(into_row).collect()
}

/// Get a data source by ID, scoped to its organization
pub async fn get_data_source(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
) -> Result<Option<DataSourceRow>, SqliteError> {
    let row = sqlx::query_as::<_, DataSourceTuple>(&format!(
        "{} WHERE organization_id = ? AND id = ?",
        SELECT_COLUMNS
    ))
    .bind(org_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(into_row).transpose()
}

/// Get a data source by name inside an open transaction
pub(super) async fn get_by_name_tx(
    tx: &mut Transaction<'_, Sqlite>,
    org_id: &str,
    name: &str,
) -> Result<Option<DataSourceRow>, SqliteError> {
    let row = sqlx::query_as::<_, DataSourceTuple>(&format!(
        "{} WHERE organization_id = ? AND name = ?",
        SELECT_COLUMNS
    ))
    .bind(org_id)
    .bind(name)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(into_row).transpose()
}

/// Insert an empty data source unless the name is taken; returns whether it was created
pub(super) async fn insert_if_absent_tx(
    tx: &mut Transaction<'_, Sqlite>,
    org_id: &str,
    name: &str,
    description: Option<&str>,
    source_type: SourceType,
) -> Result<bool, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        r#"INSERT INTO data_sources (id, organization_id, name, description, source_type, columns, record_count, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, '[]', 0, ?, ?)
           ON CONFLICT(organization_id, name) DO NOTHING"#,
    )
    .bind(cuid2::create_id())
    .bind(org_id)
    .bind(name)
    .bind(description)
    .bind(source_type.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store merged columns and bump the record count
pub(super) async fn record_appended_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    columns: &[String],
    added: i64,
) -> Result<(), SqliteError> {
    let columns = serde_json::to_string(columns).map_err(|e| SqliteError::json("columns", e))?;
    sqlx::query(
        "UPDATE data_sources SET columns = ?, record_count = record_count + ?, updated_at = ? WHERE id = ?",
    )
    .bind(columns)
    .bind(added)
    .bind(chrono::Utc::now().timestamp())
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Create a data source together with its records
///
/// Returns `None` if a source with this name already exists; nothing is written.
pub async fn create_with_records(
    pool: &SqlitePool,
    org_id: &str,
    name: &str,
    description: Option<&str>,
    source_type: SourceType,
    records: &[RecordData],
) -> Result<Option<DataSourceRow>, SqliteError> {
    let mut tx = pool.begin().await?;

    if !insert_if_absent_tx(&mut tx, org_id, name, description, source_type).await? {
        tx.rollback().await?;
        return Ok(None);
    }

    let source = get_by_name_tx(&mut tx, org_id, name)
        .await?
        .ok_or_else(|| SqliteError::Database(sqlx::Error::RowNotFound))?;

    let mut columns = Vec::new();
    for data in records {
        merge_columns(&mut columns, data);
        insert_record(&mut tx, org_id, &source.id, name, data).await?;
    }
    record_appended_tx(&mut tx, &source.id, &columns, records.len() as i64).await?;

    let created = get_by_name_tx(&mut tx, org_id, name)
        .await?
        .ok_or_else(|| SqliteError::Database(sqlx::Error::RowNotFound))?;
    tx.commit().await?;

    Ok(Some(created))
}

/// Delete a data source; its records go with it through the FK cascade
pub async fn delete_data_source(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM data_sources WHERE organization_id = ? AND id = ?")
        .bind(org_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
