//! Organization repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::sqlite::error::is_unique_violation;
use crate::data::types::OrganizationRow;

/// Create a new organization with a generated CUID2 ID
pub async fn create_organization(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
) -> Result<OrganizationRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO organizations (id, name, slug, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(slug)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            SqliteError::Conflict(format!("Organization slug '{}' already exists", slug))
        } else {
            e.into()
        }
    })?;

    Ok(OrganizationRow {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        created_at: now,
        updated_at: now,
    })
}

/// Get an organization by ID
pub async fn get_organization(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<OrganizationRow>, SqliteError> {
    let row = sqlx::query_as::<_, (String, String, String, i64, i64)>(
        "SELECT id, name, slug, created_at, updated_at FROM organizations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, name, slug, created_at, updated_at)| OrganizationRow {
        id,
        name,
        slug,
        created_at,
        updated_at,
    }))
}
