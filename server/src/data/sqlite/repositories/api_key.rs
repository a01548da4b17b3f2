//! API key repository for SQLite operations

use sqlx::SqlitePool;

use crate::core::constants::API_KEY_MAX_PER_ORG;
use crate::data::sqlite::SqliteError;
use crate::data::sqlite::error::is_unique_violation;
use crate::data::types::{ApiKeyRow, ApiKeyValidation};

/// Create a new API key
pub async fn create_api_key(
    pool: &SqlitePool,
    org_id: &str,
    name: &str,
    key_hash: &str,
    key_prefix: &str,
    expires_at: Option<i64>,
) -> Result<ApiKeyRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();
    let mut tx = pool.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys WHERE organization_id = ?")
        .bind(org_id)
        .fetch_one(&mut *tx)
        .await?;
    if existing >= API_KEY_MAX_PER_ORG as i64 {
        return Err(SqliteError::Conflict(format!(
            "Maximum {} API keys per organization",
            API_KEY_MAX_PER_ORG
        )));
    }

    sqlx::query(
        "INSERT INTO api_keys (id, organization_id, name, key_hash, key_prefix, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(org_id)
    .bind(name)
    .bind(key_hash)
    .bind(key_prefix)
    .bind(expires_at)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            SqliteError::Conflict("API key already exists".to_string())
        } else {
            e.into()
        }
    })?;

    tx.commit().await?;

    Ok(ApiKeyRow {
        id,
        organization_id: org_id.to_string(),
        name: name.to_string(),
        key_prefix: key_prefix.to_string(),
        last_used_at: None,
        expires_at,
        created_at: now,
    })
}

/// Get API key validation info by hash
pub async fn get_by_hash(
    pool: &SqlitePool,
    key_hash: &str,
) -> Result<Option<ApiKeyValidation>, SqliteError> {
    let row = sqlx::query_as::<_, (String, String, Option<i64>, Option<i64>)>(
        "SELECT id, organization_id, last_used_at, expires_at FROM api_keys WHERE key_hash = ?",
    )
    .bind(key_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(key_id, organization_id, last_used_at, expires_at)| ApiKeyValidation {
            key_id,
            organization_id,
            last_used_at,
            expires_at,
        },
    ))
}

/// List an organization's keys, newest first
pub async fn list_for_org(pool: &SqlitePool, org_id: &str) -> Result<Vec<ApiKeyRow>, SqliteError> {
    let rows = sqlx::query_as::<_, (String, String, String, String, Option<i64>, Option<i64>, i64)>(
        "SELECT id, organization_id, name, key_prefix, last_used_at, expires_at, created_at FROM api_keys WHERE organization_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, organization_id, name, key_prefix, last_used_at, expires_at, created_at)| {
                ApiKeyRow {
                    id,
                    organization_id,
                    name,
                    key_prefix,
                    last_used_at,
                    expires_at,
                    created_at,
                }
            },
        )
        .collect())
}

/// Delete (revoke) a key
pub async fn delete_api_key(pool: &SqlitePool, org_id: &str, id: &str) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM api_keys WHERE organization_id = ? AND id = ?")
        .bind(org_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Update last_used_at for a key
pub async fn touch_api_key(pool: &SqlitePool, id: &str) -> Result<(), SqliteError> {
    sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().timestamp())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        sqlx::query(crate::data::sqlite::schema::SCHEMA)
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_resolve_key() {
        let pool = setup_test_pool().await;
        let key = create_api_key(&pool, "default", "ci", "hash-1", "pb-abcdefg", None)
            .await
            .unwrap();
        assert_eq!(key.organization_id, "default");
        assert!(key.last_used_at.is_none());

        let validation = get_by_hash(&pool, "hash-1").await.unwrap().unwrap();
        assert_eq!(validation.key_id, key.id);
        assert_eq!(validation.organization_id, "default");
        assert!(validation.expires_at.is_none());

        assert!(get_by_hash(&pool, "hash-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expiry_is_stored() {
        let pool = setup_test_pool().await;
        create_api_key(&pool, "default", "ci", "hash-1", "pb-abcdefg", Some(1_000))
            .await
            .unwrap();

        let validation = get_by_hash(&pool, "hash-1").await.unwrap().unwrap();
        assert_eq!(validation.expires_at, Some(1_000));
        assert!(validation.is_expired(1_001));
    }

    #[tokio::test]
    async fn test_list_and_delete_scoped_to_org() {
        let pool = setup_test_pool().await;
        sqlx::query(
            "INSERT INTO organizations (id, name, slug, created_at, updated_at) VALUES ('acme', 'Acme', 'acme', 0, 0)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let first = create_api_key(&pool, "default", "one", "hash-1", "pb-1", None)
            .await
            .unwrap();
        create_api_key(&pool, "default", "two", "hash-2", "pb-2", None)
            .await
            .unwrap();
        create_api_key(&pool, "acme", "other", "hash-3", "pb-3", None)
            .await
            .unwrap();

        let keys = list_for_org(&pool, "default").await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.organization_id == "default"));

        assert!(!delete_api_key(&pool, "acme", &first.id).await.unwrap());
        assert!(delete_api_key(&pool, "default", &first.id).await.unwrap());
        assert!(get_by_hash(&pool, "hash-1").await.unwrap().is_none());
        assert_eq!(list_for_org(&pool, "default").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_key_limit_per_org() {
        let pool = setup_test_pool().await;
        for i in 0..API_KEY_MAX_PER_ORG {
            create_api_key(&pool, "default", "k", &format!("hash-{}", i), "pb-x", None)
                .await
                .unwrap();
        }
        let err = create_api_key(&pool, "default", "k", "hash-over", "pb-x", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(ref m) if m.starts_with("Maximum")));
    }

    #[tokio::test]
    async fn test_touch_sets_last_used() {
        let pool = setup_test_pool().await;
        let key = create_api_key(&pool, "default", "ci", "hash-1", "pb-abcdefg", None)
            .await
            .unwrap();
        touch_api_key(&pool, &key.id).await.unwrap();

        let last_used: Option<i64> =
            sqlx::query_scalar("SELECT last_used_at FROM api_keys WHERE id = ?")
                .bind(&key.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(last_used.is_some());
    }

    #[tokio::test]
    async fn test_key_for_unknown_org_rejected() {
        let pool = setup_test_pool().await;
        assert!(
            create_api_key(&pool, "missing", "ci", "hash-1", "pb-abcdefg", None)
                .await
                .is_err()
        );
    }
}
