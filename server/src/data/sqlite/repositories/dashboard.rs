//! Dashboard repository for SQLite operations
//!
//! Charts are embedded in the dashboard row as a JSON array. Every write path
//! runs them through [`ensure_chart_ids`] so each chart carries a stable id.

use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::sqlite::error::is_unique_violation;
use crate::data::types::{ChartRemoval, ChartSpec, DashboardRow};

const SELECT_COLUMNS: &str = "SELECT id, organization_id, name, description, charts, created_at, updated_at FROM dashboards";

type DashboardTuple = (String, String, String, Option<String>, String, i64, i64);

fn into_row(t: DashboardTuple) -> Result<DashboardRow, SqliteError> {
    let (id, organization_id, name, description, charts, created_at, updated_at) = t;
    Ok(DashboardRow {
        id,
        organization_id,
        name,
        description,
        charts: serde_json::from_str(&charts).map_err(|e| SqliteError::json("charts", e))?,
        created_at,
        updated_at,
    })
}

fn encode_charts(charts: &[ChartSpec]) -> Result<String, SqliteError> {
    serde_json::to_string(charts).map_err(|e| SqliteError::json("charts", e))
}

fn name_conflict(name: &str) -> impl FnOnce(sqlx::Error) -> SqliteError + '_ {
    move |e| {
        if is_unique_violation(&e) {
            SqliteError::Conflict(format!("Dashboard '{}' already exists", name))
        } else {
            e.into()
        }
    }
}

fn require_charts(charts: &[ChartSpec]) -> Result<(), SqliteError> {
    if charts.is_empty() {
        return Err(SqliteError::Invalid(
            "A dashboard needs at least one chart".to_string(),
        ));
    }
    Ok(())
}

/// Give every chart a unique id, keeping the ids it already has
pub fn ensure_chart_ids(charts: &[ChartSpec]) -> Vec<ChartSpec> {
    let mut seen = HashSet::new();
    charts
        .iter()
        .map(|chart| {
            let mut chart = chart.clone();
            let id = chart.id.trim().to_string();
            if id.is_empty() || !seen.insert(id.clone()) {
                chart.id = cuid2::create_id();
                seen.insert(chart.id.clone());
            } else {
                chart.id = id;
            }
            chart
        })
        .collect()
}

/// List an organization's dashboards, newest first
pub async fn list_for_org(
    pool: &SqlitePool,
    org_id: &str,
) -> Result<Vec<DashboardRow>, SqliteError> {
    let rows = sqlx::query_as::<_, DashboardTuple>(&format!(
        "{} WHERE organization_id = ? ORDER BY created_at DESC, name ASC",
        SELECT_COLUMNS
    ))
    .bind(org_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(into_row).collect()
}

/// Get a dashboard by ID; dashboards of other organizations are invisible
pub async fn get_dashboard(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
) -> Result<Option<DashboardRow>, SqliteError> {
    let row = sqlx::query_as::<_, DashboardTuple>(&format!(
        "{} WHERE organization_id = ? AND id = ?",
        SELECT_COLUMNS
    ))
    .bind(org_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(into_row).transpose()
}

/// Create a dashboard with a generated CUID2 ID
pub async fn create_dashboard(
    pool: &SqlitePool,
    org_id: &str,
    name: &str,
    description: Option<&str>,
    charts: &[ChartSpec],
) -> Result<DashboardRow, SqliteError> {
    require_charts(charts)?;
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();
    let charts = ensure_chart_ids(charts);

    sqlx::query(
        "INSERT INTO dashboards (id, organization_id, name, description, charts, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(org_id)
    .bind(name)
    .bind(description)
    .bind(encode_charts(&charts)?)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(name_conflict(name))?;

    Ok(DashboardRow {
        id,
        organization_id: org_id.to_string(),
        name: name.to_string(),
        description: description.map(String::from),
        charts,
        created_at: now,
        updated_at: now,
    })
}

/// Replace a dashboard's name, description and charts
pub async fn update_dashboard(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
    name: &str,
    description: Option<&str>,
    charts: &[ChartSpec],
) -> Result<Option<DashboardRow>, SqliteError> {
    require_charts(charts)?;
    let charts = ensure_chart_ids(charts);

    let result = sqlx::query(
        "UPDATE dashboards SET name = ?, description = ?, charts = ?, updated_at = ? WHERE organization_id = ? AND id = ?",
    )
    .bind(name)
    .bind(description)
    .bind(encode_charts(&charts)?)
    .bind(chrono::Utc::now().timestamp())
    .bind(org_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(name_conflict(name))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_dashboard(pool, org_id, id).await
}

/// Delete a dashboard
pub async fn delete_dashboard(
    pool: &SqlitePool,
    org_id: &str,
    id: &str,
) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM dashboards WHERE organization_id = ? AND id = ?")
        .bind(org_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove one chart; a dashboard left without charts is deleted
pub async fn remove_chart(
    pool: &SqlitePool,
    org_id: &str,
    dashboard_id: &str,
    chart_id: &str,
) -> Result<ChartRemoval, SqliteError> {
    let mut tx = pool.begin().await?;

    let charts: Option<String> =
        sqlx::query_scalar("SELECT charts FROM dashboards WHERE organization_id = ? AND id = ?")
            .bind(org_id)
            .bind(dashboard_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(charts) = charts else {
        return Ok(ChartRemoval::DashboardNotFound);
    };
    let mut charts: Vec<ChartSpec> =
        serde_json::from_str(&charts).map_err(|e| SqliteError::json("charts", e))?;

    let before = charts.len();
    charts.retain(|c| c.id != chart_id);
    if charts.len() == before {
        return Ok(ChartRemoval::ChartNotFound);
    }

    let outcome = if charts.is_empty() {
        sqlx::query("DELETE FROM dashboards WHERE id = ?")
            .bind(dashboard_id)
            .execute(&mut *tx)
            .await?;
        ChartRemoval::DashboardDeleted
    } else {
        sqlx::query("UPDATE dashboards SET charts = ?, updated_at = ? WHERE id = ?")
            .bind(encode_charts(&charts)?)
            .bind(chrono::Utc::now().timestamp())
            .bind(dashboard_id)
            .execute(&mut *tx)
            .await?;
        ChartRemoval::Removed
    };

    tx.commit().await?;
    Ok(outcome)
}
