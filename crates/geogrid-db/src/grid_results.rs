//! Database operations for the `grid_results` table.

use chrono::{DateTime, Utc};
use geogrid_core::{BusinessInfo, Competitor, GridMetrics, GridResult, RankMatrix};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

const SELECT_COLUMNS: &str = "id, business_info, search_term, created_at, grid_size, \
                              grid_data, metrics, google_region, distance_km";

/// A row from the `grid_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GridResultRow {
    pub id: Uuid,
    pub business_info: Json<BusinessInfo>,
    pub search_term: String,
    pub created_at: DateTime<Utc>,
    pub grid_size: i32,
    pub grid_data: Json<RankMatrix>,
    pub metrics: Json<GridMetrics>,
    pub google_region: Option<String>,
    pub distance_km: f64,
}

impl TryFrom<GridResultRow> for GridResult {
    type Error = DbError;

    fn try_from(row: GridResultRow) -> Result<Self, Self::Error> {
        let grid_size = usize::try_from(row.grid_size)
            .map_err(|_| DbError::InvalidRow(format!("negative grid_size {}", row.grid_size)))?;
        Ok(GridResult {
            id: row.id,
            business_info: row.business_info.0,
            search_term: row.search_term,
            created_at: row.created_at,
            grid_size,
            grid_data: row.grid_data.0,
            metrics: row.metrics.0,
            google_region: row.google_region,
            distance_km: row.distance_km,
        })
    }
}

/// Input record for a new grid result. `id` and `created_at` are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewGridResult {
    pub business_info: BusinessInfo,
    pub search_term: String,
    pub grid_size: usize,
    pub grid_data: RankMatrix,
    pub metrics: GridMetrics,
    pub google_region: Option<String>,
    pub distance_km: f64,
}

/// Inserts a grid result and returns it as stored.
///
/// # Errors
///
/// Returns [`DbError::InvalidRow`] if `grid_size` does not fit the column,
/// or [`DbError::Sqlx`] if the insert fails (including check-constraint
/// violations for a zero size or non-positive spacing).
pub async fn insert_grid_result(
    pool: &PgPool,
    new: &NewGridResult,
) -> Result<GridResult, DbError> {
    let mut conn = pool.acquire().await?;
    insert_grid_result_on(&mut *conn, new).await
}

/// Inserts a grid result together with its competitors in one transaction.
///
/// Either both the result and every competitor are stored, or nothing is.
/// Returns the stored result and the number of competitor rows written.
///
/// # Errors
///
/// Returns the same errors as [`insert_grid_result`] and
/// [`crate::insert_competitors`]; on any error the transaction is rolled back.
pub async fn insert_scan_result(
    pool: &PgPool,
    new: &NewGridResult,
    competitors: &[Competitor],
) -> Result<(GridResult, u64), DbError> {
    let mut tx = pool.begin().await?;
    let stored = insert_grid_result_on(&mut *tx, new).await?;
    let written = crate::competitors::insert_competitors_on(&mut *tx, stored.id, competitors).await?;
    tx.commit().await?;
    Ok((stored, written))
}

async fn insert_grid_result_on(
    conn: &mut PgConnection,
    new: &NewGridResult,
) -> Result<GridResult, DbError> {
    let grid_size = i32::try_from(new.grid_size)
        .map_err(|_| DbError::InvalidRow(format!("grid_size {} too large", new.grid_size)))?;

    let row = sqlx::query_as::<_, GridResultRow>(&format!(
        "INSERT INTO grid_results \
             (id, business_info, search_term, grid_size, grid_data, metrics, \
              google_region, distance_km) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {SELECT_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(Json(&new.business_info))
    .bind(&new.search_term)
    .bind(grid_size)
    .bind(Json(&new.grid_data))
    .bind(Json(&new.metrics))
    .bind(new.google_region.as_deref())
    .bind(new.distance_km)
    .fetch_one(&mut *conn)
    .await?;

    GridResult::try_from(row)
}

/// Fetches a single grid result by id. Returns `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if the stored row is malformed.
pub async fn get_grid_result(pool: &PgPool, id: Uuid) -> Result<Option<GridResult>, DbError> {
    let row = sqlx::query_as::<_, GridResultRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM grid_results WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(GridResult::try_from).transpose()
}

/// Lists grid results, newest first.
///
/// When `search_term` is provided, only results for that exact term are returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored row is malformed.
pub async fn list_grid_results(
    pool: &PgPool,
    limit: i64,
    search_term: Option<&str>,
) -> Result<Vec<GridResult>, DbError> {
    let rows = sqlx::query_as::<_, GridResultRow>(&format!(
        "SELECT {SELECT_COLUMNS} FROM grid_results \
         WHERE ($1::text IS NULL OR search_term = $1) \
         ORDER BY created_at DESC, id \
         LIMIT $2"
    ))
    .bind(search_term)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(GridResult::try_from).collect()
}

/// Deletes a grid result and, by cascade, its competitors.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has `id`, or [`DbError::Sqlx`]
/// if the delete fails.
pub async fn delete_grid_result(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM grid_results WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
