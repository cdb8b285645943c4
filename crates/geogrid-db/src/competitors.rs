//! Database operations for the `competitors` table.

use chrono::{DateTime, Utc};
use geogrid_core::{Competitor, Coordinate};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

/// A row from the `competitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: i64,
    pub grid_result_id: Uuid,
    pub place_id: String,
    pub name: String,
    pub ranking: i32,
    pub distance_km: Option<f64>,
    pub rating: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<CompetitorRow> for Competitor {
    fn from(row: CompetitorRow) -> Self {
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        };
        Competitor {
            id: row.place_id,
            name: row.name,
            ranking: row.ranking,
            distance_km: row.distance_km,
            rating: row.rating,
            location,
        }
    }
}

/// Stores competitors for a grid result.
///
/// Uses a single `INSERT … SELECT * FROM UNNEST(…) ON CONFLICT` so the whole
/// batch is written in one round-trip. A competitor already stored for this
/// grid result (same place id) is overwritten.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including a foreign-key
/// violation when `grid_result_id` does not exist.
pub async fn insert_competitors(
    pool: &PgPool,
    grid_result_id: Uuid,
    competitors: &[Competitor],
) -> Result<u64, DbError> {
    let mut conn = pool.acquire().await?;
    insert_competitors_on(&mut *conn, grid_result_id, competitors).await
}

pub(crate) async fn insert_competitors_on(
    conn: &mut PgConnection,
    grid_result_id: Uuid,
    competitors: &[Competitor],
) -> Result<u64, DbError> {
    if competitors.is_empty() {
        return Ok(0);
    }

    let mut place_ids: Vec<String> = Vec::with_capacity(competitors.len());
    let mut names: Vec<String> = Vec::with_capacity(competitors.len());
    let mut rankings: Vec<i32> = Vec::with_capacity(competitors.len());
    let mut distances: Vec<Option<f64>> = Vec::with_capacity(competitors.len());
    let mut ratings: Vec<Option<f64>> = Vec::with_capacity(competitors.len());
    let mut latitudes: Vec<Option<f64>> = Vec::with_capacity(competitors.len());
    let mut longitudes: Vec<Option<f64>> = Vec::with_capacity(competitors.len());

    for competitor in competitors {
        place_ids.push(competitor.id.clone());
        names.push(competitor.name.clone());
        rankings.push(competitor.ranking);
        distances.push(competitor.distance_km);
        ratings.push(competitor.rating);
        latitudes.push(competitor.location.map(|c| c.latitude));
        longitudes.push(competitor.location.map(|c| c.longitude));
    }

    let result = sqlx::query(
        "INSERT INTO competitors \
             (grid_result_id, place_id, name, ranking, distance_km, rating, latitude, longitude) \
         SELECT $1, * FROM UNNEST(\
              $2::text[], $3::text[], $4::int4[], $5::float8[], $6::float8[], \
              $7::float8[], $8::float8[]) \
         ON CONFLICT (grid_result_id, place_id) DO UPDATE SET \
             name        = EXCLUDED.name, \
             ranking     = EXCLUDED.ranking, \
             distance_km = EXCLUDED.distance_km, \
             rating      = EXCLUDED.rating, \
             latitude    = EXCLUDED.latitude, \
             longitude   = EXCLUDED.longitude",
    )
    .bind(grid_result_id)
    .bind(&place_ids)
    .bind(&names)
    .bind(&rankings)
    .bind(&distances)
    .bind(&ratings)
    .bind(&latitudes)
    .bind(&longitudes)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Lists competitors for a grid result, best-ranked first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitors(
    pool: &PgPool,
    grid_result_id: Uuid,
) -> Result<Vec<Competitor>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, grid_result_id, place_id, name, ranking, distance_km, rating, \
                latitude, longitude, created_at \
         FROM competitors \
         WHERE grid_result_id = $1 \
         ORDER BY ranking, id",
    )
    .bind(grid_result_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Competitor::from).collect())
}
