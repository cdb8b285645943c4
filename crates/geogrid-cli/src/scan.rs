//! Commands that talk to the places API or the database.

use std::path::Path;

use anyhow::Context;
use geogrid_core::{load_palette, AppConfig, BusinessInfo, GridConfig, Palette};
use geogrid_places::{scan_grid, PlacesClient, ScanRequest};
use uuid::Uuid;

use crate::grid::write_output;

/// The business and query a scan ranks.
#[derive(Debug)]
pub(crate) struct ScanTarget {
    pub name: String,
    pub place_id: String,
    pub query: String,
    pub region: Option<String>,
}

fn palette(config: &AppConfig) -> anyhow::Result<Palette> {
    Ok(match config.palette_path.as_deref() {
        Some(path) => load_palette(path)?,
        None => Palette::default(),
    })
}

/// Run a grid scan, print the rank matrix and metrics, and optionally store the result.
///
/// # Errors
///
/// Returns an error if no places API key is configured, the places API
/// refuses the scan, or storing the result fails.
pub(crate) async fn run_scan(
    config: &AppConfig,
    target: &ScanTarget,
    grid: GridConfig,
    save: bool,
) -> anyhow::Result<()> {
    let api_key = config
        .places_api_key
        .as_deref()
        .context("GOOGLE_PLACES_API_KEY must be set to run a scan")?;
    let client = PlacesClient::new(api_key, config.places_request_timeout_secs)?
        .with_retry(config.places_max_retries, config.places_retry_backoff_base_ms);

    let region = target
        .region
        .as_deref()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty());
    let request = ScanRequest {
        business_place_id: target.place_id.clone(),
        search_term: target.query.clone(),
        config: grid,
        region: region.clone(),
        max_concurrency: config.scan_max_concurrency,
    };

    tracing::info!(
        place_id = %target.place_id,
        query = %target.query,
        size = grid.size,
        spacing_km = grid.spacing_km(),
        "starting grid scan"
    );
    let outcome = scan_grid(&client, &request).await?;

    for row in outcome.ranks.iter().rev() {
        let cells: Vec<String> = row.iter().map(|rank| format!("{rank:>3}")).collect();
        println!("{}", cells.join(""));
    }
    println!();
    println!(
        "AGR {:.2}  ATGR {:.2}  SoLV {:.1}%",
        outcome.metrics.agr, outcome.metrics.atgr, outcome.metrics.solv
    );
    if outcome.failed_cells > 0 {
        eprintln!(
            "warning: {} cell(s) failed and were recorded as no data",
            outcome.failed_cells
        );
    }
    for competitor in &outcome.competitors {
        println!("{:>3}. {} ({})", competitor.ranking, competitor.name, competitor.id);
    }

    if !save {
        return Ok(());
    }

    let pool_config = geogrid_db::PoolConfig::from_app_config(config);
    let pool = geogrid_db::connect_pool(&config.database_url, pool_config).await?;
    let new = geogrid_db::NewGridResult {
        business_info: BusinessInfo {
            name: target.name.clone(),
            place_id: target.place_id.clone(),
            address: None,
            location: grid.center,
        },
        search_term: target.query.clone(),
        grid_size: grid.size,
        grid_data: outcome.ranks,
        metrics: outcome.metrics,
        google_region: region,
        distance_km: grid.spacing_km(),
    };
    let (stored, written) =
        geogrid_db::insert_scan_result(&pool, &new, &outcome.competitors).await?;
    println!("saved grid result {} ({written} competitor(s))", stored.id);
    Ok(())
}

/// Write a stored grid result as CSV.
///
/// # Errors
///
/// Returns an error if the result does not exist or cannot be assembled.
pub(crate) async fn run_export(
    config: &AppConfig,
    pool: &sqlx::PgPool,
    id: Uuid,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let result = geogrid_db::get_grid_result(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("grid result {id} not found"))?;
    let points = result.assemble(&palette(config)?)?;
    let csv = geogrid_core::grid_to_csv_string(&points)?;
    write_output(output, &csv)
}
