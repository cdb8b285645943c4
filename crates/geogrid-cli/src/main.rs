mod grid;
mod scan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geogrid_core::{Coordinate, DistanceUnit, GridConfig};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "geogrid-cli")]
#[command(about = "GeoGrid command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute a grid around a center point and write it as CSV
    Grid {
        #[command(flatten)]
        geometry: GridArgs,
        /// Rank matrix to attach: a JSON array of rows, or a CSV written by `grid`/`export`
        #[arg(long)]
        ranks: Option<PathBuf>,
        /// Write CSV here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the marker style for a rank
    Classify {
        #[arg(allow_negative_numbers = true)]
        rank: i32,
    },
    /// Great-circle distance between two `lat,lng` points
    Distance {
        #[arg(long, value_parser = parse_coordinate)]
        from: Coordinate,
        #[arg(long, value_parser = parse_coordinate)]
        to: Coordinate,
    },
    /// Scan a grid for a business against the places API
    Scan {
        /// Place ID of the business being ranked
        #[arg(long)]
        place_id: String,
        /// Search term to rank for
        #[arg(long)]
        query: String,
        /// Display name stored with the result (defaults to the place ID)
        #[arg(long)]
        name: Option<String>,
        /// Region bias for the search, e.g. `us`
        #[arg(long)]
        region: Option<String>,
        #[command(flatten)]
        geometry: GridArgs,
        /// Persist the result and its competitors
        #[arg(long)]
        save: bool,
    },
    /// Database administration
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Export a stored grid result as CSV
    Export {
        id: Uuid,
        /// Write CSV here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

/// Grid geometry shared by `grid` and `scan`. Omitted values fall back to the configured defaults.
#[derive(Debug, Args)]
struct GridArgs {
    /// Center latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    /// Center longitude
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
    /// Points per side
    #[arg(long, env = "GEOGRID_DEFAULT_GRID_SIZE", default_value_t = 13)]
    size: usize,
    /// Distance between adjacent points, in `--unit`
    #[arg(long)]
    spacing: Option<f64>,
    /// Unit for `--spacing`: km or mi
    #[arg(long, default_value = "km")]
    unit: DistanceUnit,
    #[arg(long, env = "GEOGRID_DEFAULT_SPACING_KM", default_value_t = 2.5, hide = true)]
    default_spacing_km: f64,
}

impl GridArgs {
    /// Resolve into a validated config. A malformed value is an error, never a default.
    fn to_config(&self) -> anyhow::Result<GridConfig> {
        let center = Coordinate::new(self.lat, self.lng)?;
        let (spacing, unit) = match self.spacing {
            Some(spacing) => (spacing, self.unit),
            None => (self.default_spacing_km, DistanceUnit::Kilometers),
        };
        let config = GridConfig {
            center,
            size: self.size,
            spacing,
            unit,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lng`, got '{raw}'"))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;
    Coordinate::new(lat, lng).map_err(|e| e.to_string())
}

async fn connect(config: &geogrid_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = geogrid_db::PoolConfig::from_app_config(config);
    let pool = geogrid_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

fn init_tracing(fallback: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let log_level = std::env::var("GEOGRID_LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned());
    init_tracing(&log_level)?;

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Grid {
            geometry,
            ranks,
            output,
        }) => grid::run_grid(&geometry.to_config()?, ranks.as_deref(), output.as_deref())?,
        Some(Commands::Classify { rank }) => grid::run_classify(rank)?,
        Some(Commands::Distance { from, to }) => grid::run_distance(from, to),
        Some(Commands::Scan {
            place_id,
            query,
            name,
            region,
            geometry,
            save,
        }) => {
            let config = geogrid_core::load_app_config()?;
            let grid = geometry.to_config()?;
            let target = scan::ScanTarget {
                name: name.unwrap_or_else(|| place_id.clone()),
                place_id,
                query,
                region,
            };
            scan::run_scan(&config, &target, grid, save).await?;
        }
        Some(Commands::Db { command }) => {
            let config = geogrid_core::load_app_config()?;
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    geogrid_db::ping(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = geogrid_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Some(Commands::Export { id, output }) => {
            let config = geogrid_core::load_app_config()?;
            let pool = connect(&config).await?;
            scan::run_export(&config, &pool, id, output.as_deref()).await?;
        }
        None => println!("geogrid-cli ready; run with --help for commands"),
    }

    Ok(())
}
