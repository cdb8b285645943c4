use thiserror::Error;

/// Rejected grid input. Raised instead of letting NaN leak into coordinates.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("coordinate is not finite: ({latitude}, {longitude})")]
    NonFiniteCoordinate { latitude: f64, longitude: f64 },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("grid size must be a positive integer, got {0}")]
    InvalidGridSize(usize),

    #[error("grid spacing must be a finite positive number, got {0}")]
    InvalidSpacing(f64),

    #[error(
        "a {size}x{size} grid at {spacing_km} km spacing reaches ({corner_latitude}, {corner_longitude}), outside the valid coordinate range"
    )]
    GridOutOfBounds {
        size: usize,
        spacing_km: f64,
        corner_latitude: f64,
        corner_longitude: f64,
    },

    #[error("rank matrix has {rows} rows but the grid is {size}x{size}")]
    RankMatrixRows { size: usize, rows: usize },

    #[error("rank matrix row {row} has {len} entries but the grid is {size}x{size}")]
    RankMatrixShape { size: usize, row: usize, len: usize },

    #[error("negative rank {rank} at row {row}, column {col}")]
    NegativeRank { row: usize, col: usize, rank: i32 },

    #[error("malformed grid CSV: {0}")]
    CsvFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read palette file {path}: {source}")]
    PaletteFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse palette file: {0}")]
    PaletteFileParse(#[source] serde_yaml::Error),

    #[error("invalid palette: {0}")]
    InvalidPalette(String),
}
