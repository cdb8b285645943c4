//! CSV export of assembled grids, and parsing it back.
//!
//! One row per cell in row-major order. `Row` and `Column` are 1-based.
//! Coordinates are written in shortest round-trip form so a re-parsed file
//! reproduces the in-memory floats exactly. `Ranking` is the raw matrix value
//! (zero included) and empty when the cell had no entry.

use std::io;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::geo::Coordinate;
use crate::grid::GridPoint;

pub const CSV_HEADER: [&str; 5] = ["Row", "Column", "Latitude", "Longitude", "Ranking"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Row")]
    pub row: usize,
    #[serde(rename = "Column")]
    pub column: usize,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Ranking")]
    pub ranking: Option<i32>,
}

impl From<&GridPoint> for CsvRow {
    fn from(point: &GridPoint) -> Self {
        Self {
            row: point.row + 1,
            column: point.col + 1,
            latitude: point.coordinate.latitude,
            longitude: point.coordinate.longitude,
            ranking: point.rank,
        }
    }
}

/// Write `points` as CSV, header first.
///
/// # Errors
///
/// Returns [`GridError::Csv`] if serialization or the underlying writer fails.
pub fn write_grid_csv<W: io::Write>(writer: W, points: &[GridPoint]) -> Result<(), GridError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for point in points {
        wtr.serialize(CsvRow::from(point))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// # Errors
///
/// Returns [`GridError::Csv`] if serialization fails.
pub fn grid_to_csv_string(points: &[GridPoint]) -> Result<String, GridError> {
    let mut buf = Vec::new();
    write_grid_csv(&mut buf, points)?;
    String::from_utf8(buf).map_err(|e| GridError::CsvFormat(e.to_string()))
}

/// Parse a grid CSV produced by [`write_grid_csv`].
///
/// # Errors
///
/// Returns [`GridError::CsvFormat`] for an unexpected header, or
/// [`GridError::Csv`] for rows that fail to parse.
pub fn read_grid_csv<R: io::Read>(reader: R) -> Result<Vec<CsvRow>, GridError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers()?;
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(GridError::CsvFormat(format!(
            "expected header {}, got {}",
            CSV_HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    rdr.deserialize::<CsvRow>()
        .map(|row| row.map_err(GridError::from))
        .collect()
}

/// Matrices rebuilt from parsed CSV rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedGrid {
    pub size: usize,
    pub coordinates: Vec<Vec<Coordinate>>,
    pub ranks: Vec<Vec<Option<i32>>>,
}

/// Rebuild the square coordinate and rank matrices from CSV rows.
///
/// Rows must form a complete square grid listed in row-major order.
///
/// # Errors
///
/// Returns [`GridError::CsvFormat`] when the row count is not a perfect square
/// or a row is out of order.
pub fn csv_rows_to_grid(rows: &[CsvRow]) -> Result<ParsedGrid, GridError> {
    let size = exact_square_root(rows.len()).ok_or_else(|| {
        GridError::CsvFormat(format!("{} rows do not form a square grid", rows.len()))
    })?;

    let mut coordinates = Vec::with_capacity(size);
    let mut ranks = Vec::with_capacity(size);

    if size == 0 {
        return Ok(ParsedGrid {
            size,
            coordinates,
            ranks,
        });
    }

    for (index, chunk) in rows.chunks(size).enumerate() {
        let mut coordinate_row = Vec::with_capacity(size);
        let mut rank_row = Vec::with_capacity(size);
        for (col, row) in chunk.iter().enumerate() {
            if row.row != index + 1 || row.column != col + 1 {
                return Err(GridError::CsvFormat(format!(
                    "expected cell ({}, {}) at position {}, found ({}, {})",
                    index + 1,
                    col + 1,
                    index * size + col,
                    row.row,
                    row.column
                )));
            }
            coordinate_row.push(Coordinate {
                latitude: row.latitude,
                longitude: row.longitude,
            });
            rank_row.push(row.ranking);
        }
        coordinates.push(coordinate_row);
        ranks.push(rank_row);
    }

    Ok(ParsedGrid {
        size,
        coordinates,
        ranks,
    })
}

fn exact_square_root(n: usize) -> Option<usize> {
    let mut root = 0usize;
    while root * root < n {
        root += 1;
    }
    (root * root == n).then_some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::DistanceUnit;
    use crate::grid::{build_grid, GridConfig};

    fn config() -> GridConfig {
        GridConfig {
            center: Coordinate::new(40.0, -74.0).unwrap(),
            size: 13,
            spacing: 2.5,
            unit: DistanceUnit::Kilometers,
        }
    }

    #[test]
    fn header_and_first_row() {
        let ranks = vec![vec![0; 13]; 13];
        let points = build_grid(&config(), Some(ranks.as_slice())).unwrap();
        let csv = grid_to_csv_string(&points).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Row,Column,Latitude,Longitude,Ranking"));
        let first = lines.next().unwrap();
        assert!(first.starts_with("1,1,"), "got {first}");
        assert!(first.ends_with(",0"), "zero ranks are written verbatim: {first}");
        assert_eq!(csv.lines().count(), 1 + 169);
    }

    #[test]
    fn missing_rank_is_written_empty() {
        let points = build_grid(&config(), None).unwrap();
        let csv = grid_to_csv_string(&points).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.ends_with(','), "got {row}");
    }

    #[test]
    fn reparsed_csv_reproduces_grid_exactly() {
        let mut ranks = vec![vec![0; 13]; 13];
        ranks[6][6] = 1;
        ranks[0][12] = 21;
        let points = build_grid(&config(), Some(ranks.as_slice())).unwrap();
        let csv = grid_to_csv_string(&points).unwrap();

        let rows = read_grid_csv(csv.as_bytes()).unwrap();
        let parsed = csv_rows_to_grid(&rows).unwrap();

        assert_eq!(parsed.size, 13);
        for point in &points {
            assert_eq!(parsed.coordinates[point.row][point.col], point.coordinate);
            assert_eq!(parsed.ranks[point.row][point.col], point.rank);
        }
    }

    #[test]
    fn wrong_header_is_rejected() {
        let err = read_grid_csv("Lat,Lng\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GridError::CsvFormat(_)));
    }

    #[test]
    fn non_square_row_count_is_rejected() {
        let rows: Vec<CsvRow> = (1..=3)
            .map(|c| CsvRow {
                row: 1,
                column: c,
                latitude: 0.0,
                longitude: 0.0,
                ranking: None,
            })
            .collect();
        assert!(matches!(
            csv_rows_to_grid(&rows),
            Err(GridError::CsvFormat(_))
        ));
    }

    #[test]
    fn out_of_order_rows_are_rejected() {
        let points = build_grid(
            &GridConfig {
                size: 2,
                ..config()
            },
            None,
        )
        .unwrap();
        let mut rows: Vec<CsvRow> = points.iter().map(CsvRow::from).collect();
        rows.swap(1, 2);
        assert!(matches!(
            csv_rows_to_grid(&rows),
            Err(GridError::CsvFormat(_))
        ));
    }
}
