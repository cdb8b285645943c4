//! Offline grid commands: no database or network access.

use std::fs;
use std::path::Path;

use anyhow::Context;
use geogrid_core::{
    build_grid, classify, csv_rows_to_grid, distance_badge, grid_to_csv_string, haversine_km,
    read_grid_csv, Coordinate, GridConfig, GridSummary, RankMatrix,
};

/// Load a rank matrix from JSON (`[[1, 2], [3, 4]]`) or from a grid CSV.
///
/// CSV cells with an empty `Ranking` become `0` (no data).
pub(crate) fn load_ranks(path: &Path) -> anyhow::Result<RankMatrix> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let rows = read_grid_csv(raw.as_slice())?;
        let parsed = csv_rows_to_grid(&rows)?;
        Ok(parsed
            .ranks
            .into_iter()
            .map(|row| row.into_iter().map(|rank| rank.unwrap_or(0)).collect())
            .collect())
    } else {
        serde_json::from_slice(&raw)
            .with_context(|| format!("{} is not a JSON rank matrix", path.display()))
    }
}

pub(crate) fn write_output(output: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

/// Compute the grid, attach optional ranks, and write it as CSV.
///
/// # Errors
///
/// Returns an error if the ranks file cannot be read or does not fit the grid,
/// or if the output cannot be written.
pub(crate) fn run_grid(
    config: &GridConfig,
    ranks: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let ranks = ranks.map(load_ranks).transpose()?;
    let points = build_grid(config, ranks.as_deref())?;
    let summary = GridSummary::from_points(&points);
    tracing::info!(
        size = config.size,
        spacing_km = config.spacing_km(),
        ranked = summary.ranked,
        "grid computed"
    );

    let csv = grid_to_csv_string(&points)?;
    write_output(output, &csv)
}

pub(crate) fn run_classify(rank: i32) -> anyhow::Result<()> {
    match classify(rank) {
        Some(style) => println!("{}", serde_json::to_string_pretty(&style)?),
        None => println!("rank {rank}: no data, no marker"),
    }
    Ok(())
}

pub(crate) fn run_distance(from: Coordinate, to: Coordinate) {
    let km = haversine_km(from, to);
    println!("{km:.3} km ({})", distance_badge(km));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "geogrid-cli-{}-{name}",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        path
    }

    #[test]
    fn load_ranks_reads_json_matrix() {
        let path = temp_file("ranks.json", "[[1, 2], [3, 0]]");
        let ranks = load_ranks(&path).expect("json ranks");
        assert_eq!(ranks, vec![vec![1, 2], vec![3, 0]]);
        fs::remove_file(path).ok();
    }

    #[test]
    fn load_ranks_reads_exported_csv() {
        let csv = "Row,Column,Latitude,Longitude,Ranking\n\
                   1,1,39.99,-74.01,4\n\
                   1,2,39.99,-74.0,\n\
                   2,1,40.0,-74.01,21\n\
                   2,2,40.0,-74.0,1\n";
        let path = temp_file("ranks.csv", csv);
        let ranks = load_ranks(&path).expect("csv ranks");
        assert_eq!(ranks, vec![vec![4, 0], vec![21, 1]]);
        fs::remove_file(path).ok();
    }

    #[test]
    fn load_ranks_rejects_malformed_json() {
        let path = temp_file("bad.json", "{\"ranks\": 1}");
        let err = load_ranks(&path).expect_err("object is not a matrix");
        assert!(err.to_string().contains("not a JSON rank matrix"));
        fs::remove_file(path).ok();
    }

    #[test]
    fn load_ranks_reports_missing_file() {
        let err = load_ranks(Path::new("/definitely/not/here.json")).expect_err("missing");
        assert!(err.to_string().contains("failed to read"));
    }
}
