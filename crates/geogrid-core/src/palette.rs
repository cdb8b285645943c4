use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ranking::RankTier;
use crate::ConfigError;

/// Marker colors per rank tier. Any field missing from a palette file keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub top: String,
    pub high: String,
    pub medium: String,
    pub low: String,
    pub lowest: String,
    pub beyond: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            top: "#059669".to_owned(),
            high: "#4CAF50".to_owned(),
            medium: "#FFC107".to_owned(),
            low: "#FF9800".to_owned(),
            lowest: "#F44336".to_owned(),
            beyond: "#9E9E9E".to_owned(),
        }
    }
}

impl Palette {
    #[must_use]
    pub fn color(&self, tier: RankTier) -> &str {
        match tier {
            RankTier::Top => &self.top,
            RankTier::High => &self.high,
            RankTier::Medium => &self.medium,
            RankTier::Low => &self.low,
            RankTier::Lowest => &self.lowest,
            RankTier::Beyond => &self.beyond,
        }
    }
}

/// Load and validate a marker palette from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_palette(path: &Path) -> Result<Palette, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PaletteFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_palette(&content)
}

fn parse_palette(content: &str) -> Result<Palette, ConfigError> {
    let palette: Palette = serde_yaml::from_str(content).map_err(ConfigError::PaletteFileParse)?;
    validate_palette(&palette)?;
    Ok(palette)
}

/// Every color must be `#RRGGBB`.
fn validate_palette(palette: &Palette) -> Result<(), ConfigError> {
    for tier in RankTier::ALL {
        let color = palette.color(tier);
        if !is_hex_color(color) {
            return Err(ConfigError::InvalidPalette(format!(
                "{tier} color must be #RRGGBB, got '{color}'"
            )));
        }
    }
    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_is_valid() {
        assert!(validate_palette(&Palette::default()).is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let palette = parse_palette("top: \"#4CAF50\"\nbeyond: \"#cccccc\"\n").unwrap();
        assert_eq!(palette.top, "#4CAF50");
        assert_eq!(palette.beyond, "#cccccc");
        assert_eq!(palette.medium, Palette::default().medium);
    }

    #[test]
    fn bad_hex_is_rejected() {
        let err = parse_palette("low: orange\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidPalette(ref msg) if msg.contains("low")),
            "got {err:?}"
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse_palette("amber: \"#FFC107\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::PaletteFileParse(_)), "got {err:?}");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_palette(Path::new("/nonexistent/palette.yaml")).unwrap_err();
        assert!(
            matches!(err, ConfigError::PaletteFileIo { ref path, .. } if path.contains("palette.yaml"))
        );
    }
}
