//! Ranking classifier: maps a search rank to a marker color, label, and stacking order.

use serde::{Deserialize, Serialize};

use crate::palette::Palette;

/// Highest rank that still gets its own numeric label.
pub const MAX_LABELED_RANK: i32 = 20;

const Z_INDEX_BASE: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankTier {
    /// 1–3
    Top,
    /// 4–7
    High,
    /// 8–10
    Medium,
    /// 11–15
    Low,
    /// 16–20
    Lowest,
    /// Anything past 20.
    Beyond,
}

impl RankTier {
    pub const ALL: [RankTier; 6] = [
        RankTier::Top,
        RankTier::High,
        RankTier::Medium,
        RankTier::Low,
        RankTier::Lowest,
        RankTier::Beyond,
    ];

    /// Tier for `rank`, or `None` for the no-data sentinel (`0`) and negatives.
    #[must_use]
    pub fn from_rank(rank: i32) -> Option<Self> {
        match rank {
            i32::MIN..=0 => None,
            1..=3 => Some(RankTier::Top),
            4..=7 => Some(RankTier::High),
            8..=10 => Some(RankTier::Medium),
            11..=15 => Some(RankTier::Low),
            16..=20 => Some(RankTier::Lowest),
            _ => Some(RankTier::Beyond),
        }
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankTier::Top => write!(f, "top"),
            RankTier::High => write!(f, "high"),
            RankTier::Medium => write!(f, "medium"),
            RankTier::Low => write!(f, "low"),
            RankTier::Lowest => write!(f, "lowest"),
            RankTier::Beyond => write!(f, "beyond"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingStyle {
    pub tier: RankTier,
    /// `#RRGGBB`
    pub color: String,
    pub label: String,
    pub z_index: i32,
}

/// Marker stacking order. Better ranks draw on top; everything past 20 shares the floor.
#[must_use]
pub fn z_index(rank: i32) -> i32 {
    Z_INDEX_BASE - rank.min(MAX_LABELED_RANK + 1)
}

#[must_use]
pub fn rank_label(rank: i32) -> String {
    if rank > MAX_LABELED_RANK {
        format!("{MAX_LABELED_RANK}+")
    } else {
        rank.to_string()
    }
}

/// Classify `rank` with the default palette. `None` means "no data; do not render".
#[must_use]
pub fn classify(rank: i32) -> Option<RankingStyle> {
    classify_with(&Palette::default(), rank)
}

#[must_use]
pub fn classify_with(palette: &Palette, rank: i32) -> Option<RankingStyle> {
    let tier = RankTier::from_rank(rank)?;
    Some(RankingStyle {
        tier,
        color: palette.color(tier).to_owned(),
        label: rank_label(rank),
        z_index: z_index(rank),
    })
}
