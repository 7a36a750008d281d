// Lineup entries: one player's participation in one game day.

use serde::{Deserialize, Serialize};

use super::date::GameDate;

/// A lineup entry as written by lineup submission. Only `started` entries
/// count toward scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub player_id: String,
    #[serde(default)]
    pub player_handle: String,
    pub team_id: String,
    #[serde(default)]
    pub game_id: Option<String>,
    pub date: GameDate,
    #[serde(default)]
    pub week: String,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub points_raw: Option<f64>,
    #[serde(default)]
    pub points_adjusted: Option<f64>,
    /// The player's global karma rank for the day, when known.
    #[serde(default)]
    pub rank: Option<u32>,
}

impl LineupEntry {
    /// Adjusted points, treating a missing value as zero.
    pub fn points(&self) -> f64 {
        self.points_adjusted.unwrap_or(0.0)
    }
}
