// Per-day derived documents: the daily baseline, the metrics annotated onto
// each lineup entry, and the per-team daily score.

use serde::{Deserialize, Serialize};

use super::date::GameDate;
use super::game::Phase;

/// Day-level scoring baseline for one phase of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBaseline {
    pub date: GameDate,
    pub week: String,
    pub player_count: u32,
    pub mean: f64,
    pub median: f64,
    /// 0.9 x median.
    pub replacement: f64,
    /// 0.92 x median.
    pub win: f64,
}

/// Fields the daily aggregator merges onto a lineup entry. Always a pure
/// function of the entry's adjusted points and the day's baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryMetrics {
    pub above_mean: f64,
    pub is_above_mean: bool,
    pub pct_above_mean: f64,
    pub above_median: f64,
    pub is_above_median: bool,
    pub pct_above_median: f64,
    /// (points - replacement) / win.
    pub war: f64,
}

/// One team's score for one game, relative to the median of every team
/// score posted that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTeamScore {
    pub team_id: String,
    pub opponent_id: String,
    pub game_id: String,
    pub week: String,
    pub date: GameDate,
    pub phase: Phase,
    pub score: f64,
    pub opponent_score: f64,
    /// `None` when the game has no recorded winner.
    pub won: Option<bool>,
    pub team_median: f64,
    pub above_median: f64,
    pub is_above_median: bool,
    pub pct_above_median: f64,
}

impl DailyTeamScore {
    /// Document id: `{team}-{game}`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.team_id, self.game_id)
    }
}
