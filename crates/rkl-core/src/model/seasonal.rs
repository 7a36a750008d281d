// Seasonal aggregates for players and teams.
//
// Both documents keep a ledger of per-day (per-game for teams) contributions
// alongside the totals derived from it. Reprocessing a day replaces its
// ledger slot, so totals never double count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::date::GameDate;
use super::game::Phase;

/// Phase totals a document already held before its first ledger fold, such
/// as history written by an earlier sync. Ledger totals are added on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarriedTotals<T> {
    #[serde(default)]
    pub regular: T,
    #[serde(default)]
    pub post: T,
}

impl<T: Default + PartialEq> CarriedTotals<T> {
    pub fn is_empty(&self) -> bool {
        self.regular == T::default() && self.post == T::default()
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player's contribution from one game day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDay {
    pub phase: Phase,
    pub date: GameDate,
    pub games: u32,
    pub points: f64,
    pub war: f64,
    pub above_mean: u32,
    pub above_median: u32,
    /// Daily ranks, one per ranked entry.
    #[serde(default)]
    pub ranks: Vec<u32>,
    /// Sum of points / day mean over the day's entries.
    pub rel_mean: f64,
    /// Sum of points / day median over the day's entries.
    pub rel_median: f64,
}

/// Totals for one phase, recomputed from the ledger on every fold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTotals {
    pub gp: u32,
    pub points: f64,
    pub avg_points: f64,
    pub war: f64,
    pub avg_war: f64,
    pub above_mean: u32,
    pub pct_above_mean: f64,
    pub above_median: u32,
    pub pct_above_median: f64,
    pub ranked_days: u32,
    pub mean_rank: f64,
    pub median_rank: f64,
    pub geo_mean_rank: f64,
    pub rel_mean_sum: f64,
    pub rel_median_sum: f64,
    pub rel_mean: f64,
    pub rel_median: f64,
    pub top50: u32,
    pub top100: u32,
    pub pct_top50: f64,
    pub pct_top100: f64,
}

/// One player's season. Regular-season totals sit at the top level where
/// leaderboards read them; postseason totals live under `post`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPlayerStats {
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub player_handle: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub season_id: String,
    #[serde(flatten)]
    pub regular: PlayerTotals,
    #[serde(default)]
    pub post: PlayerTotals,
    #[serde(default, skip_serializing_if = "CarriedTotals::is_empty")]
    pub carried: CarriedTotals<PlayerTotals>,
    /// Keyed by `{phase}:{date}`.
    #[serde(default)]
    pub days: BTreeMap<String, PlayerDay>,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// A team's result from one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGame {
    pub phase: Phase,
    pub date: GameDate,
    pub game_id: String,
    pub score: f64,
    pub opponent_score: f64,
    pub won: Option<bool>,
    pub above_median: f64,
    pub is_above_median: bool,
    pub pct_above_median: f64,
    #[serde(default)]
    pub starter_ranks: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamTotals {
    pub gp: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
    /// Games finished above the day's team median.
    pub median_wins: u32,
    pub median_losses: u32,
    pub points_for: f64,
    pub points_against: f64,
    pub margin: f64,
    pub avg_margin: f64,
    pub avg_pct_above_median: f64,
    pub starter_mean_rank: f64,
    pub starter_median_rank: f64,
    pub sort_score: f64,
}

/// One team's season. Transaction counts are owned by the trade workflow and
/// live on the same document; folds merge around them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTeamRecord {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub season_id: String,
    #[serde(flatten)]
    pub regular: TeamTotals,
    #[serde(default)]
    pub post: TeamTotals,
    #[serde(default, skip_serializing_if = "CarriedTotals::is_empty")]
    pub carried: CarriedTotals<TeamTotals>,
    /// Keyed by game id.
    #[serde(default)]
    pub games: BTreeMap<String, TeamGame>,
}
