// Seasonal Stats Cascade: fold a day's enhanced lineup entries into each
// player's seasonal stats.

use std::collections::BTreeMap;

use serde_json::Value;

use rkl_core::model::daily::DailyBaseline;
use rkl_core::model::game::Phase;
use rkl_core::model::seasonal::{CarriedTotals, PlayerDay, PlayerTotals, SeasonalPlayerStats};
use rkl_core::naming::Paths;
use rkl_core::store::{StoreError, WriteBatch};

use super::day_key;
use crate::daily::{DailyAggregate, EnhancedEntry};
use crate::stats::{geometric_mean, mean, median, ratio};

/// Daily rank cutoffs for top-finish counts.
const TOP_50: u32 = 50;
const TOP_100: u32 = 100;

/// Summarize one player's entries for the day.
pub fn player_day(phase: Phase, baseline: &DailyBaseline, entries: &[&EnhancedEntry]) -> PlayerDay {
    PlayerDay {
        phase,
        date: baseline.date,
        games: entries.len() as u32,
        points: entries.iter().map(|e| e.points()).sum(),
        war: entries.iter().map(|e| e.metrics.war).sum(),
        above_mean: entries.iter().filter(|e| e.metrics.is_above_mean).count() as u32,
        above_median: entries.iter().filter(|e| e.metrics.is_above_median).count() as u32,
        ranks: entries.iter().filter_map(|e| e.entry.rank).collect(),
        rel_mean: entries.iter().map(|e| ratio(e.points(), baseline.mean)).sum(),
        rel_median: entries.iter().map(|e| ratio(e.points(), baseline.median)).sum(),
    }
}

/// Recompute phase totals from ledger days, on top of any totals the
/// document carried before its first fold.
pub fn totals<'a>(
    carried: &PlayerTotals,
    days: impl IntoIterator<Item = &'a PlayerDay>,
) -> PlayerTotals {
    let mut t = PlayerTotals {
        gp: carried.gp,
        points: carried.points,
        war: carried.war,
        above_mean: carried.above_mean,
        above_median: carried.above_median,
        rel_mean_sum: carried_sum(carried.rel_mean_sum, carried.rel_mean, carried.gp),
        rel_median_sum: carried_sum(carried.rel_median_sum, carried.rel_median, carried.gp),
        top50: carried.top50,
        top100: carried.top100,
        ..PlayerTotals::default()
    };
    let mut ranks: Vec<f64> = Vec::new();
    for day in days {
        t.gp += day.games;
        t.points += day.points;
        t.war += day.war;
        t.above_mean += day.above_mean;
        t.above_median += day.above_median;
        t.rel_mean_sum += day.rel_mean;
        t.rel_median_sum += day.rel_median;
        t.top50 += day.ranks.iter().filter(|r| **r <= TOP_50).count() as u32;
        t.top100 += day.ranks.iter().filter(|r| **r <= TOP_100).count() as u32;
        ranks.extend(day.ranks.iter().map(|r| *r as f64));
    }

    let gp = t.gp as f64;
    t.avg_points = ratio(t.points, gp);
    t.avg_war = ratio(t.war, gp);
    t.pct_above_mean = ratio(t.above_mean as f64, gp);
    t.pct_above_median = ratio(t.above_median as f64, gp);
    t.rel_mean = ratio(t.rel_mean_sum, gp);
    t.rel_median = ratio(t.rel_median_sum, gp);
    t.pct_top50 = ratio(t.top50 as f64, gp);
    t.pct_top100 = ratio(t.top100 as f64, gp);

    // Carried ranks are known only through their aggregates. Means pool by
    // count; the median treats every carried rank as the carried median.
    let carried_n = carried.ranked_days as f64;
    let ledger_n = ranks.len() as f64;
    t.ranked_days = carried.ranked_days + ranks.len() as u32;
    t.mean_rank = ratio(
        carried.mean_rank * carried_n + ranks.iter().sum::<f64>(),
        carried_n + ledger_n,
    );
    t.geo_mean_rank = match (carried.ranked_days, ranks.is_empty()) {
        (0, _) => geometric_mean(&ranks),
        (_, true) => carried.geo_mean_rank,
        _ => {
            let ledger_geo = geometric_mean(&ranks);
            if carried.geo_mean_rank > 0.0 && ledger_geo > 0.0 {
                ((carried.geo_mean_rank.ln() * carried_n + ledger_geo.ln() * ledger_n)
                    / (carried_n + ledger_n))
                    .exp()
            } else {
                0.0
            }
        }
    };
    ranks.extend(std::iter::repeat_n(carried.median_rank, carried.ranked_days as usize));
    t.median_rank = median(&ranks);
    t
}

/// A carried relative-ratio sum, rebuilt from its per-game average when only
/// the average was stored.
fn carried_sum(sum: f64, avg: f64, gp: u32) -> f64 {
    if sum != 0.0 {
        sum
    } else {
        avg * gp as f64
    }
}

/// Identity fields written on every fold so a fresh document is complete.
#[derive(Debug, Clone)]
pub struct PlayerIdentity {
    pub player_id: String,
    pub player_handle: String,
    pub team_id: String,
    pub season_id: String,
}

/// Insert `day` under `key` into the existing stats (or a new document) and
/// return the recomputed document.
pub fn fold_player(
    existing: Option<&Value>,
    identity: PlayerIdentity,
    key: String,
    day: PlayerDay,
) -> Result<Value, StoreError> {
    let mut stats: SeasonalPlayerStats = match existing {
        Some(doc) => serde_json::from_value(doc.clone()).map_err(|e| StoreError::Fold {
            path: format!("seasonal stats for {}", identity.player_id),
            message: e.to_string(),
        })?,
        None => SeasonalPlayerStats::default(),
    };

    stats.player_id = identity.player_id;
    stats.season_id = identity.season_id;
    if !identity.player_handle.is_empty() {
        stats.player_handle = identity.player_handle;
    }
    if !identity.team_id.is_empty() {
        stats.team_id = identity.team_id;
    }

    if stats.days.is_empty() {
        stats.carried = CarriedTotals {
            regular: stats.regular.clone(),
            post: stats.post.clone(),
        };
    }
    stats.days.insert(key, day);
    stats.regular = totals(
        &stats.carried.regular,
        stats.days.values().filter(|d| d.phase == Phase::Regular),
    );
    stats.post = totals(
        &stats.carried.post,
        stats.days.values().filter(|d| d.phase == Phase::Postseason),
    );

    Ok(serde_json::to_value(&stats)?)
}

/// Group the day's entries by player and stage one fold per player. Returns
/// the number of players staged.
pub fn stage_writes(
    batch: &mut WriteBatch,
    paths: &Paths<'_>,
    season_id: &str,
    phase: Phase,
    aggregate: &DailyAggregate,
) -> usize {
    let mut by_player: BTreeMap<&str, Vec<&EnhancedEntry>> = BTreeMap::new();
    for enhanced in &aggregate.entries {
        by_player
            .entry(enhanced.entry.player_id.as_str())
            .or_default()
            .push(enhanced);
    }

    let key = day_key(phase, aggregate.baseline.date);
    for (player_id, entries) in &by_player {
        let day = player_day(phase, &aggregate.baseline, entries);
        let latest = entries[entries.len() - 1];
        let identity = PlayerIdentity {
            player_id: player_id.to_string(),
            player_handle: latest.entry.player_handle.clone(),
            team_id: latest.entry.team_id.clone(),
            season_id: season_id.to_string(),
        };
        let key = key.clone();
        batch.fold(paths.seasonal_stats(player_id, season_id), move |existing| {
            fold_player(existing, identity, key, day)
        });
    }
    by_player.len()
}
