// Seasonal Records Cascade: fold each team's daily score into its seasonal
// record, one ledger slot per game.

use serde_json::Value;

use rkl_core::model::daily::DailyTeamScore;
use rkl_core::model::game::Phase;
use rkl_core::model::seasonal::{CarriedTotals, SeasonalTeamRecord, TeamGame, TeamTotals};
use rkl_core::naming::Paths;
use rkl_core::store::{StoreError, WriteBatch};

use crate::daily::EnhancedEntry;
use crate::stats::{mean, median, ratio};

/// Build the ledger entry for one team score. Starter ranks come from the
/// team's ranked entries for the same game (entries without a game id count
/// toward every game the team played that day).
pub fn team_game(score: &DailyTeamScore, entries: &[EnhancedEntry]) -> TeamGame {
    let starter_ranks = entries
        .iter()
        .filter(|e| e.entry.team_id == score.team_id)
        .filter(|e| e.entry.game_id.as_deref().is_none_or(|g| g == score.game_id))
        .filter_map(|e| e.entry.rank)
        .collect();

    TeamGame {
        phase: score.phase,
        date: score.date,
        game_id: score.game_id.clone(),
        score: score.score,
        opponent_score: score.opponent_score,
        won: score.won,
        above_median: score.above_median,
        is_above_median: score.is_above_median,
        pct_above_median: score.pct_above_median,
        starter_ranks,
    }
}

/// Recompute phase totals from ledger games, on top of any totals the record
/// carried before its first fold.
pub fn totals<'a>(
    carried: &TeamTotals,
    games: impl IntoIterator<Item = &'a TeamGame>,
) -> TeamTotals {
    let mut t = TeamTotals {
        gp: carried.gp,
        wins: carried.wins,
        losses: carried.losses,
        median_wins: carried.median_wins,
        median_losses: carried.median_losses,
        points_for: carried.points_for,
        points_against: carried.points_against,
        ..TeamTotals::default()
    };
    let mut pct_sum = carried.avg_pct_above_median * carried.gp as f64;
    let mut ranks: Vec<f64> = Vec::new();
    for game in games {
        t.gp += 1;
        match game.won {
            Some(true) => t.wins += 1,
            Some(false) => t.losses += 1,
            None => {}
        }
        if game.is_above_median {
            t.median_wins += 1;
        } else {
            t.median_losses += 1;
        }
        t.points_for += game.score;
        t.points_against += game.opponent_score;
        pct_sum += game.pct_above_median;
        ranks.extend(game.starter_ranks.iter().map(|r| *r as f64));
    }

    let gp = t.gp as f64;
    t.win_pct = ratio(t.wins as f64, (t.wins + t.losses) as f64);
    t.margin = t.points_for - t.points_against;
    t.avg_margin = ratio(t.margin, gp);
    t.avg_pct_above_median = ratio(pct_sum, gp);
    // Carried starter ranks have no count to pool by, so they stand until
    // the ledger has ranks of its own.
    if ranks.is_empty() {
        t.starter_mean_rank = carried.starter_mean_rank;
        t.starter_median_rank = carried.starter_median_rank;
    } else {
        t.starter_mean_rank = mean(&ranks);
        t.starter_median_rank = median(&ranks);
    }
    t.sort_score = (t.wins + t.median_wins) as f64
        + ratio(t.points_for, t.points_for + t.points_against);
    t
}

/// Insert `game` into the existing record (or a new one) and return the
/// recomputed document.
pub fn fold_team(
    existing: Option<&Value>,
    team_id: String,
    season_id: String,
    game: TeamGame,
) -> Result<Value, StoreError> {
    let mut record: SeasonalTeamRecord = match existing {
        Some(doc) => serde_json::from_value(doc.clone()).map_err(|e| StoreError::Fold {
            path: format!("seasonal record for {team_id}"),
            message: e.to_string(),
        })?,
        None => SeasonalTeamRecord::default(),
    };

    record.team_id = team_id;
    record.season_id = season_id;
    if record.games.is_empty() {
        record.carried = CarriedTotals {
            regular: record.regular.clone(),
            post: record.post.clone(),
        };
    }
    record.games.insert(game.game_id.clone(), game);
    record.regular = totals(
        &record.carried.regular,
        record.games.values().filter(|g| g.phase == Phase::Regular),
    );
    record.post = totals(
        &record.carried.post,
        record.games.values().filter(|g| g.phase == Phase::Postseason),
    );

    Ok(serde_json::to_value(&record)?)
}

/// Stage one fold per team score. Returns the number staged.
pub fn stage_writes(
    batch: &mut WriteBatch,
    paths: &Paths<'_>,
    season_id: &str,
    scores: &[DailyTeamScore],
    entries: &[EnhancedEntry],
) -> usize {
    for score in scores {
        let game = team_game(score, entries);
        let team_id = score.team_id.clone();
        let season = season_id.to_string();
        batch.fold(paths.seasonal_record(&score.team_id, season_id), move |existing| {
            fold_team(existing, team_id, season, game)
        });
    }
    scores.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkl_core::model::daily::EntryMetrics;
    use rkl_core::model::date::GameDate;
    use rkl_core::model::lineup::LineupEntry;
    use rkl_core::store::{merge_json, DocPath};
    use serde_json::json;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn date() -> GameDate {
        GameDate::from_ymd(2025, 3, 15).unwrap()
    }

    fn score(team: &str, game: &str, score: f64, opp: f64, won: Option<bool>, above: bool) -> DailyTeamScore {
        DailyTeamScore {
            team_id: team.into(),
            opponent_id: "X".into(),
            game_id: game.into(),
            week: "3".into(),
            date: date(),
            phase: Phase::Regular,
            score,
            opponent_score: opp,
            won,
            team_median: 100.0,
            above_median: score - 100.0,
            is_above_median: above,
            pct_above_median: (score - 100.0) / 100.0,
        }
    }

    fn enhanced(team: &str, game: Option<&str>, rank: Option<u32>) -> EnhancedEntry {
        EnhancedEntry {
            path: DocPath::new("seasons/S9/lineups", format!("{team}-{rank:?}")),
            entry: LineupEntry {
                player_id: "p".into(),
                player_handle: "@p".into(),
                team_id: team.into(),
                game_id: game.map(str::to_string),
                date: date(),
                week: "3".into(),
                started: true,
                points_raw: Some(1.0),
                points_adjusted: Some(1.0),
                rank,
            },
            metrics: EntryMetrics {
                above_mean: 0.0,
                is_above_mean: false,
                pct_above_mean: 0.0,
                above_median: 0.0,
                is_above_median: false,
                pct_above_median: 0.0,
                war: 0.0,
            },
        }
    }

    #[test]
    fn starter_ranks_follow_team_and_game() {
        let entries = vec![
            enhanced("A", Some("g1"), Some(3)),
            enhanced("A", Some("g2"), Some(7)),
            enhanced("A", None, Some(11)),
            enhanced("B", Some("g1"), Some(1)),
            enhanced("A", Some("g1"), None),
        ];
        let game = team_game(&score("A", "g1", 120.0, 80.0, Some(true), true), &entries);
        assert_eq!(game.starter_ranks, vec![3, 11]);
    }

    #[test]
    fn totals_track_results_and_median_record() {
        let games = [
            team_game(&score("A", "g1", 120.0, 80.0, Some(true), true), &[]),
            team_game(&score("A", "g2", 90.0, 110.0, Some(false), false), &[]),
            team_game(&score("A", "g3", 100.0, 100.0, None, false), &[]),
        ];
        let t = totals(&TeamTotals::default(), games.iter());
        assert_eq!(t.gp, 3);
        assert_eq!(t.wins, 1);
        assert_eq!(t.losses, 1);
        assert!(approx_eq(t.win_pct, 0.5, 1e-9));
        assert_eq!(t.median_wins, 1);
        assert_eq!(t.median_losses, 2);
        assert!(approx_eq(t.margin, 20.0, 1e-9));
        assert!(approx_eq(t.sort_score, 2.0 + 310.0 / 600.0, 1e-9));
    }

    #[test]
    fn refolding_a_game_replaces_it() {
        let first = fold_team(
            None,
            "A".into(),
            "S9".into(),
            team_game(&score("A", "g1", 120.0, 80.0, Some(true), true), &[]),
        )
        .unwrap();
        let again = fold_team(
            Some(&first),
            "A".into(),
            "S9".into(),
            team_game(&score("A", "g1", 120.0, 80.0, Some(true), true), &[]),
        )
        .unwrap();
        assert_eq!(first, again);

        let record: SeasonalTeamRecord = serde_json::from_value(again).unwrap();
        assert_eq!(record.regular.gp, 1);
        assert_eq!(record.regular.wins, 1);
        assert_eq!(record.post.gp, 0);
    }

    #[test]
    fn transactions_survive_the_fold() {
        let existing = json!({"team_id": "A", "transactions": {"trades": 2, "adds": 5}});
        let patch = fold_team(
            Some(&existing),
            "A".into(),
            "S9".into(),
            team_game(&score("A", "g1", 120.0, 80.0, Some(true), true), &[]),
        )
        .unwrap();
        let mut doc = existing.clone();
        merge_json(&mut doc, patch);
        assert_eq!(doc["transactions"]["trades"], json!(2));
        assert_eq!(doc["wins"], json!(1));
    }

    #[test]
    fn record_written_before_the_ledger_is_carried() {
        let existing = json!({
            "team_id": "A",
            "gp": 4,
            "wins": 3,
            "losses": 1,
            "median_wins": 2,
            "median_losses": 2,
            "points_for": 400.0,
            "points_against": 300.0,
            "starter_mean_rank": 25.0
        });
        let game = team_game(&score("A", "g5", 120.0, 80.0, Some(true), true), &[]);
        let once = fold_team(Some(&existing), "A".into(), "S9".into(), game.clone()).unwrap();

        let record: SeasonalTeamRecord = serde_json::from_value(once.clone()).unwrap();
        assert_eq!(record.regular.gp, 5);
        assert_eq!(record.regular.wins, 4);
        assert_eq!(record.regular.median_wins, 3);
        assert!(approx_eq(record.regular.win_pct, 0.8, 1e-9));
        assert!(approx_eq(record.regular.points_for, 520.0, 1e-9));
        assert!(approx_eq(record.regular.starter_mean_rank, 25.0, 1e-9));
        assert!(approx_eq(record.regular.sort_score, 7.0 + 520.0 / 900.0, 1e-9));

        let again = fold_team(Some(&once), "A".into(), "S9".into(), game).unwrap();
        assert_eq!(once, again);
    }
}
