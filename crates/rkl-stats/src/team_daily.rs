// Daily Team Scores. Every team score posted on the day shares one median,
// computed across all of the day's games rather than per game.

use rkl_core::model::daily::DailyTeamScore;
use rkl_core::naming::Paths;
use rkl_core::store::{DocPath, StoreError, WriteBatch};

use crate::gate::ScheduledGame;
use crate::stats::{median, pct_above};

/// Build one `DailyTeamScore` per (team, game) for the day's games.
pub fn compute_team_scores(games: &[ScheduledGame]) -> Vec<DailyTeamScore> {
    let all_scores: Vec<f64> = games
        .iter()
        .flat_map(|g| [g.game.team1_score, g.game.team2_score])
        .collect();
    let team_median = median(&all_scores);

    games
        .iter()
        .flat_map(|scheduled| {
            let game = &scheduled.game;
            game.sides().map(|(team, score, opponent, opponent_score)| {
                let above_median = score - team_median;
                DailyTeamScore {
                    team_id: team.to_string(),
                    opponent_id: opponent.to_string(),
                    game_id: scheduled.id().to_string(),
                    week: game.week.clone(),
                    date: game.date,
                    phase: game.phase,
                    score,
                    opponent_score,
                    won: game.winner.as_deref().map(|w| w == team),
                    team_median,
                    above_median,
                    is_above_median: above_median > 0.0,
                    pct_above_median: pct_above(score, team_median),
                }
            })
        })
        .collect()
}

/// Stage every score as a merge-write keyed `{team}-{game}` in the daily
/// scores collection of its game's phase.
pub fn stage_writes(
    batch: &mut WriteBatch,
    paths: &Paths<'_>,
    season_id: &str,
    scores: &[DailyTeamScore],
) -> Result<(), StoreError> {
    for score in scores {
        let Some(collection) = paths.daily_scores(season_id, score.phase) else {
            continue;
        };
        batch.merge(DocPath::new(collection, score.key()), serde_json::to_value(score)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkl_core::model::date::GameDate;
    use rkl_core::model::game::{Completion, Game, Phase};
    use std::collections::BTreeMap;

    fn scheduled(id: &str, t1: &str, s1: f64, t2: &str, s2: f64) -> ScheduledGame {
        ScheduledGame {
            path: DocPath::new("seasons/S9/games", id),
            game: Game {
                season_id: "S9".into(),
                week: "3".into(),
                phase: Phase::Regular,
                date: GameDate::from_ymd(2025, 3, 15).unwrap(),
                team1_id: t1.into(),
                team2_id: t2.into(),
                team1_score: s1,
                team2_score: s2,
                completed: Completion::Completed,
                winner: Some((if s1 >= s2 { t1 } else { t2 }).to_string()),
                series_id: None,
                series_wins: BTreeMap::new(),
                series_winner: None,
            },
        }
    }

    #[test]
    fn all_teams_share_one_median() {
        let games = vec![
            scheduled("g1", "A", 100.0, "B", 200.0),
            scheduled("g2", "C", 300.0, "D", 400.0),
            scheduled("g3", "E", 500.0, "F", 600.0),
        ];
        let scores = compute_team_scores(&games);
        assert_eq!(scores.len(), 6);
        assert!(scores.iter().all(|s| s.team_median == 350.0));

        let a = scores.iter().find(|s| s.team_id == "A").unwrap();
        assert_eq!(a.key(), "A-g1");
        assert_eq!(a.above_median, -250.0);
        assert!(!a.is_above_median);
        assert_eq!(a.won, Some(false));
        assert_eq!(a.opponent_id, "B");

        let f = scores.iter().find(|s| s.team_id == "F").unwrap();
        assert!(f.is_above_median);
        assert_eq!(f.won, Some(true));
    }

    #[test]
    fn missing_winner_leaves_result_open() {
        let mut game = scheduled("g1", "A", 10.0, "B", 10.0);
        game.game.winner = None;
        let scores = compute_team_scores(&[game]);
        assert!(scores.iter().all(|s| s.won.is_none()));
    }
}
