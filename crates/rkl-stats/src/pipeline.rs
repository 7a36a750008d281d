// One invocation of the game-completion cascade.
//
// Flow: completion check, series progression, same-day gate, daily
// aggregation, team scores, seasonal folds, season counters. Every write is
// staged into one batch and committed once; a deferral or an empty day
// commits only what was staged so far.

use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};

use rkl_core::model::daily::DailyBaseline;
use rkl_core::model::date::GameDate;
use rkl_core::model::event::GameWriteEvent;
use rkl_core::model::game::{Game, Phase};
use rkl_core::model::lineup::LineupEntry;
use rkl_core::model::season::SeasonDay;
use rkl_core::naming::{NameResolver, Paths};
use rkl_core::store::{DocPath, DocumentStore, StoreError, WriteBatch};

use crate::cascade::{self, day_key};
use crate::daily::{self, aggregate_day};
use crate::gate::{self, GateDecision, ScheduledGame};
use crate::series::{self, SeriesUpdate};
use crate::team_daily;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no {collection} collection for {phase} games")]
    MissingCollection {
        collection: &'static str,
        phase: Phase,
    },
}

/// What a day's aggregation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: GameDate,
    pub phase: Phase,
    pub games: usize,
    pub player_count: usize,
    pub baseline: DailyBaseline,
    pub team_scores: usize,
    pub karma: f64,
}

/// Which branch an invocation took.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The write was not a transition into the completed state.
    Ignored,
    /// Exhibition and All-Star games do not feed statistics.
    Excluded,
    /// Other games on the same day are still open.
    Deferred { incomplete: usize },
    /// The day is complete but nobody started.
    NoLineups,
    Aggregated(DaySummary),
}

pub struct Pipeline<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    paths: Paths<'a>,
}

impl<'a, S: DocumentStore + ?Sized> Pipeline<'a, S> {
    pub fn new(store: &'a S, names: &'a dyn NameResolver) -> Self {
        Pipeline {
            store,
            paths: Paths::new(names),
        }
    }

    /// Handle one game write. Failures are logged with the game and date
    /// before being returned; nothing is retried here.
    pub fn handle(&self, event: &GameWriteEvent) -> Result<Outcome, PipelineError> {
        self.run(event).inspect_err(|e| {
            let date = event
                .after
                .as_ref()
                .map(|g| g.date.to_string())
                .unwrap_or_else(|| "unknown date".to_string());
            error!(
                "stats cascade failed for game {} in season {} on {date}: {e}",
                event.game_id, event.season_id
            );
        })
    }

    fn run(&self, event: &GameWriteEvent) -> Result<Outcome, PipelineError> {
        let after = match &event.after {
            Some(after) if event.became_completed() => after,
            _ => {
                debug!("game {} write is not a completion; ignoring", event.game_id);
                return Ok(Outcome::Ignored);
            }
        };
        if !after.phase.counts_toward_stats() {
            info!("game {} is {}; excluded from statistics", event.game_id, after.phase);
            return Ok(Outcome::Excluded);
        }

        let season_id = event.season_id.as_str();
        let mut game = after.clone();
        let phase = game.phase;
        let date = game.date;
        let game_path = self.paths.game(season_id, phase, &event.game_id);
        info!("game {} completed ({phase}, {date}, season {season_id})", event.game_id);

        let mut batch = WriteBatch::new();
        self.stage_series(&mut batch, &game_path, &mut game)?;

        // Gate
        let trigger = ScheduledGame {
            path: game_path,
            game: game.clone(),
        };
        let day_games = gate::same_day_games(self.store, &self.paths, season_id, date, &trigger)?;
        if let GateDecision::Defer { incomplete } = gate::decide(&day_games) {
            info!("{incomplete} of {} games on {date} still open; deferring", day_games.len());
            self.commit_partial(batch)?;
            return Ok(Outcome::Deferred { incomplete });
        }

        let lineups = self.started_entries(season_id, phase, date)?;
        if lineups.is_empty() {
            info!("no started lineup entries on {date}; nothing to aggregate");
            self.commit_partial(batch)?;
            return Ok(Outcome::NoLineups);
        }

        // Daily baseline and per-entry metrics
        let aggregate = aggregate_day(date, &game.week, lineups);
        let averages = self
            .paths
            .averages(season_id, phase)
            .ok_or(PipelineError::MissingCollection {
                collection: "averages",
                phase,
            })?;
        daily::stage_writes(&mut batch, DocPath::new(averages, date.key()), &aggregate)?;

        // Team scores and seasonal records
        let scores = team_daily::compute_team_scores(&day_games);
        team_daily::stage_writes(&mut batch, &self.paths, season_id, &scores)?;
        cascade::team::stage_writes(&mut batch, &self.paths, season_id, &scores, &aggregate.entries);

        // Seasonal player stats
        let players = cascade::player::stage_writes(&mut batch, &self.paths, season_id, phase, &aggregate);

        // Season counters
        let karma = aggregate.total_points();
        let week = match phase {
            Phase::Regular => game.week_number(),
            _ => None,
        };
        cascade::season::stage_writes(
            &mut batch,
            self.paths.season(season_id),
            day_key(phase, date),
            SeasonDay {
                gp: day_games.len() as u32,
                karma,
            },
            week,
        );

        let writes = self.store.commit(batch)?;
        info!(
            "aggregated {date}: {} games, {players} players, {} team scores, karma {karma:.1} ({writes} writes)",
            day_games.len(),
            scores.len()
        );

        Ok(Outcome::Aggregated(DaySummary {
            date,
            phase,
            games: day_games.len(),
            player_count: aggregate.entries.len(),
            baseline: aggregate.baseline,
            team_scores: scores.len(),
            karma,
        }))
    }

    /// Advance a postseason series and stage the new state onto every game in
    /// it. `game` is updated in place so the gate sees the same state.
    fn stage_series(
        &self,
        batch: &mut WriteBatch,
        game_path: &DocPath,
        game: &mut Game,
    ) -> Result<(), PipelineError> {
        match series::advance(game) {
            SeriesUpdate::Advanced { wins, series_winner } => {
                let siblings = series::stage_writes(self.store, batch, &self.paths, game_path, game)?;
                debug!(
                    "series {:?} now {wins:?}, winner {series_winner:?} ({siblings} sibling games)",
                    game.series_id
                );
            }
            SeriesUpdate::NoWinner => debug!("no winner on {game_path}; series unchanged"),
            SeriesUpdate::NotTracked => {}
        }
        Ok(())
    }

    fn started_entries(
        &self,
        season_id: &str,
        phase: Phase,
        date: GameDate,
    ) -> Result<Vec<(DocPath, LineupEntry)>, PipelineError> {
        let collection = self
            .paths
            .lineups(season_id, phase)
            .ok_or(PipelineError::MissingCollection {
                collection: "lineups",
                phase,
            })?;
        let docs = self
            .store
            .query(&collection, &[("started", json!(true))])?;
        docs.into_iter()
            .filter(|doc| date.matches_field(&doc.data, "date"))
            .map(|doc| {
                let entry: LineupEntry = doc.decode()?;
                Ok::<_, PipelineError>((doc.path, entry))
            })
            .collect()
    }

    fn commit_partial(&self, batch: WriteBatch) -> Result<(), PipelineError> {
        if !batch.is_empty() {
            let writes = self.store.commit(batch)?;
            debug!("committed {writes} partial writes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rkl_core::db::Database;
    use rkl_core::model::game::Completion;
    use rkl_core::naming::LeagueNaming;
    use std::collections::BTreeMap;

    fn game(phase: Phase, completed: Completion) -> Game {
        Game {
            season_id: "S9".into(),
            week: "1".into(),
            phase,
            date: GameDate::from_ymd(2025, 3, 15).unwrap(),
            team1_id: "A".into(),
            team2_id: "B".into(),
            team1_score: 10.0,
            team2_score: 20.0,
            completed,
            winner: Some("B".into()),
            series_id: None,
            series_wins: BTreeMap::new(),
            series_winner: None,
        }
    }

    fn event(before: Option<Game>, after: Option<Game>) -> GameWriteEvent {
        GameWriteEvent {
            season_id: "S9".into(),
            game_id: "g1".into(),
            before,
            after,
        }
    }

    #[test]
    fn non_transitions_are_ignored() {
        let db = Database::open(":memory:").unwrap();
        let naming = LeagueNaming::default();
        let pipeline = Pipeline::new(&db, &naming);

        let score_edit = event(
            Some(game(Phase::Regular, Completion::NotStarted)),
            Some(game(Phase::Regular, Completion::NotStarted)),
        );
        assert_eq!(pipeline.handle(&score_edit).unwrap(), Outcome::Ignored);

        let redelivery = event(
            Some(game(Phase::Regular, Completion::Completed)),
            Some(game(Phase::Regular, Completion::Completed)),
        );
        assert_eq!(pipeline.handle(&redelivery).unwrap(), Outcome::Ignored);

        let deleted = event(Some(game(Phase::Regular, Completion::Completed)), None);
        assert_eq!(pipeline.handle(&deleted).unwrap(), Outcome::Ignored);
    }

    #[test]
    fn exhibition_and_all_star_are_excluded() {
        let db = Database::open(":memory:").unwrap();
        let naming = LeagueNaming::default();
        let pipeline = Pipeline::new(&db, &naming);

        for phase in [Phase::Exhibition, Phase::AllStar] {
            let e = event(
                Some(game(phase, Completion::NotStarted)),
                Some(game(phase, Completion::Completed)),
            );
            assert_eq!(pipeline.handle(&e).unwrap(), Outcome::Excluded);
        }
        assert_eq!(db.count("seasons").unwrap(), 0);
    }

    #[test]
    fn complete_day_without_lineups_commits_nothing_else() {
        let db = Database::open(":memory:").unwrap();
        let naming = LeagueNaming::default();
        let pipeline = Pipeline::new(&db, &naming);

        let e = event(None, Some(game(Phase::Regular, Completion::Completed)));
        assert_eq!(pipeline.handle(&e).unwrap(), Outcome::NoLineups);
        assert_eq!(db.count("seasons/S9/averages").unwrap(), 0);
        assert_eq!(db.count("seasons").unwrap(), 0);
    }
}
