// Series Progression Tracker for postseason bracket games.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, info, warn};

use rkl_core::model::game::{Game, Phase};
use rkl_core::naming::Paths;
use rkl_core::store::{DocPath, DocumentStore, StoreError, WriteBatch};

/// What happened to the series when a game completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesUpdate {
    /// Not a bracket game (regular season, relegation).
    NotTracked,
    /// No usable winner on the game; nothing to record yet.
    NoWinner,
    Advanced {
        wins: BTreeMap<String, u32>,
        series_winner: Option<String>,
    },
}

/// Credit the game's winner with a series win and decide the series when a
/// team reaches its stage's threshold. Mutates `game` so later steps see the
/// updated counts.
pub fn advance(game: &mut Game) -> SeriesUpdate {
    if game.phase != Phase::Postseason {
        return SeriesUpdate::NotTracked;
    }
    let stage = game.stage();
    if stage.is_some_and(|s| !s.tracks_series()) {
        return SeriesUpdate::NotTracked;
    }

    let Some(winner) = game.winner.clone() else {
        debug!("postseason game in {} has no winner; series unchanged", game.week);
        return SeriesUpdate::NoWinner;
    };
    if !game.has_team(&winner) {
        warn!(
            "winner {winner} is not a participant ({} vs {}); series unchanged",
            game.team1_id, game.team2_id
        );
        return SeriesUpdate::NoWinner;
    }

    game.series_wins.entry(game.team1_id.clone()).or_insert(0);
    game.series_wins.entry(game.team2_id.clone()).or_insert(0);
    *game.series_wins.entry(winner).or_insert(0) += 1;

    let threshold = match stage {
        Some(stage) => stage.series_threshold(),
        None => {
            warn!("unrecognized postseason stage `{}`; no clinch threshold", game.week);
            None
        }
    };

    if game.series_winner.is_none() {
        if let Some(needed) = threshold {
            game.series_winner = game
                .series_wins
                .iter()
                .find(|(_, wins)| **wins >= needed)
                .map(|(team, _)| team.clone());
            if let Some(team) = &game.series_winner {
                info!("{team} wins the {} series", game.week);
            }
        }
    }

    SeriesUpdate::Advanced {
        wins: game.series_wins.clone(),
        series_winner: game.series_winner.clone(),
    }
}

/// Stage the series state onto the triggering game and every other game that
/// shares its series id. Returns how many sibling games were updated.
pub fn stage_writes<S: DocumentStore + ?Sized>(
    store: &S,
    batch: &mut WriteBatch,
    paths: &Paths<'_>,
    game_path: &DocPath,
    game: &Game,
) -> Result<usize, StoreError> {
    let patch = json!({
        "series_wins": game.series_wins,
        "series_winner": game.series_winner,
    });
    batch.merge(game_path.clone(), patch.clone());

    let Some(series_id) = game.series_id.as_deref() else {
        return Ok(0);
    };
    let collection = paths.games(&game.season_id, Phase::Postseason);
    let siblings = store.query(&collection, &[("series_id", json!(series_id))])?;
    let mut updated = 0;
    for doc in siblings.into_iter().filter(|d| &d.path != game_path) {
        batch.merge(doc.path, patch.clone());
        updated += 1;
    }
    Ok(updated)
}
