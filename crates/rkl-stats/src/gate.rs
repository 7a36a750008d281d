// Game-Completion Gate.
//
// Downstream aggregation runs only once every game scheduled on the same date
// (regular and postseason) is complete. Each completed game triggers its own
// invocation; all but the one that sees a fully completed day defer. This is
// an optimistic read, not a lock: two invocations can both see a complete day,
// which is tolerated because aggregation overwrites rather than appends.

use tracing::debug;

use rkl_core::model::date::GameDate;
use rkl_core::model::game::{Game, Phase};
use rkl_core::naming::Paths;
use rkl_core::store::{DocPath, DocumentStore, StoreError};

/// Phases whose games gate a day's statistics.
const GATED_PHASES: [Phase; 2] = [Phase::Regular, Phase::Postseason];

/// A game scheduled on the day being checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledGame {
    pub path: DocPath,
    pub game: Game,
}

impl ScheduledGame {
    pub fn id(&self) -> &str {
        &self.path.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Defer { incomplete: usize },
}

/// Fetch every regular and postseason game on `date` in the season. The
/// triggering game's in-memory state replaces its stored copy, so a stale
/// read of the document that just changed cannot hold the gate shut.
pub fn same_day_games<S: DocumentStore + ?Sized>(
    store: &S,
    paths: &Paths<'_>,
    season_id: &str,
    date: GameDate,
    trigger: &ScheduledGame,
) -> Result<Vec<ScheduledGame>, StoreError> {
    let mut games = Vec::new();
    for phase in GATED_PHASES {
        let collection = paths.games(season_id, phase);
        for doc in store.query(&collection, &[])? {
            if doc.path == trigger.path || !date.matches_field(&doc.data, "date") {
                continue;
            }
            games.push(ScheduledGame {
                game: doc.decode()?,
                path: doc.path,
            });
        }
    }
    games.push(trigger.clone());
    games.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("{} games scheduled on {date}", games.len());
    Ok(games)
}

/// Number of games that have not reached the completed state.
pub fn incomplete_count(games: &[ScheduledGame]) -> usize {
    games.iter().filter(|g| !g.game.is_completed()).count()
}

pub fn decide(games: &[ScheduledGame]) -> GateDecision {
    match incomplete_count(games) {
        0 => GateDecision::Proceed,
        incomplete => GateDecision::Defer { incomplete },
    }
}
