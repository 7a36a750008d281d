// Trigger payload delivered whenever a game document is written.

use serde::{Deserialize, Serialize};

use super::game::Game;

/// Before/after snapshots of one game document write. `before` is absent on
/// create and `after` is absent on delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameWriteEvent {
    pub season_id: String,
    pub game_id: String,
    #[serde(default)]
    pub before: Option<Game>,
    #[serde(default)]
    pub after: Option<Game>,
}

impl GameWriteEvent {
    /// True when this write moved the game into the terminal completed state.
    /// A redelivered event whose `before` already shows completion is not a
    /// transition.
    pub fn became_completed(&self) -> bool {
        let was_complete = self.before.as_ref().is_some_and(Game::is_completed);
        let is_complete = self.after.as_ref().is_some_and(Game::is_completed);
        is_complete && !was_complete
    }
}
