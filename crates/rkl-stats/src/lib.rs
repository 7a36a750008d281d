// Game-completion statistics cascade: gate, daily baselines, series
// progression, and seasonal folds for players, teams, and the season.

pub mod cascade;
pub mod daily;
pub mod gate;
pub mod pipeline;
pub mod series;
pub mod stats;
pub mod team_daily;
