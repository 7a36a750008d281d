// Games, their phase/completion state, and postseason stage labels.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::date::GameDate;

/// Completion flag on a game document. The schedule sheet writes the strings
/// `"FALSE"` and `"TRUE"`; nothing in between is modeled at this layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    #[default]
    #[serde(rename = "FALSE")]
    NotStarted,
    #[serde(rename = "TRUE")]
    Completed,
}

/// Which part of the season a game belongs to. Set when the game is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Regular,
    Postseason,
    Exhibition,
    AllStar,
}

impl Phase {
    /// Exhibition and All-Star games never feed daily or seasonal statistics.
    pub fn counts_toward_stats(&self) -> bool {
        matches!(self, Phase::Regular | Phase::Postseason)
    }

    /// Short tag used in ledger keys.
    pub fn slug(&self) -> &'static str {
        match self {
            Phase::Regular => "reg",
            Phase::Postseason => "post",
            Phase::Exhibition => "exh",
            Phase::AllStar => "asg",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Regular => "regular",
            Phase::Postseason => "postseason",
            Phase::Exhibition => "exhibition",
            Phase::AllStar => "all-star",
        };
        write!(f, "{s}")
    }
}

/// Named postseason stages, parsed from a postseason game's week label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PlayIn,
    Round1,
    Round2,
    ConferenceFinals,
    Finals,
    Relegation,
}

impl Stage {
    /// Parse a stage label. Case, spaces, and hyphens are ignored, so
    /// "Play-In", "play in" and "PLAYIN" are all the same stage. A leading
    /// "Playoffs" is dropped, and numbered rounds past the second name the
    /// conference finals (3) and the finals (4).
    pub fn from_label(label: &str) -> Option<Self> {
        let norm: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        let norm = norm
            .strip_prefix("playoffs")
            .or_else(|| norm.strip_prefix("playoff"))
            .unwrap_or(norm.as_str());
        match norm {
            "playin" => Some(Stage::PlayIn),
            "round1" | "firstround" | "wildcard" | "quarterfinal" | "quarterfinals" => {
                Some(Stage::Round1)
            }
            "round2" | "secondround" | "semifinal" | "semifinals" => Some(Stage::Round2),
            "round3" | "conferencefinal" | "conferencefinals" | "conffinals" => {
                Some(Stage::ConferenceFinals)
            }
            "round4" | "final" | "finals" | "rklfinals" | "championship" => Some(Stage::Finals),
            "relegation" => Some(Stage::Relegation),
            _ => None,
        }
    }

    /// Wins needed to take a series at this stage. Play-In games are single
    /// eliminations with no clinching count.
    pub fn series_threshold(&self) -> Option<u32> {
        match self {
            Stage::PlayIn | Stage::Relegation => None,
            Stage::Round1 | Stage::Round2 => Some(2),
            Stage::ConferenceFinals => Some(3),
            Stage::Finals => Some(4),
        }
    }

    /// Relegation games are played in the postseason window but are not a
    /// bracket series.
    pub fn tracks_series(&self) -> bool {
        !matches!(self, Stage::Relegation)
    }
}

/// One scheduled contest between two teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub season_id: String,
    /// Numeric week ("3") for regular-season games, a stage name for
    /// postseason games.
    pub week: String,
    #[serde(default)]
    pub phase: Phase,
    pub date: GameDate,
    pub team1_id: String,
    pub team2_id: String,
    #[serde(default)]
    pub team1_score: f64,
    #[serde(default)]
    pub team2_score: f64,
    #[serde(default)]
    pub completed: Completion,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    /// Running series wins keyed by team id.
    #[serde(default)]
    pub series_wins: BTreeMap<String, u32>,
    #[serde(default)]
    pub series_winner: Option<String>,
}

impl Game {
    pub fn is_completed(&self) -> bool {
        self.completed == Completion::Completed
    }

    pub fn week_number(&self) -> Option<u32> {
        self.week.trim().parse().ok()
    }

    pub fn stage(&self) -> Option<Stage> {
        Stage::from_label(&self.week)
    }

    pub fn has_team(&self, team_id: &str) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }

    /// Both sides of the game as `(team, score, opponent, opponent_score)`.
    pub fn sides(&self) -> [(&str, f64, &str, f64); 2] {
        [
            (&self.team1_id, self.team1_score, &self.team2_id, self.team2_score),
            (&self.team2_id, self.team2_score, &self.team1_id, self.team1_score),
        ]
    }
}
