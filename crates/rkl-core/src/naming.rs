// Collection naming. Major/minor leagues and production/development data are
// partitioned by collection name, so every path is resolved through a
// `NameResolver` built from configuration rather than hardcoded.

use serde::Deserialize;

use crate::model::game::Phase;
use crate::store::DocPath;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum League {
    #[default]
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// Logical collection names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Seasons,
    Games,
    PostGames,
    ExhibitionGames,
    Lineups,
    PostLineups,
    Averages,
    PostAverages,
    DailyScores,
    PostDailyScores,
    Players,
    Teams,
    SeasonalStats,
    SeasonalRecords,
}

impl Collection {
    pub fn base_name(&self) -> &'static str {
        match self {
            Collection::Seasons => "seasons",
            Collection::Games => "games",
            Collection::PostGames => "post",
            Collection::ExhibitionGames => "exhibition",
            Collection::Lineups => "lineups",
            Collection::PostLineups => "post_lineups",
            Collection::Averages => "averages",
            Collection::PostAverages => "post_averages",
            Collection::DailyScores => "daily_scores",
            Collection::PostDailyScores => "post_daily_scores",
            Collection::Players => "players",
            Collection::Teams => "teams",
            Collection::SeasonalStats => "seasonal_stats",
            Collection::SeasonalRecords => "seasonal_records",
        }
    }

    /// Top-level collections carry the league/environment decoration;
    /// sub-collections inherit the partition from their parent.
    pub fn is_root(&self) -> bool {
        matches!(self, Collection::Seasons | Collection::Players | Collection::Teams)
    }

    pub fn games(phase: Phase) -> Collection {
        match phase {
            Phase::Regular => Collection::Games,
            Phase::Postseason => Collection::PostGames,
            Phase::Exhibition | Phase::AllStar => Collection::ExhibitionGames,
        }
    }

    /// Lineups, averages and daily scores exist only for phases that count
    /// toward statistics.
    pub fn lineups(phase: Phase) -> Option<Collection> {
        match phase {
            Phase::Regular => Some(Collection::Lineups),
            Phase::Postseason => Some(Collection::PostLineups),
            _ => None,
        }
    }

    pub fn averages(phase: Phase) -> Option<Collection> {
        match phase {
            Phase::Regular => Some(Collection::Averages),
            Phase::Postseason => Some(Collection::PostAverages),
            _ => None,
        }
    }

    pub fn daily_scores(phase: Phase) -> Option<Collection> {
        match phase {
            Phase::Regular => Some(Collection::DailyScores),
            Phase::Postseason => Some(Collection::PostDailyScores),
            _ => None,
        }
    }
}

/// Resolves a logical collection to its concrete name.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, collection: Collection) -> String;
}

/// The standard resolver: `minor_` prefix for the minor league, `_dev`
/// suffix outside production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeagueNaming {
    pub league: League,
    pub environment: Environment,
}

impl LeagueNaming {
    pub fn new(league: League, environment: Environment) -> Self {
        LeagueNaming { league, environment }
    }
}

impl NameResolver for LeagueNaming {
    fn resolve(&self, collection: Collection) -> String {
        let base = collection.base_name();
        if !collection.is_root() {
            return base.to_string();
        }
        let prefix = match self.league {
            League::Major => "",
            League::Minor => "minor_",
        };
        let suffix = match self.environment {
            Environment::Production => "",
            Environment::Development => "_dev",
        };
        format!("{prefix}{base}{suffix}")
    }
}

/// Builds concrete collection paths and document paths for one invocation.
#[derive(Clone, Copy)]
pub struct Paths<'a> {
    names: &'a dyn NameResolver,
}

impl<'a> Paths<'a> {
    pub fn new(names: &'a dyn NameResolver) -> Self {
        Paths { names }
    }

    fn name(&self, collection: Collection) -> String {
        self.names.resolve(collection)
    }

    fn season_child(&self, season_id: &str, child: Collection) -> String {
        format!("{}/{season_id}/{}", self.name(Collection::Seasons), self.name(child))
    }

    pub fn season(&self, season_id: &str) -> DocPath {
        DocPath::new(self.name(Collection::Seasons), season_id)
    }

    pub fn games(&self, season_id: &str, phase: Phase) -> String {
        self.season_child(season_id, Collection::games(phase))
    }

    pub fn game(&self, season_id: &str, phase: Phase, game_id: &str) -> DocPath {
        DocPath::new(self.games(season_id, phase), game_id)
    }

    pub fn lineups(&self, season_id: &str, phase: Phase) -> Option<String> {
        Collection::lineups(phase).map(|c| self.season_child(season_id, c))
    }

    pub fn averages(&self, season_id: &str, phase: Phase) -> Option<String> {
        Collection::averages(phase).map(|c| self.season_child(season_id, c))
    }

    pub fn daily_scores(&self, season_id: &str, phase: Phase) -> Option<String> {
        Collection::daily_scores(phase).map(|c| self.season_child(season_id, c))
    }

    pub fn seasonal_stats(&self, player_id: &str, season_id: &str) -> DocPath {
        DocPath::new(
            format!(
                "{}/{player_id}/{}",
                self.name(Collection::Players),
                self.name(Collection::SeasonalStats)
            ),
            season_id,
        )
    }

    pub fn seasonal_record(&self, team_id: &str, season_id: &str) -> DocPath {
        DocPath::new(
            format!(
                "{}/{team_id}/{}",
                self.name(Collection::Teams),
                self.name(Collection::SeasonalRecords)
            ),
            season_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_production_is_undecorated() {
        let naming = LeagueNaming::default();
        assert_eq!(naming.resolve(Collection::Seasons), "seasons");
        assert_eq!(naming.resolve(Collection::Lineups), "lineups");
    }

    #[test]
    fn minor_development_decorates_roots_only() {
        let naming = LeagueNaming::new(League::Minor, Environment::Development);
        assert_eq!(naming.resolve(Collection::Seasons), "minor_seasons_dev");
        assert_eq!(naming.resolve(Collection::Players), "minor_players_dev");
        assert_eq!(naming.resolve(Collection::PostLineups), "post_lineups");
    }

    #[test]
    fn paths_follow_phase() {
        let naming = LeagueNaming::new(League::Minor, Environment::Production);
        let paths = Paths::new(&naming);
        assert_eq!(paths.games("S9", Phase::Regular), "minor_seasons/S9/games");
        assert_eq!(paths.games("S9", Phase::Postseason), "minor_seasons/S9/post");
        assert_eq!(
            paths.lineups("S9", Phase::Postseason).as_deref(),
            Some("minor_seasons/S9/post_lineups")
        );
        assert!(paths.lineups("S9", Phase::AllStar).is_none());
        assert_eq!(
            paths.seasonal_stats("p1", "S9").to_string(),
            "minor_players/p1/seasonal_stats/S9"
        );
    }

    struct Fixed;

    impl NameResolver for Fixed {
        fn resolve(&self, collection: Collection) -> String {
            format!("x_{}", collection.base_name())
        }
    }

    #[test]
    fn custom_resolver_is_used_for_every_segment() {
        let paths = Paths::new(&Fixed);
        assert_eq!(paths.averages("S1", Phase::Regular).as_deref(), Some("x_seasons/S1/x_averages"));
        assert_eq!(paths.seasonal_record("t1", "S1").collection, "x_teams/t1/x_seasonal_records");
    }
}
