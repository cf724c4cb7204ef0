use thiserror::Error;

pub type Result<T, E = LeagueError> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeagueError {
    #[error("trial count must be at least 1")]
    InvalidTrials,

    #[error("team count must be an even number >= 2 (got {count})")]
    InvalidTeamCount { count: usize },

    #[error("invalid team ids for scheduling: {ids:?} (0 is reserved, ids must be unique)")]
    InvalidTeamIds { ids: Vec<u32> },

    #[error("unknown team ids: {ids:?}")]
    UnknownTeams { ids: Vec<u32> },

    #[error("team {team} cannot play itself")]
    SelfMatch { team: u32 },

    #[error("duplicate team id {id} in table")]
    DuplicateTeam { id: u32 },

    #[error("week {expected} must be finished before week {found}")]
    WeekGap { expected: u32, found: u32 },

    #[error("result already recorded for week {week}: {home} vs {away}")]
    DuplicateMatch { week: u32, home: u32, away: u32 },

    #[error("no recorded result for week {week}: {home} vs {away}")]
    MatchNotFound { week: u32, home: u32, away: u32 },

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("simulation stopped after {completed} trials")]
    Cancelled { completed: usize },

    #[error("league table is empty")]
    EmptyTable,

    #[error("storage: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for LeagueError {
    fn from(err: rusqlite::Error) -> Self {
        LeagueError::Storage(err.to_string())
    }
}
