use serde::{Deserialize, Serialize};

/// Strength given to teams imported from an external provider, where no rating exists.
pub const UNRATED_STRENGTH: u32 = 75;

/// Reserved team id standing in for "no opponent" when the team count is odd.
pub const BYE_ID: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    // Higher = stronger. Conventionally 50..=100.
    pub strength: u32,
}

impl Team {
    pub fn new(id: u32, name: impl Into<String>, strength: u32) -> Self {
        Self {
            id,
            name: name.into(),
            strength,
        }
    }
}

/// A scheduled pairing that has not been played yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fixture {
    pub week: u32,
    pub home_team_id: u32,
    pub away_team_id: u32,
}

impl Fixture {
    pub fn new(week: u32, home_team_id: u32, away_team_id: u32) -> Self {
        Self {
            week,
            home_team_id,
            away_team_id,
        }
    }

    pub fn key(&self) -> FixtureKey {
        FixtureKey {
            week: self.week,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
        }
    }

    pub fn with_score(&self, home_goals: u32, away_goals: u32) -> MatchResult {
        MatchResult {
            week: self.week,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            home_goals,
            away_goals,
        }
    }
}

/// Identity of a fixture: (week, home, away).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FixtureKey {
    pub week: u32,
    pub home_team_id: u32,
    pub away_team_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub week: u32,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl MatchResult {
    pub fn key(&self) -> FixtureKey {
        FixtureKey {
            week: self.week,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: u32,
    pub team_name: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i32,
    pub points: u32,
}

impl TeamStanding {
    pub fn new(team_id: u32, team_name: impl Into<String>) -> Self {
        Self {
            team_id,
            team_name: team_name.into(),
            ..Self::default()
        }
    }

    /// Folds one match from this team's point of view.
    pub fn record(&mut self, goals_for: u32, goals_against: u32) {
        self.played += 1;
        self.goals_for += goals_for;
        self.goals_against += goals_against;
        self.goal_diff = self.goals_for as i32 - self.goals_against as i32;
        if goals_for > goals_against {
            self.won += 1;
            self.points += 3;
        } else if goals_for == goals_against {
            self.drawn += 1;
            self.points += 1;
        } else {
            self.lost += 1;
        }
    }
}

/// League standings, one row per team, in roster order.
///
/// Row order carries no ranking meaning, but it is the final tie-break when
/// picking a champion, so it must stay stable for a given roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueTable {
    pub rows: Vec<TeamStanding>,
}

impl LeagueTable {
    pub fn new(rows: Vec<TeamStanding>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, team_id: u32) -> Option<&TeamStanding> {
        self.rows.iter().find(|row| row.team_id == team_id)
    }

    pub fn position(&self, team_id: u32) -> Option<usize> {
        self.rows.iter().position(|row| row.team_id == team_id)
    }

    pub fn contains(&self, team_id: u32) -> bool {
        self.position(team_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamStanding> {
        self.rows.iter()
    }
}
