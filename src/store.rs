use std::collections::HashSet;

use crate::error::{LeagueError, Result};
use crate::models::{Fixture, LeagueTable, MatchResult, Team};
use crate::schedule::{generate_double_round_robin, played_keys, remaining_fixtures};
use crate::standings::{check_distinct, replay_results};

/// Persistence boundary for the league: roster plus played results.
///
/// Neither the schedule nor the table is stored; both are derived from these two
/// collections on demand.
pub trait Repository {
    /// Teams in id order.
    fn list_teams(&self) -> Result<Vec<Team>>;

    /// Inserts a team and returns it with its assigned id (1, 2, ... after a reset).
    fn save_team(&mut self, name: &str, strength: u32) -> Result<Team>;

    /// Records a played fixture. A second result for the same (week, home, away)
    /// is rejected with [`LeagueError::DuplicateMatch`].
    fn save_match(&mut self, result: &MatchResult) -> Result<()>;

    /// Replaces the score of an already recorded fixture.
    fn update_match(&mut self, result: &MatchResult) -> Result<()>;

    /// Played results in week order, then insertion order.
    fn all_matches(&self) -> Result<Vec<MatchResult>>;

    fn reset_matches(&mut self) -> Result<()>;

    /// Drops every team (and with them every result) and restarts id assignment.
    fn reset_teams(&mut self) -> Result<()>;

    /// Standings replayed from all recorded results onto a zeroed roster table.
    fn get_table(&self) -> Result<LeagueTable> {
        let teams = self.list_teams()?;
        let played = self.all_matches()?;
        replay_results(&teams, &played)
    }

    /// Full double round robin for the current roster minus what has been played.
    fn list_remaining_matches(&self) -> Result<Vec<Fixture>> {
        let teams = self.list_teams()?;
        let ids: Vec<u32> = teams.iter().map(|t| t.id).collect();
        let schedule = generate_double_round_robin(&ids)?;
        let played = played_keys(&self.all_matches()?);
        Ok(remaining_fixtures(&schedule, &played))
    }
}

/// In-process store, used by tests and for throwaway leagues.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    teams: Vec<Team>,
    matches: Vec<MatchResult>,
    next_team_id: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_teams(&self, result: &MatchResult) -> Result<()> {
        let known: HashSet<u32> = self.teams.iter().map(|t| t.id).collect();
        let mut ids = Vec::new();
        for id in [result.home_team_id, result.away_team_id] {
            if !known.contains(&id) && !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            Ok(())
        } else {
            Err(LeagueError::UnknownTeams { ids })
        }
    }
}

impl Repository for MemoryStore {
    fn list_teams(&self) -> Result<Vec<Team>> {
        let mut teams = self.teams.clone();
        teams.sort_by_key(|t| t.id);
        Ok(teams)
    }

    fn save_team(&mut self, name: &str, strength: u32) -> Result<Team> {
        self.next_team_id += 1;
        let team = Team::new(self.next_team_id, name, strength);
        self.teams.push(team.clone());
        Ok(team)
    }

    fn save_match(&mut self, result: &MatchResult) -> Result<()> {
        check_distinct(result)?;
        self.check_teams(result)?;
        if self.matches.iter().any(|m| m.key() == result.key()) {
            return Err(LeagueError::DuplicateMatch {
                week: result.week,
                home: result.home_team_id,
                away: result.away_team_id,
            });
        }
        self.matches.push(*result);
        Ok(())
    }

    fn update_match(&mut self, result: &MatchResult) -> Result<()> {
        let Some(existing) = self.matches.iter_mut().find(|m| m.key() == result.key()) else {
            return Err(LeagueError::MatchNotFound {
                week: result.week,
                home: result.home_team_id,
                away: result.away_team_id,
            });
        };
        existing.home_goals = result.home_goals;
        existing.away_goals = result.away_goals;
        Ok(())
    }

    fn all_matches(&self) -> Result<Vec<MatchResult>> {
        let mut out = self.matches.clone();
        out.sort_by_key(|m| m.week);
        Ok(out)
    }

    fn reset_matches(&mut self) -> Result<()> {
        self.matches.clear();
        Ok(())
    }

    fn reset_teams(&mut self) -> Result<()> {
        self.teams.clear();
        self.matches.clear();
        self.next_team_id = 0;
        Ok(())
    }
}
