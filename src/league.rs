use std::collections::HashMap;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LeagueError, Result};
use crate::generator::MatchGenerator;
use crate::models::{Fixture, LeagueTable, MatchResult, Team, UNRATED_STRENGTH};
use crate::sampler::Model;
use crate::schedule::next_week_checked;
use crate::simulator::{Prediction, SimulationConfig, simulate};
use crate::store::Repository;

const MIN_STRENGTH: u32 = 50;
const MAX_STRENGTH: u32 = 100;

/// How a fresh roster gets its strengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Init {
    /// Uniform in 50..=100.
    #[default]
    Random,
    /// Everyone at 75.
    Homogeneous,
}

impl FromStr for Init {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self> {
        // Anything but "homogeneous" falls back to random strengths.
        if s.trim().eq_ignore_ascii_case("homogeneous") {
            Ok(Init::Homogeneous)
        } else {
            Ok(Init::Random)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekResult {
    pub week: u32,
    pub fixtures: Vec<MatchResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayReport {
    pub simulated: Vec<WeekResult>,
    pub table: LeagueTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetReport {
    pub teams: Vec<Team>,
    pub table: LeagueTable,
}

/// League service: wires storage, the live match generator and the predictor.
pub struct League<R, G> {
    repo: R,
    generator: G,
}

impl<R: Repository, G: MatchGenerator> League<R, G> {
    pub fn new(repo: R, generator: G) -> Self {
        Self { repo, generator }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn teams(&self) -> Result<Vec<Team>> {
        self.repo.list_teams()
    }

    pub fn table(&self) -> Result<LeagueTable> {
        self.repo.get_table()
    }

    pub fn remaining(&self) -> Result<Vec<Fixture>> {
        self.repo.list_remaining_matches()
    }

    /// Wipes results and roster, then creates `count` teams named `Team 1..=count`.
    pub fn reset<Rn: Rng + ?Sized>(
        &mut self,
        count: usize,
        init: Init,
        rng: &mut Rn,
    ) -> Result<ResetReport> {
        if count < 2 || count % 2 != 0 {
            return Err(LeagueError::InvalidTeamCount { count });
        }
        self.repo.reset_matches()?;
        self.repo.reset_teams()?;

        for i in 1..=count {
            let strength = match init {
                Init::Homogeneous => UNRATED_STRENGTH,
                Init::Random => rng.gen_range(MIN_STRENGTH..=MAX_STRENGTH),
            };
            self.repo.save_team(&format!("Team {i}"), strength)?;
        }

        let teams = self.repo.list_teams()?;
        info!(teams = teams.len(), ?init, "league reset");
        let table = self.repo.get_table()?;
        Ok(ResetReport { teams, table })
    }

    /// Fixtures of the earliest unplayed week.
    pub fn next_fixtures(&self) -> Result<Vec<Fixture>> {
        let remaining = self.repo.list_remaining_matches()?;
        let played = self.repo.all_matches()?;
        next_week_checked(&remaining, &played)
    }

    pub fn simulate_week(&mut self) -> Result<PlayReport> {
        self.simulate_weeks(1)
    }

    /// Plays up to `weeks` weeks with the live generator; stops early when the
    /// season is over.
    pub fn simulate_weeks(&mut self, weeks: usize) -> Result<PlayReport> {
        let mut simulated = Vec::new();
        for _ in 0..weeks {
            match self.play_next_week()? {
                Some(week) => simulated.push(week),
                None => break,
            }
        }
        Ok(PlayReport {
            simulated,
            table: self.repo.get_table()?,
        })
    }

    pub fn simulate_all(&mut self) -> Result<PlayReport> {
        let mut simulated = Vec::new();
        while let Some(week) = self.play_next_week()? {
            simulated.push(week);
        }
        Ok(PlayReport {
            simulated,
            table: self.repo.get_table()?,
        })
    }

    fn play_next_week(&mut self) -> Result<Option<WeekResult>> {
        let fixtures = self.next_fixtures()?;
        let Some(first) = fixtures.first() else {
            return Ok(None);
        };
        let week = first.week;
        let teams: HashMap<u32, Team> = self
            .repo
            .list_teams()?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let mut played = Vec::with_capacity(fixtures.len());
        for f in &fixtures {
            let (Some(home), Some(away)) = (teams.get(&f.home_team_id), teams.get(&f.away_team_id))
            else {
                let ids = [f.home_team_id, f.away_team_id]
                    .into_iter()
                    .filter(|id| !teams.contains_key(id))
                    .collect();
                return Err(LeagueError::UnknownTeams { ids });
            };
            let mut result = self.generator.generate(home, away);
            result.week = f.week;
            self.repo.save_match(&result)?;
            played.push(result);
        }
        info!(week, fixtures = played.len(), "week played");
        Ok(Some(WeekResult {
            week,
            fixtures: played,
        }))
    }

    /// Champion probabilities for the rest of the stored season.
    pub fn predict(&self, model: Model, cfg: &SimulationConfig) -> Result<Prediction> {
        let teams = self.repo.list_teams()?;
        let table = self.repo.get_table()?;
        let remaining = self.repo.list_remaining_matches()?;
        simulate(&teams, &table, &remaining, model, cfg)
    }

    /// Corrects a recorded score and returns the re-derived table.
    pub fn edit_match(&mut self, result: &MatchResult) -> Result<LeagueTable> {
        self.repo.update_match(result)?;
        info!(
            week = result.week,
            home = result.home_team_id,
            away = result.away_team_id,
            "result corrected"
        );
        self.repo.get_table()
    }
}

/// Prediction for a league whose results come from elsewhere (e.g. a fixtures
/// provider) rather than from a [`Repository`].
///
/// With `week_limit`, only results up to that week count as played; later results
/// go back into the pool of fixtures to simulate, in week order.
pub fn predict_external(
    teams: &[Team],
    results: &[MatchResult],
    upcoming: &[Fixture],
    week_limit: Option<u32>,
    model: Model,
    cfg: &SimulationConfig,
) -> Result<Prediction> {
    let counts = |week: u32| week_limit.is_none_or(|limit| week <= limit);

    let played: Vec<MatchResult> = results.iter().filter(|m| counts(m.week)).copied().collect();
    let table = crate::standings::replay_results(teams, &played)?;

    let mut fixtures: Vec<Fixture> = results
        .iter()
        .filter(|m| !counts(m.week))
        .map(|m| Fixture::new(m.week, m.home_team_id, m.away_team_id))
        .chain(upcoming.iter().copied())
        .collect();
    fixtures.sort_by_key(|f| f.week);

    simulate(teams, &table, &fixtures, model, cfg)
}
