use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{LeagueError, Result};
use crate::models::{LeagueTable, MatchResult, Team, TeamStanding};

/// Zeroed table with one row per team, in roster order.
pub fn table_for_teams(teams: &[Team]) -> Result<LeagueTable> {
    let mut seen = HashSet::with_capacity(teams.len());
    let mut rows = Vec::with_capacity(teams.len());
    for team in teams {
        if !seen.insert(team.id) {
            return Err(LeagueError::DuplicateTeam { id: team.id });
        }
        rows.push(TeamStanding::new(team.id, team.name.clone()));
    }
    Ok(LeagueTable::new(rows))
}

/// Folds one result into the two matching rows; every other row is untouched.
///
/// Both teams must already have a row and must differ. A missing team is reported
/// with its id and the table is left unmodified.
pub fn apply_result(table: &mut LeagueTable, result: &MatchResult) -> Result<()> {
    check_distinct(result)?;
    let home = table.position(result.home_team_id);
    let away = table.position(result.away_team_id);
    let (Some(home), Some(away)) = (home, away) else {
        let mut ids = Vec::new();
        if home.is_none() {
            ids.push(result.home_team_id);
        }
        if away.is_none() {
            ids.push(result.away_team_id);
        }
        return Err(LeagueError::UnknownTeams { ids });
    };

    table.rows[home].record(result.home_goals, result.away_goals);
    table.rows[away].record(result.away_goals, result.home_goals);
    Ok(())
}

/// Rejects a result in which a team meets itself.
pub fn check_distinct(result: &MatchResult) -> Result<()> {
    if result.home_team_id == result.away_team_id {
        return Err(LeagueError::SelfMatch {
            team: result.home_team_id,
        });
    }
    Ok(())
}

/// Value-semantics variant of [`apply_result`]: the input table is not touched.
pub fn with_result(table: &LeagueTable, result: &MatchResult) -> Result<LeagueTable> {
    let mut next = table.clone();
    apply_result(&mut next, result)?;
    Ok(next)
}

/// Rebuilds standings from scratch by replaying results in week order.
///
/// Results within one week keep the order they were given in.
pub fn replay_results(teams: &[Team], results: &[MatchResult]) -> Result<LeagueTable> {
    let mut table = table_for_teams(teams)?;
    let mut ordered: Vec<&MatchResult> = results.iter().collect();
    ordered.sort_by_key(|m| m.week);
    for result in ordered {
        apply_result(&mut table, result)?;
    }
    Ok(table)
}

/// Champion: most points, then best goal difference. A full tie goes to whichever
/// team comes first in table order.
pub fn champion(table: &LeagueTable) -> Result<u32> {
    let mut rows = table.iter();
    let mut best = rows.next().ok_or(LeagueError::EmptyTable)?;
    for row in rows {
        if row.points > best.points || (row.points == best.points && row.goal_diff > best.goal_diff)
        {
            best = row;
        }
    }
    Ok(best.team_id)
}

/// Rows ordered for display: points, then goal difference. Equal rows keep table
/// order, matching the champion rule.
pub fn ranked(table: &LeagueTable) -> Vec<&TeamStanding> {
    let mut rows: Vec<&TeamStanding> = table.iter().collect();
    rows.sort_by(|a, b| compare_rows(a, b));
    rows
}

fn compare_rows(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(b.goal_diff.cmp(&a.goal_diff))
}
