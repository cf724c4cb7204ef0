use std::collections::HashSet;

use crate::error::{LeagueError, Result};
use crate::models::{BYE_ID, Fixture, FixtureKey, MatchResult};

/// Circle-method double round robin over `team_ids`, in the given order.
///
/// An odd roster gets the bye id appended; whoever meets the bye sits the week out.
/// The second half repeats the first with home and away swapped, offset by the
/// number of rounds. The output depends on input order.
pub fn generate_double_round_robin(team_ids: &[u32]) -> Result<Vec<Fixture>> {
    validate_ids(team_ids)?;
    if team_ids.len() < 2 {
        return Ok(Vec::new());
    }

    let mut ids = team_ids.to_vec();
    if ids.len() % 2 == 1 {
        ids.push(BYE_ID);
    }
    let n = ids.len();
    let rounds = (n - 1) as u32;

    let mut first = Vec::with_capacity(n / 2 * (n - 1));
    let mut slots = ids;
    for week in 1..=rounds {
        for i in 0..n / 2 {
            let (home, away) = (slots[i], slots[n - 1 - i]);
            if home != BYE_ID && away != BYE_ID {
                first.push(Fixture::new(week, home, away));
            }
        }
        // Slot 0 stays put; the last slot moves to the front of the rest.
        slots[1..].rotate_right(1);
    }

    let second = first
        .iter()
        .map(|f| Fixture::new(f.week + rounds, f.away_team_id, f.home_team_id))
        .collect::<Vec<_>>();
    first.extend(second);
    Ok(first)
}

fn validate_ids(team_ids: &[u32]) -> Result<()> {
    let mut seen = HashSet::with_capacity(team_ids.len());
    let mut bad = Vec::new();
    for id in team_ids {
        if *id == BYE_ID || !seen.insert(*id) {
            bad.push(*id);
        }
    }
    if bad.is_empty() {
        Ok(())
    } else {
        Err(LeagueError::InvalidTeamIds { ids: bad })
    }
}

pub fn played_keys(results: &[MatchResult]) -> HashSet<FixtureKey> {
    results.iter().map(MatchResult::key).collect()
}

/// Schedule minus the played keys, in schedule order.
pub fn remaining_fixtures(schedule: &[Fixture], played: &HashSet<FixtureKey>) -> Vec<Fixture> {
    schedule
        .iter()
        .filter(|f| !played.contains(&f.key()))
        .copied()
        .collect()
}

/// Leading run of `remaining` that shares the first fixture's week.
///
/// `remaining` must be week ordered; a fixture whose week is lower than the one
/// before it is reported as a [`LeagueError::WeekGap`]. Use [`next_week_checked`]
/// to also catch results recorded past the returned week.
pub fn next_week_fixtures(remaining: &[Fixture]) -> Result<Vec<Fixture>> {
    let Some(first) = remaining.first() else {
        return Ok(Vec::new());
    };
    let week = first.week;

    let mut prev = week;
    for f in remaining {
        if f.week < prev {
            return Err(LeagueError::WeekGap {
                expected: f.week,
                found: prev,
            });
        }
        prev = f.week;
    }

    Ok(remaining
        .iter()
        .take_while(|f| f.week == week)
        .copied()
        .collect())
}

/// Like [`next_week_fixtures`], but also checks that nothing was played beyond
/// the week about to be played.
pub fn next_week_checked(remaining: &[Fixture], played: &[MatchResult]) -> Result<Vec<Fixture>> {
    let next = next_week_fixtures(remaining)?;
    if let Some(first) = next.first() {
        if let Some(latest) = played.iter().map(|m| m.week).max() {
            if latest > first.week {
                return Err(LeagueError::WeekGap {
                    expected: first.week,
                    found: latest,
                });
            }
        }
    }
    Ok(next)
}

/// Number of weeks in a double round robin for `team_count` teams.
pub fn total_weeks(team_count: usize) -> u32 {
    if team_count < 2 {
        return 0;
    }
    let padded = team_count + team_count % 2;
    2 * (padded as u32 - 1)
}
