use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use tracing::debug;

use crate::error::{LeagueError, Result};
use crate::models::{MatchResult, Team};
use crate::standings::check_distinct;
use crate::store::Repository;

/// SQLite-backed league store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened league db");
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn missing_teams(&self, result: &MatchResult) -> Result<Vec<u32>> {
        let mut missing = Vec::new();
        for id in [result.home_team_id, result.away_team_id] {
            let found = self
                .conn
                .query_row("SELECT 1 FROM teams WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?;
            if found.is_none() && !missing.contains(&id) {
                missing.push(id);
            }
        }
        Ok(missing)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            strength INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            week INTEGER NOT NULL,
            home_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            away_team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            recorded_at TEXT NOT NULL,
            updated_at TEXT NULL,
            UNIQUE (week, home_team_id, away_team_id)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(week);
        "#,
    )?;
    Ok(())
}

impl Repository for SqliteStore {
    fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, strength FROM teams ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Team {
                id: row.get::<_, u32>(0)?,
                name: row.get(1)?,
                strength: row.get::<_, u32>(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn save_team(&mut self, name: &str, strength: u32) -> Result<Team> {
        self.conn.execute(
            "INSERT INTO teams (name, strength) VALUES (?1, ?2)",
            params![name, strength],
        )?;
        let id = u32::try_from(self.conn.last_insert_rowid())
            .map_err(|_| LeagueError::Storage("team id out of range".to_string()))?;
        Ok(Team::new(id, name, strength))
    }

    fn save_match(&mut self, result: &MatchResult) -> Result<()> {
        check_distinct(result)?;
        let missing = self.missing_teams(result)?;
        if !missing.is_empty() {
            return Err(LeagueError::UnknownTeams { ids: missing });
        }
        let inserted = self.conn.execute(
            "INSERT INTO matches (week, home_team_id, away_team_id, home_goals, away_goals, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.week,
                result.home_team_id,
                result.away_team_id,
                result.home_goals,
                result.away_goals,
                Utc::now().to_rfc3339()
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(LeagueError::DuplicateMatch {
                    week: result.week,
                    home: result.home_team_id,
                    away: result.away_team_id,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_match(&mut self, result: &MatchResult) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE matches
             SET home_goals = ?1, away_goals = ?2, updated_at = ?3
             WHERE week = ?4 AND home_team_id = ?5 AND away_team_id = ?6",
            params![
                result.home_goals,
                result.away_goals,
                Utc::now().to_rfc3339(),
                result.week,
                result.home_team_id,
                result.away_team_id
            ],
        )?;
        if changed == 0 {
            return Err(LeagueError::MatchNotFound {
                week: result.week,
                home: result.home_team_id,
                away: result.away_team_id,
            });
        }
        Ok(())
    }

    fn all_matches(&self) -> Result<Vec<MatchResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT week, home_team_id, away_team_id, home_goals, away_goals
             FROM matches
             ORDER BY week, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MatchResult {
                week: row.get::<_, u32>(0)?,
                home_team_id: row.get::<_, u32>(1)?,
                away_team_id: row.get::<_, u32>(2)?,
                home_goals: row.get::<_, u32>(3)?,
                away_goals: row.get::<_, u32>(4)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn reset_matches(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM matches;
             DELETE FROM sqlite_sequence WHERE name = 'matches';",
        )?;
        Ok(())
    }

    fn reset_teams(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM matches;
             DELETE FROM teams;
             DELETE FROM sqlite_sequence WHERE name IN ('teams', 'matches');",
        )?;
        Ok(())
    }
}
