//! SQLite repository for fan-battle submissions and leaderboards

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use super::schema::create_tables;
use crate::battles::BattlePrediction;

/// A submission about to be stored
#[derive(Debug, Clone)]
pub struct NewBattle {
    pub user_id: String,
    pub race_id: String,
    pub prediction: BattlePrediction,
    pub score: i64,
}

/// A stored submission
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct StoredBattle {
    pub id: i64,
    pub user_id: String,
    pub race_id: String,
    pub prediction: BattlePrediction,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// One leaderboard line
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub user_id: String,
    pub race_id: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

/// Repository for fan battles
pub struct BattleRepository {
    conn: Connection,
}

impl BattleRepository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;

        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Insert Operations ====================

    /// Store a submission stamped with the current time, returning its id
    pub fn insert_battle(&self, battle: &NewBattle) -> Result<i64> {
        self.insert_battle_at(battle, Utc::now())
    }

    /// Store a submission with an explicit timestamp, returning its id
    pub fn insert_battle_at(&self, battle: &NewBattle, created_at: DateTime<Utc>) -> Result<i64> {
        let prediction_json =
            serde_json::to_string(&battle.prediction).context("Failed to encode prediction")?;

        self.conn.execute(
            r#"
            INSERT INTO battles (user_id, race_id, prediction_json, score, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                battle.user_id,
                battle.race_id,
                prediction_json,
                battle.score,
                created_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    // ==================== Query Operations ====================

    /// Get a submission by id
    #[cfg(test)]
    pub fn get_battle(&self, id: i64) -> Result<Option<StoredBattle>> {
        use rusqlite::OptionalExtension;

        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, user_id, race_id, prediction_json, score, created_at
                FROM battles
                WHERE id = ?1
                "#,
                [id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, DateTime<Utc>>(5)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, user_id, race_id, prediction_json, score, created_at)| -> Result<StoredBattle> {
            let prediction = serde_json::from_str(&prediction_json)
                .with_context(|| format!("Corrupt prediction for battle {}", id))?;
            Ok(StoredBattle {
                id,
                user_id,
                race_id,
                prediction,
                score,
                created_at,
            })
        })
        .transpose()
    }

    /// Top scores for a race: highest score first, earliest submission wins ties
    pub fn get_leaderboard(&self, race_id: &str, limit: usize) -> Result<Vec<LeaderboardRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT user_id, race_id, score, created_at
            FROM battles
            WHERE race_id = ?1
            ORDER BY score DESC, created_at ASC, id ASC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt
            .query_map(params![race_id, limit as i64], |row| {
                Ok(LeaderboardRow {
                    user_id: row.get(0)?,
                    race_id: row.get(1)?,
                    score: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get battle count for a race
    pub fn get_battle_count(&self, race_id: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM battles WHERE race_id = ?1",
            [race_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_battle(user_id: &str, race_id: &str, score: i64) -> NewBattle {
        let mut prediction = BattlePrediction::new();
        prediction.insert("VER".to_string(), 1);
        prediction.insert("LEC".to_string(), 2);
        NewBattle {
            user_id: user_id.to_string(),
            race_id: race_id.to_string(),
            prediction,
            score,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get_battle() {
        let repo = BattleRepository::in_memory().unwrap();
        let battle = create_test_battle("fan1", "2023-01-bahrain", 47);

        let id = repo.insert_battle_at(&battle, at(0)).unwrap();
        let stored = repo.get_battle(id).unwrap().unwrap();

        assert_eq!(stored.user_id, "fan1");
        assert_eq!(stored.race_id, "2023-01-bahrain");
        assert_eq!(stored.score, 47);
        assert_eq!(stored.prediction, battle.prediction);
        assert_eq!(stored.created_at, at(0));
    }

    #[test]
    fn test_get_missing_battle() {
        let repo = BattleRepository::in_memory().unwrap();
        assert!(repo.get_battle(99).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_sequential() {
        let repo = BattleRepository::in_memory().unwrap();
        let first = repo.insert_battle(&create_test_battle("a", "r", 1)).unwrap();
        let second = repo.insert_battle(&create_test_battle("b", "r", 2)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_leaderboard_ordering() {
        let repo = BattleRepository::in_memory().unwrap();
        let race = "2023-12-japan";

        repo.insert_battle_at(&create_test_battle("late_high", race, 60), at(10)).unwrap();
        repo.insert_battle_at(&create_test_battle("low", race, 10), at(0)).unwrap();
        repo.insert_battle_at(&create_test_battle("early_high", race, 60), at(5)).unwrap();
        repo.insert_battle_at(&create_test_battle("other_race", "2023-13-austin", 99), at(1))
            .unwrap();

        let board = repo.get_leaderboard(race, 50).unwrap();
        let users: Vec<_> = board.iter().map(|r| r.user_id.as_str()).collect();

        assert_eq!(users, vec!["early_high", "late_high", "low"]);
        assert!(board.iter().all(|r| r.race_id == race));
    }

    #[test]
    fn test_leaderboard_same_timestamp_uses_insert_order() {
        let repo = BattleRepository::in_memory().unwrap();
        repo.insert_battle_at(&create_test_battle("first", "r", 5), at(0)).unwrap();
        repo.insert_battle_at(&create_test_battle("second", "r", 5), at(0)).unwrap();

        let board = repo.get_leaderboard("r", 10).unwrap();
        assert_eq!(board[0].user_id, "first");
        assert_eq!(board[1].user_id, "second");
    }

    #[test]
    fn test_leaderboard_limit() {
        let repo = BattleRepository::in_memory().unwrap();
        for i in 0..15 {
            repo.insert_battle_at(&create_test_battle(&format!("fan{}", i), "r", i), at(i))
                .unwrap();
        }

        let board = repo.get_leaderboard("r", 10).unwrap();
        assert_eq!(board.len(), 10);
        assert_eq!(board[0].score, 14);
        assert_eq!(repo.get_battle_count("r").unwrap(), 15);
    }

    #[test]
    fn test_file_backed_repository() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("battles.sqlite");

        {
            let repo = BattleRepository::new(&db_path).unwrap();
            repo.insert_battle(&create_test_battle("fan", "r", 3)).unwrap();
        }

        let reopened = BattleRepository::new(&db_path).unwrap();
        assert_eq!(reopened.get_battle_count("r").unwrap(), 1);
    }
}
