//! SQLite storage module for fan battles
//!
//! Provides persistent storage for submitted predictions and the
//! per-race leaderboard built on top of them.

pub mod repository;
pub mod schema;

pub use repository::{BattleRepository, LeaderboardRow, NewBattle};
