//! Request and response types for the GridPlay API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregator::{QualifyingPositions, WinProbabilities};
use crate::battles::BattlePrediction;
use crate::storage::LeaderboardRow;

/// Post-qualifying prediction request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostQualifyingRequest {
    pub race_id: String,
    /// Driver id -> grid position, e.g. {"VER": 1, "LEC": 2}
    pub qualifying_pos: QualifyingPositions,
}

/// Per-driver prediction
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DriverPrediction {
    pub win_prob: f64,
}

/// Post-qualifying prediction response
#[derive(Debug, Serialize)]
pub struct PostQualifyingResponse {
    pub race_id: String,
    pub predictions: BTreeMap<String, DriverPrediction>,
}

impl PostQualifyingResponse {
    pub fn new(race_id: String, win_probs: WinProbabilities) -> Self {
        Self {
            race_id,
            predictions: win_probs
                .into_iter()
                .map(|(driver, win_prob)| (driver, DriverPrediction { win_prob }))
                .collect(),
        }
    }
}

/// Fan-battle submission
#[derive(Debug, Clone, Deserialize)]
pub struct BattleSubmitRequest {
    pub user_id: String,
    pub race_id: String,
    /// Driver id -> predicted finishing position
    pub prediction: BattlePrediction,
}

/// Leaderboard line returned with a submission
#[derive(Debug, Serialize)]
pub struct LeaderboardTopEntry {
    pub user_id: String,
    pub race_id: String,
    pub score: i64,
}

impl From<LeaderboardRow> for LeaderboardTopEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            user_id: row.user_id,
            race_id: row.race_id,
            score: row.score,
        }
    }
}

/// Fan-battle submission response
#[derive(Debug, Serialize)]
pub struct BattleSubmitResponse {
    pub id: i64,
    pub score: i64,
    pub leaderboard_top: Vec<LeaderboardTopEntry>,
}

/// Leaderboard line for a race
#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            user_id: row.user_id,
            score: row.score,
            created_at: row.created_at,
        }
    }
}

/// Leaderboard response
#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub race_id: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Root banner
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Model info response
#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    pub features: Vec<String>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
