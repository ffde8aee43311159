//! API route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::aggregator::{aggregate, validate_grid, PairwiseOracle};
use crate::battles::{compute_score, validate_submission};
use crate::config::AppConfig;
use crate::model::FEATURE_NAMES;
use crate::storage::{BattleRepository, NewBattle};
use crate::telemetry::{self, DriverSummary, RaceSummary};
use crate::types::{
    BattleSubmitRequest, BattleSubmitResponse, ErrorResponse, HealthResponse, LeaderboardResponse,
    ModelInfoResponse, PostQualifyingRequest, PostQualifyingResponse, RootResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    /// Pairwise model, absent when none could be loaded
    pub oracle: Option<Arc<dyn PairwiseOracle>>,
    pub config: AppConfig,
    pub repo: Mutex<BattleRepository>,
}

impl AppState {
    fn with_repo<T>(
        &self,
        f: impl FnOnce(&BattleRepository) -> anyhow::Result<T>,
    ) -> Result<T, ApiError> {
        let repo = self
            .repo
            .lock()
            .map_err(|e| ApiError::internal(format!("Failed to lock repository: {}", e)))?;
        f(&repo).map_err(|e| {
            tracing::error!(error = %e, "Battle storage failed");
            ApiError::internal(format!("Storage error: {}", e))
        })
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Root banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "GridPlay Backend Running".to_string(),
    })
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Model info endpoint.
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let loaded = state.oracle.is_some();
    Json(ModelInfoResponse {
        loaded,
        model_path: loaded.then(|| state.config.model.path.clone()),
        features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    })
}

/// Win probabilities from the qualifying grid.
pub async fn post_qualifying(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PostQualifyingRequest>,
) -> Result<Json<PostQualifyingResponse>, ApiError> {
    validate_grid(&req.qualifying_pos).map_err(ApiError::bad_request)?;

    tracing::info!(
        race_id = %req.race_id,
        drivers = req.qualifying_pos.len(),
        model = state.oracle.is_some(),
        "Post-qualifying prediction"
    );

    let win_probs = aggregate(&req.qualifying_pos, state.oracle.as_deref());

    Ok(Json(PostQualifyingResponse::new(req.race_id, win_probs)))
}

/// Store a fan prediction and return the race's top scores.
pub async fn submit_battle(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BattleSubmitRequest>,
) -> Result<Json<BattleSubmitResponse>, ApiError> {
    validate_submission(&req.user_id).map_err(ApiError::bad_request)?;

    let score = compute_score(&req.prediction);
    let battle = NewBattle {
        user_id: req.user_id,
        race_id: req.race_id,
        prediction: req.prediction,
        score,
    };
    let limit = state.config.leaderboard.submit_limit;

    let (id, top) = state.with_repo(|repo| {
        let id = repo.insert_battle(&battle)?;
        let top = repo.get_leaderboard(&battle.race_id, limit)?;
        Ok((id, top))
    })?;

    tracing::info!(id, race_id = %battle.race_id, score, "Battle submitted");

    Ok(Json(BattleSubmitResponse {
        id,
        score,
        leaderboard_top: top.into_iter().map(Into::into).collect(),
    }))
}

/// Leaderboard for a race.
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let limit = state.config.leaderboard.query_limit;
    let rows = state.with_repo(|repo| repo.get_leaderboard(&race_id, limit))?;

    Ok(Json(LeaderboardResponse {
        race_id,
        leaderboard: rows.into_iter().map(Into::into).collect(),
    }))
}

/// Race calendar.
pub async fn races() -> Json<&'static [RaceSummary]> {
    Json(telemetry::list_races())
}

/// Drivers entered in a race.
pub async fn drivers(Path(race_id): Path<String>) -> Json<&'static [DriverSummary]> {
    Json(telemetry::drivers_for_race(&race_id))
}

/// Telemetry for one driver in a race.
pub async fn driver_telemetry(
    State(state): State<Arc<AppState>>,
    Path((race_id, driver_id)): Path<(String, String)>,
) -> Json<Value> {
    tracing::debug!(%race_id, %driver_id, "Serving sample telemetry");
    let path = std::path::Path::new(&state.config.telemetry.sample_path);
    Json(telemetry::read_sample(path, &driver_id))
}
