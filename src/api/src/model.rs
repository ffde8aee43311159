//! Pairwise finishing-order model.
//!
//! A logistic regression over `[pos_a, pos_b, pos_a - pos_b]` trained offline
//! and exported as a small JSON coefficient file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::aggregator::PairwiseOracle;
use crate::config::ModelConfig;

/// Number of input features
pub const NUM_FEATURES: usize = 3;

/// Feature names in model input order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = ["pos_a", "pos_b", "pos_diff"];

/// Logistic pairwise model: P(A ahead of B) = sigmoid(intercept + w · x).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairModel {
    pub coefficients: [f64; NUM_FEATURES],
    pub intercept: f64,
}

impl PairModel {
    #[cfg(test)]
    pub fn new(coefficients: [f64; NUM_FEATURES], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Load model coefficients from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {}", path.display()))?;
        let model: PairModel =
            serde_json::from_str(&content).context("Failed to parse model coefficients")?;

        if !model.intercept.is_finite() || model.coefficients.iter().any(|w| !w.is_finite()) {
            anyhow::bail!("Model file {} contains non-finite coefficients", path.display());
        }

        Ok(model)
    }

    /// Probability that A finishes ahead of B.
    pub fn predict(&self, features: [f64; NUM_FEATURES]) -> f64 {
        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        sigmoid(logit)
    }
}

impl PairwiseOracle for PairModel {
    fn probability_ahead(&self, pos_a: i64, pos_b: i64, pos_diff: i64) -> Result<f64> {
        let p = self.predict([pos_a as f64, pos_b as f64, pos_diff as f64]);
        if !p.is_finite() {
            anyhow::bail!("Model produced a non-finite probability for ({}, {})", pos_a, pos_b);
        }
        Ok(p)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Thread-safe model wrapper for use in web handlers.
pub type SharedModel = Arc<PairModel>;

/// Create a shared model instance.
pub fn create_shared_model<P: AsRef<Path>>(path: P) -> Result<SharedModel> {
    let model = PairModel::load(path)?;
    Ok(Arc::new(model))
}

/// Load the configured model as an oracle.
///
/// A missing or unreadable model is not fatal: the service falls back to
/// the grid-position heuristic.
pub fn load_oracle(config: &ModelConfig) -> Option<Arc<dyn PairwiseOracle>> {
    if !config.enabled {
        tracing::info!("Pairwise model disabled, using grid-position heuristic");
        return None;
    }

    match create_shared_model(&config.path) {
        Ok(model) => {
            tracing::info!(path = %config.path, ?model, "Pairwise model loaded");
            Some(model)
        }
        Err(e) => {
            tracing::warn!(
                path = %config.path,
                "Failed to load pairwise model: {:#}, using grid-position heuristic",
                e
            );
            None
        }
    }
}
