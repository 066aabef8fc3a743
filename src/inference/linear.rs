//! Logistic-regression artifacts stored as JSON.
//!
//! ```json
//! {
//!   "coefficients": [0.12, -0.4, ...],
//!   "intercept": -1.3,
//!   "classes": [0, 1],
//!   "threshold": 0.5,
//!   "feature_names": ["num__Age", ...]
//! }
//! ```
//!
//! `classes`, `threshold` and `feature_names` are optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{ArtifactFormat, Prediction, PredictionEngine};
use crate::error::ScoringError;
use crate::models::FeatureRow;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

fn default_threshold() -> f64 {
    0.5
}

impl LogisticModel {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let bytes = fs::read(path).map_err(|source| ScoringError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ScoringError::ArtifactFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Probability of the second class.
    pub fn probability(&self, row: &FeatureRow) -> Result<f64, ScoringError> {
        let values = row.values();
        if self.coefficients.len() != values.len() {
            return Err(ScoringError::Inference(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                values.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if !names.iter().map(String::as_str).eq(row.columns().iter().copied()) {
                return Err(ScoringError::Inference(
                    "feature names do not match the columns the model was fitted with".to_string(),
                ));
            }
        }

        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(values)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        let p = 1.0 / (1.0 + (-z).exp());
        if p.is_nan() {
            return Err(ScoringError::Inference("decision function is not a number".to_string()));
        }
        Ok(p)
    }
}

impl PredictionEngine for LogisticModel {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ScoringError> {
        let p = self.probability(row)?;
        let class = self.classes[usize::from(p >= self.threshold)];
        Ok(Prediction::Class(class))
    }

    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Json
    }
}
