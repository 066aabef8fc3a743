//! Prediction engines and artifact loading.
//!
//! A model artifact is opaque to the service: it is read from disk, handed to
//! the adapter for its format, and from then on only used through
//! [`PredictionEngine::predict`].

pub mod linear;
pub mod onnx;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ScoringError;
use crate::models::FeatureRow;

/// The scalar a model returns for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Class(i64),
    Score(f64),
    /// A float32 score, rendered at its own precision.
    Score32(f32),
    Label(String),
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Class(class) => write!(f, "{class}"),
            // Debug keeps the decimal point on whole numbers ("1.0").
            Prediction::Score(score) => write!(f, "{score:?}"),
            Prediction::Score32(score) => write!(f, "{score:?}"),
            Prediction::Label(label) => f.write_str(label),
        }
    }
}

pub trait PredictionEngine: Send + Sync {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ScoringError>;

    fn format(&self) -> ArtifactFormat;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Onnx,
    Json,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Result<Self, ScoringError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("onnx") => Ok(ArtifactFormat::Onnx),
            Some("json") => Ok(ArtifactFormat::Json),
            _ => Err(ScoringError::UnsupportedArtifact {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Reads and deserializes the artifact at `path` into a ready engine.
pub fn load_engine(path: &Path) -> Result<Arc<dyn PredictionEngine>, ScoringError> {
    let engine: Arc<dyn PredictionEngine> = match ArtifactFormat::from_path(path)? {
        ArtifactFormat::Onnx => Arc::new(onnx::OnnxEngine::load(path)?),
        ArtifactFormat::Json => Arc::new(linear::LogisticModel::load(path)?),
    };
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn predictions_render_like_scalars() {
        assert_eq!(Prediction::Class(1).to_string(), "1");
        assert_eq!(Prediction::Class(-3).to_string(), "-3");
        assert_eq!(Prediction::Score(1.0).to_string(), "1.0");
        assert_eq!(Prediction::Score(0.25).to_string(), "0.25");
        assert_eq!(Prediction::Score32(0.1).to_string(), "0.1");
        assert_eq!(Prediction::Score32(0.73).to_string(), "0.73");
        assert_eq!(Prediction::Score32(1.0).to_string(), "1.0");
        assert_eq!(Prediction::Label("Yes".into()).to_string(), "Yes");
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ArtifactFormat::from_path(Path::new("/models/attrition.ONNX")).unwrap(),
            ArtifactFormat::Onnx
        );
        assert_eq!(
            ArtifactFormat::from_path(Path::new("logit.json")).unwrap(),
            ArtifactFormat::Json
        );
        assert!(matches!(
            ArtifactFormat::from_path(Path::new("model.pkl")),
            Err(ScoringError::UnsupportedArtifact { .. })
        ));
        assert!(ArtifactFormat::from_path(Path::new("model")).is_err());
    }

    #[test]
    fn load_engine_rejects_unknown_formats_before_reading() {
        let err = load_engine(&PathBuf::from("/does/not/exist.pkl")).err().unwrap();
        assert!(matches!(err, ScoringError::UnsupportedArtifact { .. }));
    }

    #[test]
    fn load_engine_reports_missing_files() {
        let err = load_engine(&PathBuf::from("/does/not/exist.json")).err().unwrap();
        assert!(matches!(err, ScoringError::ArtifactIo { .. }));
    }
}
