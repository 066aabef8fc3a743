//! ONNX classifier graphs, run with tract.
//!
//! The graph must take a single `float32[1, 23]` input. For scikit-learn
//! pipelines this is what skl2onnx produces with one `FloatTensorType`
//! input and `zipmap=False`. The first output is the prediction: an
//! `int64` label, a float score or a string label.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use tract_onnx::prelude::*;

use super::{ArtifactFormat, Prediction, PredictionEngine};
use crate::error::ScoringError;
use crate::models::{FeatureRow, FEATURE_COUNT};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

pub struct OnnxEngine {
    plan: OnnxPlan,
}

impl OnnxEngine {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let bytes = fs::read(path).map_err(|source| ScoringError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        let plan = Self::plan(&bytes).map_err(|e| ScoringError::ArtifactFormat {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;
        Ok(Self { plan })
    }

    fn plan(bytes: &[u8]) -> TractResult<OnnxPlan> {
        tract_onnx::onnx()
            .model_for_read(&mut Cursor::new(bytes))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_COUNT)),
            )?
            .into_optimized()?
            .into_runnable()
    }

    fn run(&self, row: &FeatureRow) -> TractResult<Prediction> {
        let input = Tensor::from_shape(&[1, FEATURE_COUNT], &row.to_f32())?;
        let outputs = self.plan.run(tvec!(input.into()))?;
        let first = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no outputs"))?;
        prediction_from_tensor(first)
    }
}

impl PredictionEngine for OnnxEngine {
    fn predict(&self, row: &FeatureRow) -> Result<Prediction, ScoringError> {
        self.run(row)
            .map_err(|e| ScoringError::Inference(format!("{e:#}")))
    }

    fn format(&self) -> ArtifactFormat {
        ArtifactFormat::Onnx
    }
}

/// Takes the first element of the output tensor; a one-row input yields a
/// one-element label or score tensor.
fn prediction_from_tensor(tensor: &Tensor) -> TractResult<Prediction> {
    match tensor.datum_type() {
        DatumType::I64 => first_value::<i64>(tensor).map(Prediction::Class),
        DatumType::I32 => first_value::<i32>(tensor).map(|v| Prediction::Class(v.into())),
        DatumType::F32 => first_value::<f32>(tensor).map(Prediction::Score32),
        DatumType::F64 => first_value::<f64>(tensor).map(Prediction::Score),
        DatumType::String => first_value::<String>(tensor).map(Prediction::Label),
        other => anyhow::bail!("unsupported model output type {other:?}"),
    }
}

fn first_value<T: Datum>(tensor: &Tensor) -> TractResult<T> {
    tensor
        .as_slice::<T>()?
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("model output is empty"))
}
