//! Forward pass and result assembly

use crate::ranking::{rank, softmax, ClassProbability};
use crate::PredictionError;
use model_registry::{LabelEncoder, ModelRegistry};
use serde::{Deserialize, Serialize};
use tract_onnx::prelude::*;
use tracing::debug;

/// Complete outcome of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Class with the highest probability
    pub predicted_class: String,
    /// Probability of the predicted class (0.0 to 1.0)
    pub confidence: f32,
    /// Every known class with its probability, descending
    pub all_predictions: Vec<ClassProbability>,
}

/// Run the forward pass on a preprocessed input tensor.
///
/// The runtime executes a pure inference plan: no gradient bookkeeping, no
/// training-time stochastic behavior, so identical input yields identical
/// output. Any runtime failure (including a shape mismatch) wraps into
/// [`PredictionError`].
pub fn predict(
    registry: &ModelRegistry,
    input: Tensor,
) -> Result<PredictionResult, PredictionError> {
    let start = std::time::Instant::now();

    let outputs = registry
        .network()
        .run(tvec!(input.into()))
        .map_err(|e| PredictionError::Forward(e.to_string()))?;

    let output = outputs
        .first()
        .ok_or_else(|| PredictionError::Output("network produced no outputs".to_string()))?;
    let view = output
        .to_array_view::<f32>()
        .map_err(|e| PredictionError::Output(e.to_string()))?;
    let scores: Vec<f32> = view.iter().cloned().collect();

    let result = result_from_scores(&scores, registry.labels())?;
    debug!(
        "Inference completed in {}ms, predicted {} ({:.4})",
        start.elapsed().as_millis(),
        result.predicted_class,
        result.confidence
    );

    Ok(result)
}

/// Turn one row of raw scores into the ranked result.
///
/// Applies softmax, then ranks descending; the top entry is the prediction.
pub fn result_from_scores(
    scores: &[f32],
    labels: &LabelEncoder,
) -> Result<PredictionResult, PredictionError> {
    if scores.len() != labels.len() {
        return Err(PredictionError::WidthMismatch {
            expected: labels.len(),
            actual: scores.len(),
        });
    }

    let probabilities = softmax(scores);
    let all_predictions = rank(&probabilities, labels);
    let top = all_predictions
        .first()
        .ok_or_else(|| PredictionError::Output("empty distribution".to_string()))?;
    let predicted_class = top.class.clone();
    let confidence = top.probability;

    Ok(PredictionResult {
        predicted_class,
        confidence,
        all_predictions,
    })
}
