//! Predictor
//!
//! Runs the forward pass and turns raw scores into a confidence-ranked
//! label distribution.

mod ranking;
mod run;

pub use ranking::{rank, softmax, ClassProbability};
pub use run::{predict, result_from_scores, PredictionResult};

use thiserror::Error;

/// Errors during prediction. Server-caused, surfaced as a 5xx and never
/// retried automatically.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("forward pass failed: {0}")]
    Forward(String),
    #[error("unusable network output: {0}")]
    Output(String),
    #[error("network produced {actual} scores for {expected} classes")]
    WidthMismatch { expected: usize, actual: usize },
}
