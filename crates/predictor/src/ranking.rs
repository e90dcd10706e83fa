//! Softmax and ranking post-processing

use model_registry::LabelEncoder;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One entry of the full prediction distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProbability {
    pub class: String,
    pub probability: f32,
}

/// Numerically stable softmax over raw scores.
///
/// The maximum score is subtracted before exponentiation so large logits
/// cannot overflow. The result sums to 1.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Pair every probability with its class name and sort descending.
///
/// The sort is stable, so exact ties keep encoder order and the
/// first-occurring index wins the top spot.
///
/// Callers must not pass more probabilities than the encoder has classes;
/// [`crate::result_from_scores`] enforces this with its width check.
pub fn rank(probabilities: &[f32], labels: &LabelEncoder) -> Vec<ClassProbability> {
    debug_assert!(
        probabilities.len() <= labels.len(),
        "{} probabilities for {} classes",
        probabilities.len(),
        labels.len()
    );

    let mut ranked: Vec<ClassProbability> = probabilities
        .iter()
        .enumerate()
        .map(|(index, &probability)| ClassProbability {
            class: labels.name(index).unwrap_or_default().to_string(),
            probability,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}
