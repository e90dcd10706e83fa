//! Process-wide model registry

use crate::checkpoint::{read_checkpoint, Checkpoint, LoadMode};
use crate::labels::LabelEncoder;
use crate::ModelLoadError;
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};
use tract_onnx::prelude::*;

/// Network input shape: batch 1, RGB, 224x224
pub const INPUT_SHAPE: [usize; 4] = [1, 3, 224, 224];

/// Optimized, runnable network plan
pub type RunnableNetwork = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// The loaded classifier: runnable network plus label encoder.
///
/// Built once at startup, immutable afterward. Request handlers share it by
/// `Arc` and only read, so no locking is needed on the prediction path.
pub struct ModelRegistry {
    network: RunnableNetwork,
    labels: LabelEncoder,
    load_mode: LoadMode,
}

impl ModelRegistry {
    /// Load the checkpoint at `path` and build the runnable network.
    ///
    /// Called exactly once at startup; a failure here aborts the process
    /// before any request is accepted. There is no degraded serving mode.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let (checkpoint, load_mode) = read_checkpoint(path.as_ref())?;
        Self::from_checkpoint(checkpoint, load_mode)
    }

    /// Build the registry from an already-deserialized checkpoint
    pub fn from_checkpoint(
        checkpoint: Checkpoint,
        load_mode: LoadMode,
    ) -> Result<Self, ModelLoadError> {
        let labels = LabelEncoder::from_classes(checkpoint.label_encoder)?;
        info!("Found {} classes: {:?}", labels.len(), labels.classes());

        let network = build_network(&checkpoint.model_state_dict)?;
        verify_output_width(&network, labels.len())?;

        info!(
            "Model loaded successfully ({} mode) and ready for inference",
            load_mode.as_str()
        );

        Ok(Self {
            network,
            labels,
            load_mode,
        })
    }

    pub fn network(&self) -> &RunnableNetwork {
        &self.network
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    /// Which deserialization path loaded the checkpoint
    pub fn load_mode(&self) -> LoadMode {
        self.load_mode
    }

    /// Execution device. The runtime is CPU-only.
    pub fn device(&self) -> &'static str {
        "cpu"
    }
}

/// Parse the serialized graph, pin the input shape, and optimize into a
/// runnable plan. Optimization folds training-only constructs, so the
/// resulting plan is deterministic pure inference.
fn build_network(graph_bytes: &[u8]) -> Result<RunnableNetwork, ModelLoadError> {
    let mut reader = Cursor::new(graph_bytes);
    tract_onnx::onnx()
        .model_for_read(&mut reader)
        .and_then(|model| {
            model.with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), INPUT_SHAPE))
        })
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(|e| ModelLoadError::Network(e.to_string()))
}

/// Checkpoint and architecture are only valid together: the graph's output
/// row must be one score per known class.
fn verify_output_width(network: &RunnableNetwork, class_count: usize) -> Result<(), ModelLoadError> {
    let fact = network
        .model()
        .output_fact(0)
        .map_err(|e| ModelLoadError::Network(e.to_string()))?;

    if let Some(dims) = fact.shape.as_concrete() {
        let width = dims.last().copied().unwrap_or(0);
        if width != class_count {
            return Err(ModelLoadError::OutputWidthMismatch {
                expected: class_count,
                actual: width,
            });
        }
    } else {
        warn!("Network output shape is not concrete, skipping width check");
    }

    Ok(())
}
