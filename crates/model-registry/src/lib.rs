//! Model Registry
//!
//! Loads the classifier checkpoint from disk and holds the runnable network
//! together with its label encoder for the lifetime of the process.

mod checkpoint;
mod labels;
mod registry;

pub use checkpoint::{read_checkpoint, Checkpoint, LoadMode};
pub use labels::LabelEncoder;
pub use registry::{ModelRegistry, RunnableNetwork, INPUT_SHAPE};

use thiserror::Error;

/// Errors during checkpoint loading and registry construction
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("checkpoint not found at {0}")]
    NotFound(String),
    #[error("failed to read checkpoint: {0}")]
    Io(String),
    #[error("checkpoint is not parseable: {0}")]
    Parse(String),
    #[error("checkpoint file is missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
    #[error("label encoder contains no classes")]
    EmptyLabelEncoder,
    #[error("failed to build network from checkpoint: {0}")]
    Network(String),
    #[error("network output width {actual} does not match label count {expected}")]
    OutputWidthMismatch { expected: usize, actual: usize },
}
