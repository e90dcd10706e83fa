//! Label encoder

use crate::ModelLoadError;
use serde::{Deserialize, Serialize};

/// Ordered mapping between class index and human-readable class name.
///
/// The order is the one the network was trained with: output column `i`
/// scores class `classes[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Build an encoder from an ordered class list
    pub fn from_classes(classes: Vec<String>) -> Result<Self, ModelLoadError> {
        if classes.is_empty() {
            return Err(ModelLoadError::EmptyLabelEncoder);
        }
        Ok(Self { classes })
    }

    /// Number of known classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class name for an output index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// All class names in encoder order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
