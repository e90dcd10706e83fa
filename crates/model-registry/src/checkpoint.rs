//! Checkpoint format and the two-attempt deserialization strategy

use crate::ModelLoadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Checkpoint format versions the strict parser accepts
const SUPPORTED_FORMAT_VERSIONS: &[u32] = &[1];

/// Keys every checkpoint must carry, whichever parse path succeeds
const REQUIRED_KEYS: &[&str] = &["label_encoder", "model_state_dict"];

/// Which deserialization path produced the checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Schema-constrained parse: unknown fields denied, version checked
    Strict,
    /// Lenient parse: unknown fields and a missing version are tolerated
    Permissive,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Strict => "strict",
            LoadMode::Permissive => "permissive",
        }
    }
}

/// On-disk checkpoint envelope.
///
/// `model_state_dict` holds the serialized network graph; its initializers
/// are the weight tensors keyed by layer name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    pub format_version: u32,
    pub label_encoder: Vec<String>,
    pub model_state_dict: Vec<u8>,
}

/// Read and deserialize the checkpoint at `path`.
///
/// Tries the strict parse first. On failure, falls back to a permissive parse
/// of the self-describing document and validates the required keys by hand.
/// The returned [`LoadMode`] tags which path succeeded.
pub fn read_checkpoint(path: &Path) -> Result<(Checkpoint, LoadMode), ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::NotFound(path.display().to_string()));
    }

    let bytes = fs::read(path).map_err(|e| ModelLoadError::Io(e.to_string()))?;
    info!("Loading checkpoint from {} ({} bytes)", path.display(), bytes.len());

    match parse_strict(&bytes) {
        Ok(checkpoint) => {
            info!("Checkpoint parsed in strict mode");
            Ok((checkpoint, LoadMode::Strict))
        }
        Err(strict_err) => {
            warn!("Strict checkpoint parse failed ({strict_err}), attempting permissive parse");
            let checkpoint = parse_permissive(&bytes)?;
            info!("Checkpoint parsed in permissive mode");
            Ok((checkpoint, LoadMode::Permissive))
        }
    }
}

/// Schema-constrained parse: typed struct, unknown fields denied, version
/// checked against the allow-list.
fn parse_strict(bytes: &[u8]) -> Result<Checkpoint, ModelLoadError> {
    let checkpoint: Checkpoint =
        serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Parse(e.to_string()))?;

    if !SUPPORTED_FORMAT_VERSIONS.contains(&checkpoint.format_version) {
        return Err(ModelLoadError::Parse(format!(
            "unsupported format_version {}",
            checkpoint.format_version
        )));
    }

    Ok(checkpoint)
}

/// Lenient parse: accept any JSON object, then validate the required keys
/// explicitly so the error can name every missing one.
fn parse_permissive(bytes: &[u8]) -> Result<Checkpoint, ModelLoadError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ModelLoadError::Parse(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| ModelLoadError::Parse("checkpoint root is not an object".to_string()))?;

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ModelLoadError::MissingKeys(missing));
    }

    let label_encoder: Vec<String> = serde_json::from_value(object["label_encoder"].clone())
        .map_err(|e| ModelLoadError::Parse(format!("label_encoder: {e}")))?;
    let model_state_dict: Vec<u8> = serde_json::from_value(object["model_state_dict"].clone())
        .map_err(|e| ModelLoadError::Parse(format!("model_state_dict: {e}")))?;

    let format_version = object
        .get("format_version")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;
    if !SUPPORTED_FORMAT_VERSIONS.contains(&format_version) {
        warn!("Permissive parse accepting unrecognized format_version {format_version}");
    }

    Ok(Checkpoint {
        format_version,
        label_encoder,
        model_state_dict,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_checkpoint(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let result = read_checkpoint(Path::new("/nonexistent/checkpoint.json"));
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn test_strict_parse() {
        let file = write_checkpoint(
            &json!({
                "format_version": 1,
                "label_encoder": ["melanoma", "nevus"],
                "model_state_dict": [1, 2, 3]
            })
            .to_string(),
        );

        let (checkpoint, mode) = read_checkpoint(file.path()).unwrap();
        assert_eq!(mode, LoadMode::Strict);
        assert_eq!(checkpoint.label_encoder, vec!["melanoma", "nevus"]);
        assert_eq!(checkpoint.model_state_dict, vec![1, 2, 3]);
    }

    #[test]
    fn test_unknown_field_falls_back_to_permissive() {
        let file = write_checkpoint(
            &json!({
                "format_version": 1,
                "label_encoder": ["melanoma"],
                "model_state_dict": [0],
                "optimizer_state": {"lr": 0.001}
            })
            .to_string(),
        );

        let (checkpoint, mode) = read_checkpoint(file.path()).unwrap();
        assert_eq!(mode, LoadMode::Permissive);
        assert_eq!(checkpoint.label_encoder, vec!["melanoma"]);
    }

    #[test]
    fn test_missing_version_falls_back_to_permissive() {
        let file = write_checkpoint(
            &json!({
                "label_encoder": ["melanoma"],
                "model_state_dict": [0]
            })
            .to_string(),
        );

        let (_, mode) = read_checkpoint(file.path()).unwrap();
        assert_eq!(mode, LoadMode::Permissive);
    }

    #[test]
    fn test_missing_label_encoder_named() {
        let file = write_checkpoint(
            &json!({
                "format_version": 1,
                "model_state_dict": [0]
            })
            .to_string(),
        );

        match read_checkpoint(file.path()) {
            Err(ModelLoadError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["label_encoder".to_string()]);
            }
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_state_dict_named() {
        let file = write_checkpoint(
            &json!({
                "format_version": 1,
                "label_encoder": ["melanoma"]
            })
            .to_string(),
        );

        match read_checkpoint(file.path()) {
            Err(ModelLoadError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["model_state_dict".to_string()]);
            }
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn test_both_keys_missing_both_named() {
        let file = write_checkpoint(&json!({ "format_version": 1 }).to_string());

        match read_checkpoint(file.path()) {
            Err(ModelLoadError::MissingKeys(keys)) => {
                assert_eq!(
                    keys,
                    vec!["label_encoder".to_string(), "model_state_dict".to_string()]
                );
            }
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_bytes() {
        let file = write_checkpoint("not a checkpoint at all");
        assert!(matches!(
            read_checkpoint(file.path()),
            Err(ModelLoadError::Parse(_))
        ));
    }
}
