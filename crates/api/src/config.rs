//! Service configuration

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Complete service settings: defaults, then an optional config file, then
/// `DERMOSCAN__*` environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub upload: UploadSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// Bind address in `host:port` form
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    /// Fixed on-disk checkpoint location
    pub checkpoint_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Multipart body limit for /predict
    pub max_bytes: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("model.checkpoint_path", "model/skin_lesion_checkpoint.json")?
            .set_default("upload.max_bytes", 10 * 1024 * 1024)?
            .add_source(File::with_name("config/service").required(false))
            .add_source(Environment::with_prefix("DERMOSCAN").separator("__"))
            .build()?
            .try_deserialize()
    }
}
