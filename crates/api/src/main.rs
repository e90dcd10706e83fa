//! Skin-Lesion Classification Service - Main Entry Point

use api::{init_logging, run_server, Settings};
use model_registry::ModelRegistry;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== DermoScan API v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;

    // A load failure aborts startup; there is no degraded serving mode.
    let registry = ModelRegistry::load(&settings.model.checkpoint_path)?;
    info!(
        "Model ready on {} with {} classes (checkpoint parsed in {} mode)",
        registry.device(),
        registry.labels().len(),
        registry.load_mode().as_str()
    );

    run_server(settings, registry).await
}
