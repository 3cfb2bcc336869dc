use crate::{
    application::{context::TaskContext, ports::Verifier},
    artifacts::ArtifactStore,
    config::{self, Config},
    gas_report::GasReporter,
    infrastructure::{ethereum_adapter::connect, explorer_verifier::ExplorerVerifier},
};
use anyhow::Result;
use std::{path::Path, sync::Arc};
use tracing::info;

pub async fn build(config_path: Option<&Path>, network: Option<&str>) -> Result<TaskContext> {
    let cfg = config::load_config(config_path)?;
    build_with(cfg, network).await
}

pub async fn build_with(config: Config, network: Option<&str>) -> Result<TaskContext> {
    let name = network
        .unwrap_or(config.default_network.as_str())
        .to_string();
    let network = connect(&config, &name).await?;

    let verifier: Option<Arc<dyn Verifier>> = match network.config.verification_target() {
        Some(explorer) if !network.is_local() => {
            info!("Using explorer verification at {}", explorer.api_url);
            Some(Arc::new(ExplorerVerifier::new(
                explorer.api_url.clone(),
                explorer.api_key.clone().unwrap_or_default(),
            )))
        }
        _ => None,
    };

    let artifacts = ArtifactStore::new(config.paths.artifacts.clone());
    let gas = Arc::new(GasReporter::new(config.gas_reporter.enabled));

    Ok(TaskContext {
        config,
        network,
        artifacts,
        verifier,
        gas,
    })
}
