use crate::application::deployer::ContractDeployer;
use crate::application::ports::{VerificationRequest, Verifier};
use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::gas_report::GasReporter;
use crate::infrastructure::ethereum_adapter::NetworkContext;
use anyhow::Result;
use ethers::types::{Address, Bytes};
use std::sync::Arc;
use tracing::{debug, info};

/// What a deployment task runs against.
pub struct TaskContext {
    pub config: Config,
    pub network: NetworkContext,
    pub artifacts: ArtifactStore,
    /// Present only when the network has an explorer API key configured.
    pub verifier: Option<Arc<dyn Verifier>>,
    /// Shared so several contexts can feed one report.
    pub gas: Arc<GasReporter>,
}

impl TaskContext {
    pub fn deployer(&self) -> ContractDeployer<'_> {
        ContractDeployer::new(self.network.client.clone(), &self.artifacts, &self.gas)
    }

    /// Verifies `name` at `address` on live networks that have an explorer key.
    /// Returns whether a verification was performed.
    pub async fn verify_if_live(
        &self,
        name: &str,
        address: Address,
        constructor_args: Bytes,
    ) -> Result<bool> {
        if self.network.is_local() {
            return Ok(false);
        }
        let Some(verifier) = &self.verifier else {
            debug!("No explorer API key for {}; skipping verification", self.network.name);
            return Ok(false);
        };

        let artifact = self.artifacts.find(name)?;
        let build_info = self.artifacts.build_info(&artifact)?;
        let request = VerificationRequest {
            address,
            contract_name: artifact.fully_qualified_name(),
            compiler_version: format!("v{}", build_info.solc_long_version),
            source: build_info.input,
            constructor_args,
        };

        info!("Verifying {} at {:?}", name, address);
        verifier.verify(&request).await?;
        if let Some(url) = self
            .network
            .config
            .explorer
            .as_ref()
            .and_then(|explorer| explorer.contract_url(address))
        {
            info!("Verified source: {}", url);
        }
        Ok(true)
    }

    /// Writes the gas report if the reporter is enabled.
    pub fn finish(&self) -> Result<()> {
        self.gas.write(&self.config.gas_reporter.output_file)
    }
}
