use crate::artifacts::ArtifactStore;
use crate::contracts::{
    mock_constructor_args, subscription_id_from_receipt, VRFCoordinatorV2Mock, FUND_AMOUNT,
    VRF_COORDINATOR_MOCK,
};
use crate::gas_report::GasReporter;
use crate::infrastructure::ethereum_adapter::HarnessClient;
use anyhow::{Context, Result};
use ethers::abi::{Detokenize, Tokenize};
use ethers::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Deploys artifacts and sends contract calls on behalf of one signer,
/// recording gas as it goes.
pub struct ContractDeployer<'a> {
    pub client: Arc<HarnessClient>,
    pub artifacts: &'a ArtifactStore,
    pub gas: &'a GasReporter,
}

impl<'a> ContractDeployer<'a> {
    pub fn new(
        client: Arc<HarnessClient>,
        artifacts: &'a ArtifactStore,
        gas: &'a GasReporter,
    ) -> Self {
        Self {
            client,
            artifacts,
            gas,
        }
    }

    /// Deploys `name` with `args` and waits for `confirmations` blocks.
    pub async fn deploy<T: Tokenize>(
        &self,
        name: &str,
        args: T,
        confirmations: usize,
    ) -> Result<(Address, TransactionReceipt)> {
        let artifact = self.artifacts.find(name)?;
        let factory = artifact.factory(self.client.clone())?;
        let deployer = factory
            .deploy(args)
            .with_context(|| format!("encode {} constructor", name))?
            .confirmations(confirmations);

        let (contract, receipt) = deployer
            .send_with_receipt()
            .await
            .with_context(|| format!("deploy {}", name))?;
        ensure_success(&receipt).with_context(|| format!("deploy {}", name))?;

        self.gas.record_receipt(name, "deployment", &receipt);
        debug!(contract = name, tx = ?receipt.transaction_hash, "Deployment mined");
        Ok((contract.address(), receipt))
    }

    /// Sends a state-changing call and waits for it to be mined.
    pub async fn send<D: Detokenize>(
        &self,
        contract: &str,
        method: &str,
        call: ContractCall<HarnessClient, D>,
        confirmations: usize,
    ) -> Result<TransactionReceipt> {
        let receipt = send_call(call, confirmations)
            .await
            .with_context(|| format!("{}.{}", contract, method))?;
        self.gas.record_receipt(contract, method, &receipt);
        Ok(receipt)
    }

    /// Deploys a coordinator mock with a freshly created and funded subscription.
    pub async fn deploy_oracle_mock(&self) -> Result<(VRFCoordinatorV2Mock<HarnessClient>, u64)> {
        let (address, _) = self
            .deploy(VRF_COORDINATOR_MOCK, mock_constructor_args(), 1)
            .await?;
        let coordinator = VRFCoordinatorV2Mock::new(address, self.client.clone());

        let receipt = self
            .send(
                VRF_COORDINATOR_MOCK,
                "createSubscription",
                coordinator.create_subscription(),
                1,
            )
            .await?;
        let subscription_id = subscription_id_from_receipt(&receipt)?;

        self.send(
            VRF_COORDINATOR_MOCK,
            "fundSubscription",
            coordinator.fund_subscription(subscription_id, FUND_AMOUNT),
            1,
        )
        .await?;
        info!(
            "Subscription id {} funded with {} wei.",
            subscription_id, FUND_AMOUNT
        );

        Ok((coordinator, subscription_id))
    }
}

/// Sends `call`, waits for `confirmations` blocks and rejects reverted receipts.
async fn send_call<D: Detokenize>(
    call: ContractCall<HarnessClient, D>,
    confirmations: usize,
) -> Result<TransactionReceipt> {
    // Break down the chain to manage lifetimes
    let pending = call.send().await?;
    let receipt = pending
        .confirmations(confirmations)
        .await?
        .context("transaction dropped from mempool")?;
    ensure_success(&receipt)?;
    Ok(receipt)
}

fn ensure_success(receipt: &TransactionReceipt) -> Result<()> {
    if receipt.status == Some(U64::zero()) {
        anyhow::bail!("transaction {:?} reverted", receipt.transaction_hash);
    }
    Ok(())
}
