use crate::application::context::TaskContext;
use crate::config::TestnetConfig;
use crate::contracts::{
    encode_constructor_args, teller_constructor_args, FORTUNE_TELLER, VRF_COORDINATOR_MOCK,
};
use crate::domain::{
    deployment::{OracleBinding, TellerDeployment},
    errors::HarnessError,
};
use anyhow::Result;
use ethers::types::Address;
use std::collections::BTreeMap;
use tracing::info;

/// Oracle settings for a live testnet; both values are required.
pub fn resolve_testnet_oracle(
    testnets: &BTreeMap<u64, TestnetConfig>,
    chain_id: u64,
) -> Result<OracleBinding, HarnessError> {
    let missing = || HarnessError::MissingTestnetConfig { chain_id };
    let testnet = testnets.get(&chain_id).ok_or_else(missing)?;

    // Subscription ids start at 1; zero means unset.
    let subscription_id = testnet
        .subscription_id
        .filter(|id| *id != 0)
        .ok_or_else(missing)?;
    let coordinator = testnet
        .coordinator_address
        .as_deref()
        .and_then(|addr| addr.parse::<Address>().ok())
        .ok_or_else(missing)?;

    Ok(OracleBinding {
        subscription_id,
        coordinator,
    })
}

/// Deploys FortuneTeller. On a local chain the coordinator mock and a funded
/// subscription are deployed first and the teller is registered as consumer.
pub async fn deploy_fortune_teller(ctx: &TaskContext) -> Result<TellerDeployment> {
    let network = &ctx.network;
    let deployer = ctx.deployer();

    let (oracle, mock) = if network.is_local() {
        info!("Local blockchain network detected.  Deploying Mock.");
        let (coordinator, subscription_id) = deployer.deploy_oracle_mock().await?;
        let oracle = OracleBinding {
            subscription_id,
            coordinator: coordinator.address(),
        };
        (oracle, Some(coordinator))
    } else {
        (
            resolve_testnet_oracle(&ctx.config.testnets, network.chain_id())?,
            None,
        )
    };

    info!("Deploying FortuneTeller to {}...", network.name);
    let args = teller_constructor_args(oracle.subscription_id, oracle.coordinator);
    let (teller, receipt) = deployer
        .deploy(FORTUNE_TELLER, args, network.confirmations())
        .await?;
    info!("FortuneTeller deployed to {:?} on {}", teller, network.name);

    let verified = ctx
        .verify_if_live(FORTUNE_TELLER, teller, encode_constructor_args(args))
        .await?;

    if let Some(coordinator) = &mock {
        deployer
            .send(
                VRF_COORDINATOR_MOCK,
                "addConsumer",
                coordinator.add_consumer(oracle.subscription_id, teller),
                1,
            )
            .await?;
        info!(
            "FortuneTeller registered as consumer of subscription {}",
            oracle.subscription_id
        );
    }

    Ok(TellerDeployment {
        network: network.name.clone(),
        teller,
        oracle,
        mock_deployed: mock.is_some(),
        tx_hash: receipt.transaction_hash,
        verified,
    })
}
