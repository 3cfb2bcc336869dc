use crate::application::context::TaskContext;
use crate::contracts::{encode_constructor_args, seeker_constructor_args, FORTUNE_SEEKER};
use crate::domain::deployment::{SeekerDeployment, UPDATE_INTERVAL_SEC};
use anyhow::Result;
use ethers::types::Address;
use tracing::info;

// No automation mock is needed: upkeep functions can be called directly.
pub async fn deploy_fortune_seeker(
    ctx: &TaskContext,
    fortune_teller: Address,
) -> Result<SeekerDeployment> {
    let network = &ctx.network;

    let args = seeker_constructor_args(fortune_teller, UPDATE_INTERVAL_SEC);
    let (seeker, receipt) = ctx
        .deployer()
        .deploy(FORTUNE_SEEKER, args, network.confirmations())
        .await?;
    info!("FortuneSeeker deployed to {:?} on {}", seeker, network.name);

    let verified = ctx
        .verify_if_live(FORTUNE_SEEKER, seeker, encode_constructor_args(args))
        .await?;

    Ok(SeekerDeployment {
        network: network.name.clone(),
        seeker,
        fortune_teller,
        update_interval: UPDATE_INTERVAL_SEC,
        tx_hash: receipt.transaction_hash,
        verified,
    })
}
