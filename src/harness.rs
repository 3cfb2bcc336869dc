//! Scaffolding for end-to-end scenarios against a local chain: a fixture
//! that deploys the full contract set, plus helpers for funding, time travel
//! and asserting on reverts and events.

use crate::application::deployer::ContractDeployer;
use crate::contracts::{
    seeker_constructor_args, teller_constructor_args, FortuneSeeker, FortuneTeller,
    VRFCoordinatorV2Mock, FORTUNE_SEEKER, FORTUNE_TELLER, VRF_COORDINATOR_MOCK,
};
use crate::domain::deployment::UPDATE_INTERVAL_SEC;
use crate::infrastructure::ethereum_adapter::HarnessClient;
use anyhow::{Context, Result};
use ethers::abi::{ParamType, Token};
use ethers::contract::{parse_log, ContractError, EthEvent};
use ethers::prelude::*;
use ethers::utils::keccak256;

/// The contracts every scenario starts from.
pub struct FortuneFixture {
    pub coordinator: VRFCoordinatorV2Mock<HarnessClient>,
    pub subscription_id: u64,
    pub teller: FortuneTeller<HarnessClient>,
    pub seeker: FortuneSeeker<HarnessClient>,
}

impl FortuneFixture {
    /// Coordinator mock with a funded subscription, a FortuneTeller registered
    /// as its consumer, and a FortuneSeeker pointed at the teller.
    pub async fn deploy(deployer: &ContractDeployer<'_>) -> Result<Self> {
        let client = deployer.client.clone();
        let (coordinator, subscription_id) = deployer.deploy_oracle_mock().await?;

        let (teller, _) = deployer
            .deploy(
                FORTUNE_TELLER,
                teller_constructor_args(subscription_id, coordinator.address()),
                1,
            )
            .await?;
        deployer
            .send(
                VRF_COORDINATOR_MOCK,
                "addConsumer",
                coordinator.add_consumer(subscription_id, teller),
                1,
            )
            .await?;

        let (seeker, _) = deployer
            .deploy(
                FORTUNE_SEEKER,
                seeker_constructor_args(teller, UPDATE_INTERVAL_SEC),
                1,
            )
            .await?;

        Ok(Self {
            coordinator,
            subscription_id,
            teller: FortuneTeller::new(teller, client.clone()),
            seeker: FortuneSeeker::new(seeker, client),
        })
    }

    /// Requests randomness and has the mock fulfil it, as the oracle network would.
    pub async fn request_and_fulfill(
        &self,
        deployer: &ContractDeployer<'_>,
    ) -> Result<(U256, TransactionReceipt)> {
        deployer
            .send(
                FORTUNE_TELLER,
                "requestRandomWords",
                self.teller.request_random_words(),
                1,
            )
            .await?;
        let request_id = self.teller.last_request_id().call().await?;

        let receipt = deployer
            .send(
                VRF_COORDINATOR_MOCK,
                "fulfillRandomWords",
                self.coordinator
                    .fulfill_random_words(request_id, self.teller.address()),
                1,
            )
            .await?;
        Ok((request_id, receipt))
    }
}

/// Sends `value` wei from the deployer account to `address`.
pub async fn add_ether_to_contract_at(
    client: &HarnessClient,
    address: Address,
    value: U256,
) -> Result<TransactionReceipt> {
    let tx = TransactionRequest::new().to(address).value(value);
    let pending = client.send_transaction(tx, None).await?;
    pending
        .await?
        .context("funding transaction dropped from mempool")
}

/// Moves the chain clock forward and mines a block on top.
pub async fn increase_time<M: Middleware>(client: &M, seconds: u64) -> Result<()> {
    let provider = client.provider();
    provider
        .request::<_, serde_json::Value>("evm_increaseTime", [seconds])
        .await
        .context("evm_increaseTime")?;
    provider
        .request::<_, serde_json::Value>("evm_mine", ())
        .await
        .context("evm_mine")?;
    Ok(())
}

/// `keccak256("")`, the check data used for upkeep calls.
pub fn empty_check_data() -> Bytes {
    Bytes::from(keccak256(b"").to_vec())
}

/// The `string` reason of a reverted call, if the node returned one.
pub fn revert_reason<M: Middleware>(err: &ContractError<M>) -> Option<String> {
    if let Some(reason) = err.decode_revert::<String>() {
        return Some(reason);
    }
    // Some nodes only put the reason in the error message.
    let message = err.to_string();
    let (_, rest) = message
        .split_once("reverted with reason string ")
        .or_else(|| message.split_once("execution reverted: "))?;
    Some(rest.trim_matches(|c| c == '\'' || c == '"').to_string())
}

/// The amount carried by the seeker's funding event (first log of the receipt).
pub fn decode_received_funding(receipt: &TransactionReceipt) -> Result<U256> {
    let log = receipt
        .logs
        .first()
        .context("funding receipt has no logs")?;
    let tokens = ethers::abi::decode(&[ParamType::Uint(256)], &log.data)?;
    match tokens.as_slice() {
        [Token::Uint(amount)] => Ok(*amount),
        _ => anyhow::bail!("unexpected funding event data"),
    }
}

/// Events of type `E` emitted by `emitter` in `receipt`.
pub fn events_from<E: EthEvent>(receipt: &TransactionReceipt, emitter: Address) -> Vec<E> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == emitter && log.topics.first() == Some(&E::signature()))
        .filter_map(|log| parse_log::<E>(log.clone()).ok())
        .collect()
}
