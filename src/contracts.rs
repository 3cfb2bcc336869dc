use anyhow::{Context, Result};
use ethers::abi::Tokenize;
use ethers::contract::EthEvent;
use ethers::prelude::abigen;
use ethers::types::{Address, Bytes, TransactionReceipt, U256};

pub const FORTUNE_TELLER: &str = "FortuneTeller";
pub const FORTUNE_SEEKER: &str = "FortuneSeeker";
pub const VRF_COORDINATOR_MOCK: &str = "VRFCoordinatorV2Mock";

/// Flat fee charged by the coordinator mock per request (0.1 LINK).
pub const BASE_FEE: u128 = 100_000_000_000_000_000;
/// 0.000000001 LINK per gas.
pub const GAS_PRICE_LINK: u128 = 1_000_000_000;
/// Amount a fresh mock subscription is funded with (1 ether).
pub const FUND_AMOUNT: u128 = 1_000_000_000_000_000_000;

abigen!(
    FortuneTeller,
    r#"[
        function requestRandomWords() external returns (uint256 requestId)
        function lastRequestId() external view returns (uint256)
        function getRequestStatus(uint256 _requestId) external view returns (bool fulfilled, uint256[] randomWords)
        function seekFortune() external payable returns (string)
        function getContractBalance() external view returns (uint256)
        function lastReturnedFortune() external view returns (string)
        event RequestSent(uint256 requestId, uint32 numWords)
        event RequestFulfilled(uint256 requestId, uint256[] randomWords)
    ]"#,
);

abigen!(
    FortuneSeeker,
    r#"[
        function fortune() external view returns (string)
        function seekFortune() external
        function checkUpkeep(bytes checkData) external returns (bool upkeepNeeded, bytes performData)
        function performUpkeep(bytes performData) external
        function getContractBalance() external view returns (uint256)
        function withdrawBalance() external
        event ReceivedFunding(uint256 amount)
    ]"#,
);

abigen!(
    VRFCoordinatorV2Mock,
    r#"[
        function createSubscription() external returns (uint64 subId)
        function fundSubscription(uint64 _subId, uint96 _amount) external
        function addConsumer(uint64 _subId, address _consumer) external
        function fulfillRandomWords(uint256 _requestId, address _consumer) external
        function getSubscription(uint64 _subId) external view returns (uint96 balance, uint64 reqCount, address owner, address[] consumers)
        event SubscriptionCreated(uint64 indexed subId, address owner)
        event SubscriptionFunded(uint64 indexed subId, uint256 oldBalance, uint256 newBalance)
        event ConsumerAdded(uint64 indexed subId, address consumer)
        event RandomWordsRequested(bytes32 indexed keyHash, uint256 requestId, uint256 preSeed, uint64 indexed subId, uint16 minimumRequestConfirmations, uint32 callbackGasLimit, uint32 numWords, address indexed sender)
        event RandomWordsFulfilled(uint256 indexed requestId, uint256 outputSeed, uint96 payment, bool success)
    ]"#,
);

pub fn mock_constructor_args() -> (U256, U256) {
    (U256::from(BASE_FEE), U256::from(GAS_PRICE_LINK))
}

pub fn teller_constructor_args(subscription_id: u64, coordinator: Address) -> (u64, Address) {
    (subscription_id, coordinator)
}

pub fn seeker_constructor_args(fortune_teller: Address, update_interval: u64) -> (Address, U256) {
    (fortune_teller, U256::from(update_interval))
}

/// ABI-encodes constructor arguments the way they are appended to creation code.
pub fn encode_constructor_args<T: Tokenize>(args: T) -> Bytes {
    ethers::abi::encode(&args.into_tokens()).into()
}

/// Reads the subscription id out of a `createSubscription` receipt.
pub fn subscription_id_from_receipt(receipt: &TransactionReceipt) -> Result<u64> {
    let signature = SubscriptionCreatedFilter::signature();
    let topic = receipt
        .logs
        .iter()
        .find(|log| log.topics.first() == Some(&signature))
        .and_then(|log| log.topics.get(1))
        .context("createSubscription receipt has no SubscriptionCreated event")?;

    let id = U256::from_big_endian(topic.as_bytes());
    if id.bits() > 64 {
        anyhow::bail!("subscription id {} does not fit in uint64", id);
    }
    Ok(id.as_u64())
}
