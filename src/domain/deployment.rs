use ethers::types::{Address, H256};

/// Chain id shared by the in-process node and `localhost`.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Seconds between upkeeps for every deployed FortuneSeeker.
pub const UPDATE_INTERVAL_SEC: u64 = 10;

pub fn is_local_chain(chain_id: u64) -> bool {
    chain_id == LOCAL_CHAIN_ID
}

/// Block confirmations to wait for after a deployment transaction.
pub fn confirmations_for(chain_id: u64) -> usize {
    if is_local_chain(chain_id) {
        1
    } else {
        3
    }
}

/// Where the randomness subscription for a FortuneTeller comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleBinding {
    pub subscription_id: u64,
    pub coordinator: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TellerDeployment {
    pub network: String,
    pub teller: Address,
    pub oracle: OracleBinding,
    /// True when a VRFCoordinatorV2Mock was deployed for this run.
    pub mock_deployed: bool,
    pub tx_hash: H256,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekerDeployment {
    pub network: String,
    pub seeker: Address,
    pub fortune_teller: Address,
    pub update_interval: u64,
    pub tx_hash: H256,
    pub verified: bool,
}
