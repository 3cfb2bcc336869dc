use crate::domain::errors::HarnessError;
use async_trait::async_trait;
use ethers::types::{Address, Bytes};

/// Everything an explorer needs to match deployed bytecode to its source.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub address: Address,
    /// `path/to/Source.sol:Name`
    pub contract_name: String,
    /// solc long version prefixed with `v`, e.g. `v0.8.7+commit.e28d00a7`.
    pub compiler_version: String,
    /// Standard JSON input the contract was compiled from.
    pub source: serde_json::Value,
    pub constructor_args: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
}

#[async_trait]
pub trait Verifier: Send + Sync {
    /// Submits the source and waits for the explorer's verdict.
    async fn verify(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, HarnessError>;
}
