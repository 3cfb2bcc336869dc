use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
    #[error("Missing configs for non localhost testnet")]
    MissingTestnetConfig { chain_id: u64 },
    #[error("No account configured for network {0} (set PRIVATE_KEY)")]
    MissingAccount(String),
    #[error("Artifact error: {0}")]
    Artifact(String),
    #[error("Verification error: {0}")]
    Verification(String),
    #[error("anvil binary not found in PATH; install it with `foundryup`")]
    AnvilUnavailable,
}
