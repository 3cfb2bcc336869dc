use crate::config::{Config, NetworkConfig};
use crate::domain::{
    deployment::{confirmations_for, LOCAL_CHAIN_ID},
    errors::HarnessError,
};
use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::utils::{Anvil, AnvilInstance};
use std::{process::Command, sync::Arc, time::Duration};
use tracing::{debug, info};

pub type HarnessClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// First account of the well-known local development mnemonic.
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const LOCAL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A signing client bound to one configured network.
pub struct NetworkContext {
    pub name: String,
    pub config: NetworkConfig,
    pub client: Arc<HarnessClient>,
    // Keeps the in-process node alive for as long as the context.
    node: Option<AnvilInstance>,
}

impl NetworkContext {
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    pub fn is_local(&self) -> bool {
        self.config.is_local()
    }

    pub fn confirmations(&self) -> usize {
        confirmations_for(self.config.chain_id)
    }

    pub fn deployer(&self) -> Address {
        self.client.address()
    }
}

impl std::fmt::Debug for NetworkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkContext")
            .field("name", &self.name)
            .field("chain_id", &self.config.chain_id)
            .field("in_process", &self.node.is_some())
            .finish()
    }
}

pub fn anvil_available() -> bool {
    Command::new("anvil")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn spawn_local_node(hardfork: Option<&str>) -> Result<AnvilInstance, HarnessError> {
    if !anvil_available() {
        return Err(HarnessError::AnvilUnavailable);
    }
    let mut anvil = Anvil::new().chain_id(LOCAL_CHAIN_ID);
    if let Some(fork) = hardfork {
        anvil = anvil.args(["--hardfork", fork]);
    }
    Ok(anvil.spawn())
}

fn signing_key(name: &str, net: &NetworkConfig) -> Result<LocalWallet> {
    let key = match net.accounts.first() {
        Some(key) => key.as_str(),
        None if net.is_local() => DEV_PRIVATE_KEY,
        None => return Err(HarnessError::MissingAccount(name.to_string()).into()),
    };
    let wallet = key
        .parse::<LocalWallet>()
        .with_context(|| format!("invalid private key for network {}", name))?;
    Ok(wallet.with_chain_id(net.chain_id))
}

/// Builds the client for `name`, spawning a throw-away node when the
/// network is local and has no RPC URL.
pub async fn connect(config: &Config, name: &str) -> Result<NetworkContext> {
    let net = config.network(name)?.clone();

    let (endpoint, wallet, node) = match &net.rpc_url {
        None if net.is_local() => {
            let node = spawn_local_node(net.hardfork.as_deref())?;
            info!(endpoint = %node.endpoint(), "Started in-process node for {}", name);
            let wallet: LocalWallet = node.keys()[0].clone().into();
            (node.endpoint(), wallet.with_chain_id(net.chain_id), Some(node))
        }
        None => anyhow::bail!("network {} needs an rpc_url", name),
        Some(url) => (url.clone(), signing_key(name, &net)?, None),
    };

    let mut provider = Provider::<Http>::try_from(endpoint.as_str())
        .with_context(|| format!("invalid rpc url for network {}", name))?;
    let interval = net
        .poll_interval_ms
        .map(Duration::from_millis)
        .or_else(|| net.is_local().then_some(LOCAL_POLL_INTERVAL));
    if let Some(interval) = interval {
        provider = provider.interval(interval);
    }

    let remote_chain_id = provider
        .get_chainid()
        .await
        .with_context(|| format!("query chain id of network {}", name))?;
    if remote_chain_id != U256::from(net.chain_id) {
        anyhow::bail!(
            "network {} is configured with chain id {} but the node reports {}",
            name,
            net.chain_id,
            remote_chain_id
        );
    }
    debug!(chain_id = net.chain_id, deployer = ?wallet.address(), "Connected to {}", name);

    Ok(NetworkContext {
        name: name.to_string(),
        config: net,
        client: Arc::new(SignerMiddleware::new(provider, wallet)),
        node,
    })
}
