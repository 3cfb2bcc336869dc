use crate::domain::{
    deployment::{is_local_chain, LOCAL_CHAIN_ID},
    errors::HarnessError,
};
use anyhow::{Context, Result};
use ethers::types::Address;
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

pub const DEFAULT_FUJI_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";
pub const DEFAULT_LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_network_name")]
    pub default_network: String,
    #[serde(default = "default_networks")]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Oracle settings for live testnets, keyed by chain id.
    #[serde(default = "default_testnets")]
    pub testnets: BTreeMap<u64, TestnetConfig>,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub gas_reporter: GasReporterConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    pub hardfork: Option<String>,
    /// Receipt polling interval; local networks default to 50ms.
    pub poll_interval_ms: Option<u64>,
    pub explorer: Option<ExplorerConfig>,
    // Private keys only ever come from the environment.
    #[serde(skip)]
    pub accounts: Vec<String>,
}

impl NetworkConfig {
    pub fn is_local(&self) -> bool {
        is_local_chain(self.chain_id)
    }

    /// Explorer settings, but only when an API key is actually available.
    pub fn verification_target(&self) -> Option<&ExplorerConfig> {
        self.explorer
            .as_ref()
            .filter(|e| e.api_key.as_deref().is_some_and(|k| !k.is_empty()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExplorerConfig {
    pub api_url: String,
    pub browser_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ExplorerConfig {
    /// Browser page of a verified contract, when a browser URL is configured.
    pub fn contract_url(&self, address: Address) -> Option<String> {
        let base = self.browser_url.as_deref()?.trim_end_matches('/');
        Some(format!("{}/address/{:?}#code", base, address))
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TestnetConfig {
    pub subscription_id: Option<u64>,
    pub coordinator_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Paths {
    #[serde(default = "default_artifacts")]
    pub artifacts: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            artifacts: default_artifacts(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GasReporterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_gas_output")]
    pub output_file: PathBuf,
}

impl Default for GasReporterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_file: default_gas_output(),
        }
    }
}

fn default_network_name() -> String {
    "hardhat".to_string()
}

fn default_artifacts() -> PathBuf {
    PathBuf::from("./build/artifacts")
}

fn default_gas_output() -> PathBuf {
    PathBuf::from("gas-report.txt")
}

fn default_networks() -> BTreeMap<String, NetworkConfig> {
    let mut networks = BTreeMap::new();
    networks.insert(
        "hardhat".to_string(),
        NetworkConfig {
            chain_id: LOCAL_CHAIN_ID,
            rpc_url: None,
            hardfork: Some("merge".to_string()),
            poll_interval_ms: None,
            explorer: None,
            accounts: vec![],
        },
    );
    networks.insert(
        "localhost".to_string(),
        NetworkConfig {
            chain_id: LOCAL_CHAIN_ID,
            rpc_url: Some(DEFAULT_LOCALHOST_RPC_URL.to_string()),
            hardfork: None,
            poll_interval_ms: None,
            explorer: None,
            accounts: vec![],
        },
    );
    networks.insert(
        "fuji".to_string(),
        NetworkConfig {
            chain_id: 43113,
            rpc_url: Some(DEFAULT_FUJI_RPC_URL.to_string()),
            hardfork: None,
            poll_interval_ms: None,
            explorer: Some(ExplorerConfig {
                api_url: "https://api-testnet.snowtrace.io/api".to_string(),
                browser_url: Some("https://testnet.snowtrace.io".to_string()),
                api_key_env: Some("FUJI_SNOWTRACE_API_KEY".to_string()),
                api_key: None,
            }),
            accounts: vec![],
        },
    );
    networks
}

fn default_testnets() -> BTreeMap<u64, TestnetConfig> {
    let mut testnets = BTreeMap::new();
    testnets.insert(
        43113,
        TestnetConfig {
            subscription_id: None,
            coordinator_address: Some("0x2eD832Ba664535e5886b75D64C46EB9a228C2610".to_string()),
        },
    );
    testnets
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_network: default_network_name(),
            networks: default_networks(),
            testnets: default_testnets(),
            paths: Paths::default(),
            gas_reporter: GasReporterConfig::default(),
        }
    }
}

impl Config {
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, HarnessError> {
        self.networks
            .get(name)
            .ok_or_else(|| HarnessError::UnknownNetwork(name.to_string()))
    }

    /// Overlays secrets and per-network overrides from the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let private_key = set("PRIVATE_KEY");

        for (name, net) in self.networks.iter_mut() {
            if let Some(url) = set(&format!("{}_RPC_URL", name.to_uppercase())) {
                net.rpc_url = Some(url);
            }
            if !net.is_local() && net.accounts.is_empty() {
                if let Some(pk) = &private_key {
                    net.accounts = vec![pk.clone()];
                }
            }
            if let Some(explorer) = net.explorer.as_mut() {
                if let Some(var) = &explorer.api_key_env {
                    explorer.api_key = set(var);
                }
            }
        }

        if let Some(flag) = set("REPORT_GAS") {
            self.gas_reporter.enabled = matches!(flag.to_lowercase().as_str(), "true" | "1");
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read config yaml {}", path.display()))?;
            serde_yaml::from_str(&raw).context("parse yaml")?
        }
        None => Config::default(),
    };
    cfg.apply_env(|key| std::env::var(key).ok());
    validate_config(&cfg)?;
    Ok(cfg)
}

fn validate_config(cfg: &Config) -> Result<()> {
    cfg.network(&cfg.default_network)
        .context("default_network is not one of the configured networks")?;

    for (name, net) in &cfg.networks {
        if !net.is_local() && net.rpc_url.is_none() {
            anyhow::bail!("network {} needs an rpc_url", name);
        }
    }

    for (chain_id, testnet) in &cfg.testnets {
        if let Some(addr) = &testnet.coordinator_address {
            addr.parse::<Address>()
                .with_context(|| format!("Invalid coordinator address for chain {}", chain_id))?;
        }
    }

    Ok(())
}
