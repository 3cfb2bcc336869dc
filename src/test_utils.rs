use crate::application::context::TaskContext;
use crate::config::Config;
use crate::contracts::{
    SubscriptionCreatedFilter, FORTUNE_SEEKER, FORTUNE_TELLER, VRF_COORDINATOR_MOCK,
};
use ethers::abi::Token;
use ethers::contract::EthEvent;
use ethers::providers::{JsonRpcClient, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Block, Bytes, FeeHistory, Log, Transaction, TransactionReceipt, H256, U256, U64,
};
use ethers::utils::{id, keccak256, rlp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Scripted JSON-RPC transport: answers requests in push order and keeps
/// a log of what was asked.
#[derive(Clone, Debug, Default)]
pub struct MockClient {
    responses: Arc<Mutex<Vec<serde_json::Value>>>,
    requests: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Serialize>(&self, res: T) {
        self.responses.lock().unwrap().push(serde_json::to_value(res).unwrap());
    }

    pub fn requests(&self) -> Vec<(String, serde_json::Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl JsonRpcClient for MockClient {
    type Error = ProviderError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params).map_err(ProviderError::SerdeJson)?;
        self.requests.lock().unwrap().push((method.to_string(), params));

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::CustomError(format!("No responses for {}", method)));
        }
        let res = responses.remove(0);
        serde_json::from_value(res).map_err(ProviderError::SerdeJson)
    }
}

/// Creation code shared by every artifact from [`write_artifacts`].
pub const CREATION_CODE: &str = "0x6080604052";

/// Subscription id the scripted coordinator hands out.
pub const SCRIPTED_SUBSCRIPTION_ID: u64 = 1;

const GWEI: u64 = 1_000_000_000;

/// Writes minimal Hardhat artifacts (constructor ABI plus creation code) for
/// every contract the harness deploys.
pub fn write_artifacts(root: &Path) {
    let constructors = [
        (
            FORTUNE_TELLER,
            json!([
                {"name": "subscriptionId", "type": "uint64"},
                {"name": "vrfCoordinator", "type": "address"}
            ]),
        ),
        (
            FORTUNE_SEEKER,
            json!([
                {"name": "_fortuneTeller", "type": "address"},
                {"name": "_updateInterval", "type": "uint256"}
            ]),
        ),
        (
            VRF_COORDINATOR_MOCK,
            json!([
                {"name": "_baseFee", "type": "uint96"},
                {"name": "_gasPriceLink", "type": "uint96"}
            ]),
        ),
    ];
    for (name, inputs) in constructors {
        let dir = root.join(format!("contracts/{}.sol", name));
        std::fs::create_dir_all(&dir).unwrap();
        let artifact = json!({
            "contractName": name,
            "sourceName": format!("contracts/{}.sol", name),
            "abi": [{"type": "constructor", "stateMutability": "nonpayable", "inputs": inputs}],
            "bytecode": CREATION_CODE,
        });
        std::fs::write(dir.join(format!("{}.json", name)), artifact.to_string()).unwrap();
    }
}

/// Default networks with `localhost` and `fuji` served from `rpc_url`, a
/// deployer key for `fuji` and artifacts read from `artifacts`.
pub fn scripted_config(rpc_url: &str, artifacts: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.paths.artifacts = artifacts.to_path_buf();
    for name in ["localhost", "fuji"] {
        if let Some(net) = cfg.networks.get_mut(name) {
            net.rpc_url = Some(rpc_url.to_string());
            net.poll_interval_ms = Some(10);
        }
    }
    if let Some(fuji) = cfg.networks.get_mut("fuji") {
        fuji.accounts =
            vec!["0x0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20".to_string()];
    }
    cfg
}

/// A task context for `network` backed by a fresh [`ScriptedNode`], with
/// artifacts written under `artifacts`. Keep the server alive for the test.
pub async fn scripted_context(
    chain_id: u64,
    network: &str,
    artifacts: &Path,
) -> (MockServer, ScriptedNode, TaskContext) {
    let (server, node) = ScriptedNode::start(chain_id).await;
    write_artifacts(artifacts);
    let ctx = crate::startup::build_with(scripted_config(&server.uri(), artifacts), Some(network))
        .await
        .unwrap();
    (server, node, ctx)
}

/// JSON-RPC node behind a wiremock server. Every raw transaction is mined
/// into a block of its own and the node keeps a log of what it served.
#[derive(Clone, Default)]
pub struct ScriptedNode {
    state: Arc<Mutex<NodeState>>,
}

#[derive(Default)]
struct NodeState {
    chain_id: u64,
    block: u64,
    methods: Vec<String>,
    transactions: Vec<TypedTransaction>,
    receipts: HashMap<H256, TransactionReceipt>,
    reverting_selectors: Vec<[u8; 4]>,
    revert_deployments: bool,
}

impl ScriptedNode {
    pub async fn start(chain_id: u64) -> (MockServer, Self) {
        let node = Self::default();
        node.state().chain_id = chain_id;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(node.clone())
            .mount(&server)
            .await;
        (server, node)
    }

    /// Mines calls to `signature` (e.g. `addConsumer(uint64,address)`) with status 0.
    pub fn revert_on(&self, signature: &str) {
        self.state().reverting_selectors.push(id(signature));
    }

    /// Mines contract creations with status 0.
    pub fn revert_deployments(&self) {
        self.state().revert_deployments = true;
    }

    /// JSON-RPC methods in the order they were served.
    pub fn methods(&self) -> Vec<String> {
        self.state().methods.clone()
    }

    /// Decoded `eth_sendRawTransaction` payloads in submission order.
    pub fn transactions(&self) -> Vec<TypedTransaction> {
        self.state().transactions.clone()
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap()
    }
}

impl NodeState {
    fn answer(&mut self, method: &str, params: &Value) -> Option<Value> {
        match method {
            "eth_chainId" => to_json(U64::from(self.chain_id)),
            // Far enough ahead for any confirmation count the harness uses.
            "eth_blockNumber" => to_json(U64::from(self.block + 10)),
            "eth_getTransactionCount" => to_json(U256::from(self.transactions.len())),
            "eth_gasPrice" | "eth_maxPriorityFeePerGas" => to_json(U256::from(GWEI)),
            "eth_getBlockByNumber" => {
                let block = Block::<H256> {
                    number: Some(U64::from(self.block)),
                    base_fee_per_gas: Some(U256::from(GWEI)),
                    ..Default::default()
                };
                to_json(block)
            }
            "eth_feeHistory" => {
                let history = FeeHistory {
                    oldest_block: U256::zero(),
                    base_fee_per_gas: vec![U256::from(GWEI); 11],
                    gas_used_ratio: vec![0.5; 10],
                    reward: vec![],
                };
                to_json(history)
            }
            "eth_estimateGas" => to_json(U256::from(1_000_000u64)),
            // Every view the harness reads back returns a single word.
            "eth_call" => to_json(Bytes::from(H256::from_low_u64_be(1).as_bytes().to_vec())),
            "eth_sendRawTransaction" => {
                let raw: Bytes = serde_json::from_value(params[0].clone()).ok()?;
                let hash = self.mine(&raw)?;
                to_json(hash)
            }
            "eth_getTransactionByHash" => {
                let hash: H256 = serde_json::from_value(params[0].clone()).ok()?;
                let receipt = self.receipts.get(&hash)?;
                let tx = Transaction {
                    hash,
                    block_hash: receipt.block_hash,
                    block_number: receipt.block_number,
                    ..Default::default()
                };
                to_json(tx)
            }
            "eth_getTransactionReceipt" => {
                let hash: H256 = serde_json::from_value(params[0].clone()).ok()?;
                to_json(self.receipts.get(&hash)?)
            }
            _ => None,
        }
    }

    fn mine(&mut self, raw: &Bytes) -> Option<H256> {
        let (tx, _) = TypedTransaction::decode_signed(&rlp::Rlp::new(raw)).ok()?;
        let hash = H256::from(keccak256(raw));
        self.block += 1;

        let data = tx.data().cloned().unwrap_or_default();
        let selector = data.get(..4);
        let to = tx.to().and_then(|to| to.as_address()).copied();
        let reverted = match to {
            None => self.revert_deployments,
            Some(_) => self
                .reverting_selectors
                .iter()
                .any(|s| selector == Some(&s[..])),
        };

        let mut logs = vec![];
        if selector == Some(&id("createSubscription()")[..]) {
            logs.push(Log {
                address: to.unwrap_or_default(),
                topics: vec![
                    SubscriptionCreatedFilter::signature(),
                    H256::from_low_u64_be(SCRIPTED_SUBSCRIPTION_ID),
                ],
                data: ethers::abi::encode(&[Token::Address(Address::zero())]).into(),
                ..Default::default()
            });
        }

        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_hash: Some(H256::from_low_u64_be(self.block)),
            block_number: Some(U64::from(self.block)),
            contract_address: to
                .is_none()
                .then(|| Address::from_low_u64_be(0xc0de + self.transactions.len() as u64)),
            gas_used: Some(U256::from(21_000 + 16 * data.len() as u64)),
            status: Some(U64::from(u64::from(!reverted))),
            logs,
            ..Default::default()
        };
        self.transactions.push(tx);
        self.receipts.insert(hash, receipt);
        Some(hash)
    }
}

fn to_json<T: Serialize>(value: T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

impl Respond for ScriptedNode {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let method = body["method"].as_str().unwrap_or_default().to_string();

        let mut state = self.state();
        state.methods.push(method.clone());
        let reply = match state.answer(&method, &body["params"]) {
            Some(result) => json!({"jsonrpc": "2.0", "id": body["id"], "result": result}),
            None => json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "error": {"code": -32601, "message": format!("{} not served", method)}
            }),
        };
        ResponseTemplate::new(200).set_body_json(reply)
    }
}
