//! Registry contract client implementing the core collaborator traits.

use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use chainreg_core::{CostProbe, RegistrationQuery, RegistryError, RegistrySubmitter};

use crate::abi::RegistryAbi;
use crate::http::HttpTransport;
use crate::rpc::{parse_quantity, to_quantity, RpcClient, RpcTransport};

/// Connection and transaction settings for a registry contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    /// JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Registry contract address.
    pub address: Address,
    /// Gas price in wei for submitted transactions.
    #[serde(default = "default_gas_price")]
    pub gas_price: u128,
    /// Timeout for a single HTTP request (milliseconds).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How often to poll for a transaction receipt (milliseconds).
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    /// How long to wait for a receipt before giving up (milliseconds).
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

fn default_rpc_url() -> String {
    "http://localhost:8545".into()
}
fn default_gas_price() -> u128 {
    21_000_000_000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}
fn default_receipt_timeout_ms() -> u64 {
    600_000
}

impl ContractConfig {
    pub fn new(address: Address) -> Self {
        Self {
            rpc_url: default_rpc_url(),
            address,
            gas_price: default_gas_price(),
            request_timeout_ms: default_request_timeout_ms(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    tx_hash: String,
    status: Option<String>,
    #[serde(rename = "gasUsed")]
    gas_used: Option<String>,
}

/// A deployed registry contract reached over JSON-RPC.
///
/// The owner is resolved once at connect time and used as the sender of
/// every probe and transaction. Transactions are signed by the node
/// (`eth_sendTransaction`), so the owner account must be unlocked there.
pub struct RegistryContract<T> {
    rpc: RpcClient<T>,
    abi: RegistryAbi,
    owner: Address,
    config: ContractConfig,
}

impl RegistryContract<HttpTransport> {
    /// Connect over HTTP to `config.rpc_url`.
    pub async fn connect_http(config: ContractConfig) -> Result<Self, RegistryError> {
        let transport = HttpTransport::new(
            config.rpc_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Self::connect(transport, config).await
    }
}

impl<T: RpcTransport> RegistryContract<T> {
    /// Bind to the contract and resolve its owner.
    pub async fn connect(transport: T, config: ContractConfig) -> Result<Self, RegistryError> {
        let rpc = RpcClient::new(transport);
        let abi = RegistryAbi::new()?;
        let data = abi.owner()?;
        let owner = abi.decode_owner(&call_contract(&rpc, config.address, &data).await?)?;
        tracing::info!(
            url = rpc.transport().url(),
            contract = %config.address,
            %owner,
            "connected to registry contract"
        );
        Ok(Self {
            rpc,
            abi,
            owner,
            config,
        })
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    fn transaction(&self, data: &[u8]) -> Value {
        json!({
            "from": self.owner,
            "to": self.config.address,
            "data": format!("0x{}", hex::encode(data)),
        })
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TransactionReceipt, RegistryError> {
        let poll = Duration::from_millis(self.config.receipt_poll_interval_ms);
        let timeout_ms = self.config.receipt_timeout_ms;

        let wait = async {
            loop {
                let receipt: Option<TransactionReceipt> = self
                    .rpc
                    .call("eth_getTransactionReceipt", vec![json!(tx_hash)])
                    .await?;
                if let Some(receipt) = receipt {
                    return Ok::<_, RegistryError>(receipt);
                }
                tokio::time::sleep(poll).await;
            }
        };

        tokio::time::timeout(Duration::from_millis(timeout_ms), wait)
            .await
            .map_err(|_| RegistryError::Timeout { ms: timeout_ms })?
    }
}

async fn call_contract<T: RpcTransport>(
    rpc: &RpcClient<T>,
    to: Address,
    data: &[u8],
) -> Result<Vec<u8>, RegistryError> {
    let tx = json!({ "to": to, "data": format!("0x{}", hex::encode(data)) });
    let result: String = rpc.call("eth_call", vec![tx, json!("latest")]).await?;
    hex::decode(result.trim_start_matches("0x"))
        .map_err(|e| RegistryError::Rpc(format!("invalid eth_call result: {e}")))
}

#[async_trait]
impl<T: RpcTransport> CostProbe for RegistryContract<T> {
    async fn estimate_cost(
        &self,
        addresses: &[Address],
        register: bool,
    ) -> Result<u64, RegistryError> {
        let data = self.abi.change_statuses(addresses, register)?;
        let gas: String = self
            .rpc
            .call("eth_estimateGas", vec![self.transaction(&data)])
            .await?;
        parse_quantity(&gas)
    }
}

#[async_trait]
impl<T: RpcTransport> RegistrationQuery for RegistryContract<T> {
    async fn is_registered(&self, address: Address) -> Result<bool, RegistryError> {
        let data = self.abi.registered(address)?;
        let ret = call_contract(&self.rpc, self.config.address, &data).await?;
        self.abi.decode_registered(&ret)
    }
}

#[async_trait]
impl<T: RpcTransport> RegistrySubmitter for RegistryContract<T> {
    async fn authorized_identity(&self) -> Result<Address, RegistryError> {
        Ok(self.owner)
    }

    async fn submit(
        &self,
        addresses: &[Address],
        register: bool,
        gas: Option<u64>,
    ) -> Result<(), RegistryError> {
        let data = self.abi.change_statuses(addresses, register)?;
        let mut tx = self.transaction(&data);
        tx["gasPrice"] = json!(to_quantity(self.config.gas_price));
        if let Some(gas) = gas {
            tx["gas"] = json!(to_quantity(gas));
        }

        let tx_hash: String = self.rpc.call("eth_sendTransaction", vec![tx]).await?;
        tracing::debug!(%tx_hash, size = addresses.len(), "transaction sent");

        let receipt = self.wait_for_receipt(&tx_hash).await?;
        match receipt.status.as_deref() {
            Some("0x0") => Err(RegistryError::Reverted {
                tx_hash: receipt.tx_hash,
            }),
            _ => {
                tracing::debug!(
                    tx_hash = %receipt.tx_hash,
                    gas_used = receipt.gas_used.as_deref().unwrap_or("unknown"),
                    "transaction mined"
                );
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{JsonRpcRequest, JsonRpcResponse};
    use std::sync::Mutex;

    const CONTRACT: Address = Address::repeat_byte(0xcc);
    const OWNER: Address = Address::repeat_byte(0xaa);

    type Handler = Box<dyn Fn(&JsonRpcRequest, usize) -> Result<Value, RegistryError> + Send + Sync>;

    /// Answers each request with `handler(request, nth call of that method)`.
    struct ScriptedTransport {
        handler: Handler,
        requests: Mutex<Vec<JsonRpcRequest>>,
    }

    impl ScriptedTransport {
        fn new(
            handler: impl Fn(&JsonRpcRequest, usize) -> Result<Value, RegistryError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                handler: Box::new(handler),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self, method: &str) -> Vec<JsonRpcRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method == method)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RegistryError> {
            let nth = {
                let mut requests = self.requests.lock().unwrap();
                let nth = requests.iter().filter(|r| r.method == req.method).count();
                requests.push(req.clone());
                nth
            };
            let result = (self.handler)(&req, nth)?;
            Ok(JsonRpcResponse::ok(req.id, result))
        }

        fn url(&self) -> &str {
            "scripted"
        }
    }

    fn word_hex(last: &[u8]) -> String {
        let mut w = vec![0u8; 32 - last.len()];
        w.extend_from_slice(last);
        format!("0x{}", hex::encode(w))
    }

    fn fast_config() -> ContractConfig {
        ContractConfig {
            receipt_poll_interval_ms: 1,
            receipt_timeout_ms: 50,
            ..ContractConfig::new(CONTRACT)
        }
    }

    /// Default node: owner() → OWNER, estimates 21000 + 20000/address,
    /// every address registered iff its last byte is odd, receipts after one poll.
    fn node(req: &JsonRpcRequest, nth: usize) -> Result<Value, RegistryError> {
        match req.method.as_str() {
            "eth_call" => {
                let data = req.params[0]["data"].as_str().unwrap();
                if data.len() == 2 + 8 {
                    Ok(json!(word_hex(OWNER.as_slice())))
                } else {
                    let last = u8::from_str_radix(&data[data.len() - 2..], 16).unwrap();
                    Ok(json!(word_hex(&[last % 2])))
                }
            }
            "eth_estimateGas" => {
                let data = req.params[0]["data"].as_str().unwrap();
                let n = (data.len() - 2 - 8) / 64 - 3;
                Ok(json!(to_quantity(21_000 + 20_000 * n as u64)))
            }
            "eth_sendTransaction" => Ok(json!(format!("0x{:064x}", nth + 1))),
            "eth_getTransactionReceipt" if nth == 0 => Ok(Value::Null),
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": req.params[0],
                "status": "0x1",
                "gasUsed": "0x5208",
            })),
            other => Err(RegistryError::Rpc(format!("unexpected method {other}"))),
        }
    }

    #[tokio::test]
    async fn connect_resolves_owner() {
        let contract = RegistryContract::connect(ScriptedTransport::new(node), fast_config())
            .await
            .unwrap();
        assert_eq!(contract.owner(), OWNER);
        assert_eq!(contract.authorized_identity().await.unwrap(), OWNER);
        assert_eq!(contract.address(), CONTRACT);
    }

    #[tokio::test]
    async fn estimate_cost_parses_gas_and_sends_from_owner() {
        let contract = RegistryContract::connect(ScriptedTransport::new(node), fast_config())
            .await
            .unwrap();
        let gas = contract
            .estimate_cost(&[Address::repeat_byte(1), Address::repeat_byte(2)], true)
            .await
            .unwrap();
        assert_eq!(gas, 61_000);

        let reqs = contract.rpc.transport().requests("eth_estimateGas");
        assert_eq!(reqs.len(), 1);
        let from: Address = serde_json::from_value(reqs[0].params[0]["from"].clone()).unwrap();
        assert_eq!(from, OWNER);
    }

    #[tokio::test]
    async fn estimate_cost_surfaces_node_refusal() {
        let transport = ScriptedTransport::new(|req, nth| match req.method.as_str() {
            "eth_estimateGas" => Err(RegistryError::Rpc("gas required exceeds allowance".into())),
            _ => node(req, nth),
        });
        let contract = RegistryContract::connect(transport, fast_config()).await.unwrap();
        assert!(contract.estimate_cost(&[Address::ZERO], true).await.is_err());
    }

    #[tokio::test]
    async fn is_registered_decodes_bool() {
        let contract = RegistryContract::connect(ScriptedTransport::new(node), fast_config())
            .await
            .unwrap();
        assert!(contract.is_registered(Address::with_last_byte(3)).await.unwrap());
        assert!(!contract.is_registered(Address::with_last_byte(4)).await.unwrap());
    }

    #[tokio::test]
    async fn submit_waits_for_successful_receipt() {
        let contract = RegistryContract::connect(ScriptedTransport::new(node), fast_config())
            .await
            .unwrap();
        contract
            .submit(&[Address::repeat_byte(9)], true, Some(41_000))
            .await
            .unwrap();

        let transport = contract.rpc.transport();
        let sent = transport.requests("eth_sendTransaction");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].params[0]["gas"], json!("0xa028"));
        assert_eq!(sent[0].params[0]["gasPrice"], json!("0x4e3b29200"));
        assert_eq!(transport.requests("eth_getTransactionReceipt").len(), 2);
    }

    #[tokio::test]
    async fn submit_without_gas_omits_field() {
        let contract = RegistryContract::connect(ScriptedTransport::new(node), fast_config())
            .await
            .unwrap();
        contract.submit(&[Address::ZERO], true, None).await.unwrap();
        let sent = contract.rpc.transport().requests("eth_sendTransaction");
        assert!(sent[0].params[0].get("gas").is_none());
    }

    #[tokio::test]
    async fn reverted_receipt_is_an_error() {
        let transport = ScriptedTransport::new(|req, nth| match req.method.as_str() {
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": req.params[0],
                "status": "0x0",
            })),
            _ => node(req, nth),
        });
        let contract = RegistryContract::connect(transport, fast_config()).await.unwrap();
        let err = contract.submit(&[Address::ZERO], true, Some(50_000)).await.unwrap_err();
        assert!(matches!(err, RegistryError::Reverted { .. }));
    }

    #[tokio::test]
    async fn missing_receipt_times_out() {
        let transport = ScriptedTransport::new(|req, nth| match req.method.as_str() {
            "eth_getTransactionReceipt" => Ok(Value::Null),
            _ => node(req, nth),
        });
        let contract = RegistryContract::connect(transport, fast_config()).await.unwrap();
        let err = contract.submit(&[Address::ZERO], true, Some(50_000)).await.unwrap_err();
        assert!(matches!(err, RegistryError::Timeout { ms: 50 }));
    }
}
