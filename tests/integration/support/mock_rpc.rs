//! In-process mock of a network node: enough JSON-RPC surface for the
//! client, faucet, account, and contract flows to run end to end.

use std::{
    collections::{BTreeMap, HashMap},
    convert::Infallible,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{body, Body, Method, Request, Response, Server, StatusCode};
use nilrs::contract::Token;
use nilrs::encoding::ExternalTransaction;
use nilrs::types::TxReceipt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const RECEIPT_GAS_USED: u64 = 21_000;

/// Well-known faucets served by the mock registry.
pub const FAUCET_NAMES: [&str; 4] = ["NIL", "ETH", "BTC", "USDT"];

struct TokenContract {
    name: String,
    id: U256,
    own_balance: U256,
    holder_balances: HashMap<Address, U256>,
}

#[derive(Default)]
struct NetworkState {
    balances: HashMap<Address, U256>,
    token_balances: HashMap<Address, BTreeMap<Address, U256>>,
    code: HashMap<Address, Bytes>,
    seqnos: HashMap<Address, u64>,
    receipts: HashMap<B256, TxReceipt>,
    faucets: BTreeMap<String, Address>,
    tokens: HashMap<Address, TokenContract>,
    request_headers: Vec<HashMap<String, String>>,
}

#[derive(Clone)]
pub struct MockNetwork {
    inner: Arc<RwLock<NetworkState>>,
    chain_id: u64,
    tx_counter: Arc<AtomicU64>,
}

impl MockNetwork {
    pub fn new(chain_id: u64) -> Self {
        let mut state = NetworkState::default();
        for name in FAUCET_NAMES {
            state.faucets.insert(name.to_owned(), faucet_address(name));
        }

        Self {
            inner: Arc::new(RwLock::new(state)),
            chain_id,
            tx_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Deploys a token contract the `eth_call` handler can answer for.
    pub fn register_token(
        &self,
        address: Address,
        name: impl Into<String>,
        id: U256,
        own_balance: U256,
    ) {
        let mut inner = self.inner.write().expect("mock network poisoned");
        inner.code.insert(address, pseudo_code(address));
        inner.tokens.insert(
            address,
            TokenContract {
                name: name.into(),
                id,
                own_balance,
                holder_balances: HashMap::new(),
            },
        );
    }

    pub fn set_token_holder_balance(&self, token: Address, holder: Address, amount: U256) {
        let mut inner = self.inner.write().expect("mock network poisoned");
        if let Some(contract) = inner.tokens.get_mut(&token) {
            contract.holder_balances.insert(holder, amount);
        }
    }

    /// Header maps of every request the node has served, in arrival order.
    pub fn recorded_headers(&self) -> Vec<HashMap<String, String>> {
        self.inner
            .read()
            .expect("mock network poisoned")
            .request_headers
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner
            .read()
            .expect("mock network poisoned")
            .request_headers
            .len()
    }

    fn record_headers(&self, headers: HashMap<String, String>) {
        self.inner
            .write()
            .expect("mock network poisoned")
            .request_headers
            .push(headers);
    }

    fn next_tx_hash(&self) -> B256 {
        let counter = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        keccak256(counter.to_be_bytes())
    }

    fn handle_call(&self, call: Value) -> Value {
        let id = call.get("id").cloned().unwrap_or(Value::Null);
        let method = call
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = call
            .get("params")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        match self.dispatch(&method, &params) {
            Ok(result) => success(id, result),
            Err((code, message)) => error(id, code, message),
        }
    }

    fn dispatch(&self, method: &str, params: &Value) -> Result<Value, (i64, String)> {
        match method {
            "eth_chainId" => Ok(json!(self.chain_id)),
            "eth_gasPrice" => to_json(&U256::from(10u64)),
            "eth_getBalance" => {
                let address: Address = param(params, 0)?;
                let inner = self.inner.read().expect("mock network poisoned");
                to_json(&inner.balances.get(&address).copied().unwrap_or_default())
            }
            "eth_getTokens" => {
                let address: Address = param(params, 0)?;
                let inner = self.inner.read().expect("mock network poisoned");
                let tokens = inner.token_balances.get(&address).cloned().unwrap_or_default();
                to_json(&tokens)
            }
            "eth_getCode" => {
                let address: Address = param(params, 0)?;
                let inner = self.inner.read().expect("mock network poisoned");
                to_json(&inner.code.get(&address).cloned().unwrap_or_default())
            }
            "eth_getTransactionCount" => {
                let address: Address = param(params, 0)?;
                let inner = self.inner.read().expect("mock network poisoned");
                Ok(json!(inner.seqnos.get(&address).copied().unwrap_or(0)))
            }
            "eth_call" => self.handle_eth_call(params),
            "eth_sendRawTransaction" => self.handle_send_raw(params),
            "eth_getTransactionReceipt" => {
                let hash: B256 = param(params, 0)?;
                let inner = self.inner.read().expect("mock network poisoned");
                match inner.receipts.get(&hash) {
                    Some(receipt) => to_json(receipt),
                    None => Ok(Value::Null),
                }
            }
            "faucet_getFaucets" => {
                let inner = self.inner.read().expect("mock network poisoned");
                to_json(&inner.faucets)
            }
            "faucet_topUpViaFaucet" => self.handle_top_up(params),
            _ => Err((-32601, format!("unknown method {method}"))),
        }
    }

    fn handle_eth_call(&self, params: &Value) -> Result<Value, (i64, String)> {
        let args: Value = param(params, 0)?;
        let to: Address = field(&args, "to")?;
        let data: Bytes = field(&args, "data")?;

        let inner = self.inner.read().expect("mock network poisoned");
        let contract = inner
            .tokens
            .get(&to)
            .ok_or((-32000, format!("no contract deployed at {to}")))?;

        let output = if data.starts_with(&Token::getTokenNameCall::SELECTOR) {
            Token::getTokenNameCall::abi_encode_returns(&(contract.name.clone(),))
        } else if data.starts_with(&Token::getTokenIdCall::SELECTOR) {
            Token::getTokenIdCall::abi_encode_returns(&(contract.id,))
        } else if data.starts_with(&Token::getOwnTokenBalanceCall::SELECTOR) {
            Token::getOwnTokenBalanceCall::abi_encode_returns(&(contract.own_balance,))
        } else if data.starts_with(&Token::getTokenBalanceOfCall::SELECTOR) {
            let call = Token::getTokenBalanceOfCall::abi_decode(data.as_ref(), true)
                .map_err(|err| (-32000, format!("malformed calldata: {err}")))?;
            let balance = contract
                .holder_balances
                .get(&call.owner)
                .copied()
                .unwrap_or_default();
            Token::getTokenBalanceOfCall::abi_encode_returns(&(balance,))
        } else {
            return Err((-32000, "unsupported selector".to_owned()));
        };

        to_json(&Bytes::from(output))
    }

    fn handle_send_raw(&self, params: &Value) -> Result<Value, (i64, String)> {
        let raw: Bytes = param(params, 0)?;
        let tx = ExternalTransaction::decode(&raw)
            .map_err(|err| (-32602, format!("undecodable transaction: {err:#}")))?;

        if !tx.is_signed() {
            return Err((-32000, "unsigned transaction rejected".to_owned()));
        }
        if tx.chain_id != self.chain_id {
            return Err((
                -32000,
                format!("wrong chain id {} (expected {})", tx.chain_id, self.chain_id),
            ));
        }

        let hash = keccak256(&raw);
        let mut inner = self.inner.write().expect("mock network poisoned");

        // First transaction to a codeless address deploys it.
        if !inner.code.contains_key(&tx.to) {
            inner.code.insert(tx.to, pseudo_code(tx.to));
        }
        *inner.seqnos.entry(tx.to).or_insert(0) += 1;
        inner.receipts.insert(
            hash,
            TxReceipt {
                tx_hash: hash,
                success: true,
                gas_used: RECEIPT_GAS_USED,
                failure_reason: None,
            },
        );

        to_json(&hash)
    }

    fn handle_top_up(&self, params: &Value) -> Result<Value, (i64, String)> {
        let faucet: Address = param(params, 0)?;
        let recipient: Address = param(params, 1)?;
        let amount: U256 = param(params, 2)?;

        let mut inner = self.inner.write().expect("mock network poisoned");
        if !inner.faucets.values().any(|known| *known == faucet) {
            return Err((-32602, format!("unknown faucet address {faucet}")));
        }

        let base_faucet = inner.faucets.get("NIL").copied();
        if base_faucet == Some(faucet) {
            let balance = inner.balances.entry(recipient).or_default();
            *balance = balance.saturating_add(amount);
        } else {
            let holdings = inner.token_balances.entry(recipient).or_default();
            let balance = holdings.entry(faucet).or_default();
            *balance = balance.saturating_add(amount);
        }

        let hash = self.next_tx_hash();
        inner.receipts.insert(
            hash,
            TxReceipt {
                tx_hash: hash,
                success: true,
                gas_used: RECEIPT_GAS_USED,
                failure_reason: None,
            },
        );

        to_json(&hash)
    }
}

/// Deterministic faucet address for a token name.
pub fn faucet_address(name: &str) -> Address {
    Address::from_slice(&keccak256(format!("faucet:{name}"))[12..])
}

fn pseudo_code(address: Address) -> Bytes {
    Bytes::from(keccak256(address).to_vec())
}

fn param<T: serde::de::DeserializeOwned>(params: &Value, index: usize) -> Result<T, (i64, String)> {
    let value = params
        .as_array()
        .and_then(|array| array.get(index))
        .cloned()
        .ok_or((-32602, format!("missing parameter {index}")))?;
    serde_json::from_value(value).map_err(|err| (-32602, format!("invalid parameter {index}: {err}")))
}

fn field<T: serde::de::DeserializeOwned>(args: &Value, name: &str) -> Result<T, (i64, String)> {
    let value = args
        .get(name)
        .cloned()
        .ok_or((-32602, format!("missing field {name}")))?;
    serde_json::from_value(value).map_err(|err| (-32602, format!("invalid field {name}: {err}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, (i64, String)> {
    serde_json::to_value(value).map_err(|err| (-32603, format!("serialization failed: {err}")))
}

pub struct MockRpcServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockRpcServer {
    pub async fn start(network: MockNetwork) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock RPC listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read mock listener address")?;
        let std_listener = listener
            .into_std()
            .context("failed to convert mock listener")?;
        std_listener
            .set_nonblocking(true)
            .context("failed to set mock listener non-blocking")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let make_service = make_service_fn(move |_| {
            let network = network.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| serve_request(network.clone(), req)))
            }
        });

        let server = Server::from_tcp(std_listener)
            .context("failed to build mock HTTP server")?
            .serve(make_service);
        let graceful = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let handle = tokio::spawn(async move {
            if let Err(err) = graceful.await {
                eprintln!("mock RPC server stopped: {err}");
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn serve_request(
    network: MockNetwork,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    if req.method() != Method::POST {
        let mut response = Response::new(Body::from("Unsupported method"));
        *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        return Ok(response);
    }

    let headers = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    network.record_headers(headers);

    let bytes = match body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let mut response = Response::new(Body::from(format!("failed to read body: {err}")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(response);
        }
    };

    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            let mut response = Response::new(Body::from(format!("invalid JSON payload: {err}")));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return Ok(response);
        }
    };

    let response_value = if payload.is_array() {
        Value::Array(
            payload
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|call| network.handle_call(call))
                .collect(),
        )
    } else {
        network.handle_call(payload)
    };

    let mut response = Response::new(Body::from(response_value.to_string()));
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

fn success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id,
    })
}

fn error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message.into(),
        },
        "id": id,
    })
}
