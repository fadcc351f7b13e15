//! A single-process stand-in for an EVM node running the ChronoFlow contracts.
//!
//! Only what the contracts' public surface needs is modelled: creations are
//! recognised by a tag byte at the end of the creation code, calls are
//! dispatched on the registered selectors, and every transaction is mined
//! immediately. The first receipt poll for each transaction answers `null`.

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chronoflow_core::revert::ERROR_STRING_SELECTOR;
use chronoflow_core::{ContractKind, DynSolValue, Interface};
use chronoflow_deploy::ArtifactStore;
use chronoflow_rpc::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcTransport, TransactionRequest,
    TransportError,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub const CHAIN_ID: u64 = 31337;
pub const DEPLOYER: Address = Address::repeat_byte(0xd0);
pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);

/// Creation code recognised by the node; the last byte says which contract.
pub fn creation_code(kind: ContractKind) -> Bytes {
    let tag = match kind {
        ContractKind::StreamNft => 1,
        ContractKind::Core => 2,
        ContractKind::Marketplace => 3,
    };
    Bytes::from(vec![0x60, 0x80, 0x60, 0x40, tag])
}

pub fn artifacts() -> ArtifactStore {
    ArtifactStore::from_bytecodes(ContractKind::ALL.map(|k| (k, creation_code(k))))
}

#[derive(Debug, Clone, Default)]
struct Stream {
    payer: Address,
    recipient: Address,
    deposit: U256,
    token: Address,
    start: U256,
    stop: U256,
    remaining: U256,
    withdrawn: U256,
}

enum Failure {
    /// Execution reverted; the node answers the request with an error.
    Revert(Bytes),
    /// The transaction is mined with status 0.
    Mined,
}

fn revert_msg(msg: &str) -> Failure {
    let mut data = ERROR_STRING_SELECTOR.to_vec();
    data.extend(DynSolValue::Tuple(vec![DynSolValue::String(msg.into())]).abi_encode_params());
    Failure::Revert(data.into())
}

fn revert_custom(kind: ContractKind, name: &str, args: Vec<DynSolValue>) -> Failure {
    let error = &Interface::get(kind).abi().errors[name][0];
    let mut data = error.selector().to_vec();
    data.extend(DynSolValue::Tuple(args).abi_encode_params());
    Failure::Revert(data.into())
}

fn uint(v: U256) -> DynSolValue {
    DynSolValue::Uint(v, 256)
}

fn word(id: U256) -> B256 {
    B256::from(id.to_be_bytes::<32>())
}

#[derive(Default)]
struct Chain {
    contracts: BTreeMap<Address, ContractKind>,
    next_contract: u8,
    next_tx: u64,
    receipts: HashMap<B256, Value>,
    polled: HashSet<B256>,

    nft_owner: Address,
    nft_core: Address,
    owners: BTreeMap<U256, Address>,
    approvals: BTreeMap<U256, Address>,
    operators: BTreeSet<(Address, Address)>,

    core_nft: Address,
    next_stream_id: U256,
    streams: BTreeMap<U256, Stream>,

    market_nft: Address,
    listings: BTreeMap<U256, (Address, U256)>,
}

struct Call<'a> {
    from: Address,
    to: Address,
    kind: ContractKind,
    function: &'a str,
    data: &'a [u8],
    value: U256,
}

impl Call<'_> {
    fn word(&self, i: usize) -> &[u8] {
        &self.data[4 + 32 * i..4 + 32 * (i + 1)]
    }

    fn u256(&self, i: usize) -> U256 {
        U256::from_be_slice(self.word(i))
    }

    fn address(&self, i: usize) -> Address {
        Address::from_slice(&self.word(i)[12..])
    }

    fn bool(&self, i: usize) -> bool {
        self.word(i)[31] == 1
    }
}

impl Chain {
    fn new() -> Self {
        Self {
            next_stream_id: U256::from(1),
            ..Default::default()
        }
    }

    fn new_hash(&mut self) -> B256 {
        self.next_tx += 1;
        B256::from(U256::from(self.next_tx).to_be_bytes::<32>())
    }

    fn create(&mut self, from: Address, code: &[u8]) -> Result<Address, Failure> {
        let tag = *code.get(4).ok_or(Failure::Mined)?;
        if code.len() != 5 + 32 || code[..4] != [0x60, 0x80, 0x60, 0x40] {
            return Err(Failure::Mined);
        }
        let kind = match tag {
            1 => ContractKind::StreamNft,
            2 => ContractKind::Core,
            3 => ContractKind::Marketplace,
            _ => return Err(Failure::Mined),
        };
        let arg = Address::from_slice(&code[5 + 12..]);
        self.next_contract += 1;
        let address = Address::repeat_byte(0x10 + self.next_contract);
        match kind {
            ContractKind::StreamNft => {
                self.nft_owner = from;
                self.nft_core = arg;
            }
            ContractKind::Core => self.core_nft = arg,
            ContractKind::Marketplace => self.market_nft = arg,
        }
        self.contracts.insert(address, kind);
        Ok(address)
    }

    fn resolve<'a>(
        &self,
        to: Address,
        data: &'a [u8],
    ) -> Option<(ContractKind, &'static str, &'a [u8])> {
        let kind = *self.contracts.get(&to)?;
        let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
        let func = Interface::get(kind).function_by_selector(selector)?;
        Some((kind, func.name.as_str(), data))
    }

    fn owner_of(&self, id: U256) -> Result<Address, Failure> {
        self.owners.get(&id).copied().ok_or_else(|| {
            revert_custom(
                ContractKind::StreamNft,
                "ERC721NonexistentToken",
                vec![uint(id)],
            )
        })
    }

    fn approved(&self, owner: Address, operator: Address, id: U256) -> bool {
        self.approvals.get(&id) == Some(&operator) || self.operators.contains(&(owner, operator))
    }

    /// Execute a state-changing call; returns the emitted logs.
    fn execute(&mut self, call: &Call<'_>) -> Result<Vec<Value>, Failure> {
        let nft = self
            .contracts
            .iter()
            .find(|(_, k)| **k == ContractKind::StreamNft)
            .map(|(a, _)| *a)
            .unwrap_or_default();
        let event = |kind: ContractKind, name: &str| {
            Interface::get(kind).event(name).unwrap().selector()
        };

        match (call.kind, call.function) {
            (ContractKind::StreamNft, "setCoreContract") => {
                if call.from != self.nft_owner {
                    return Err(revert_custom(
                        ContractKind::StreamNft,
                        "OwnableUnauthorizedAccount",
                        vec![DynSolValue::Address(call.from)],
                    ));
                }
                self.nft_core = call.address(0);
                Ok(vec![])
            }
            (ContractKind::StreamNft, "approve") => {
                let id = call.u256(1);
                if self.owner_of(id)? != call.from {
                    return Err(revert_msg("not token owner"));
                }
                self.approvals.insert(id, call.address(0));
                Ok(vec![])
            }
            (ContractKind::StreamNft, "setApprovalForAll") => {
                let pair = (call.from, call.address(0));
                if call.bool(1) {
                    self.operators.insert(pair);
                } else {
                    self.operators.remove(&pair);
                }
                Ok(vec![])
            }
            (ContractKind::Core, "createStream") => {
                let recipient = call.address(0);
                let deposit = call.u256(1);
                let (start, stop) = (call.u256(3), call.u256(4));
                if recipient == Address::ZERO {
                    return Err(revert_msg("Stream to the zero address"));
                }
                if deposit.is_zero() {
                    return Err(revert_msg("Deposit is zero"));
                }
                if stop <= start {
                    return Err(revert_msg("Stop time before start time"));
                }
                let id = self.next_stream_id;
                self.next_stream_id += U256::from(1);
                let stream = Stream {
                    payer: call.from,
                    recipient,
                    deposit,
                    token: call.address(2),
                    start,
                    stop,
                    remaining: deposit,
                    withdrawn: U256::ZERO,
                };
                self.streams.insert(id, stream.clone());
                self.owners.insert(id, recipient);

                let data = DynSolValue::Tuple(vec![
                    uint(deposit),
                    DynSolValue::Address(stream.token),
                    uint(start),
                    uint(stop),
                ])
                .abi_encode_params();
                Ok(vec![
                    json!({
                        "address": nft,
                        "topics": [
                            event(ContractKind::StreamNft, "Transfer"),
                            Address::ZERO.into_word(),
                            recipient.into_word(),
                            word(id),
                        ],
                        "data": Bytes::new(),
                    }),
                    json!({
                        "address": call.to,
                        "topics": [
                            event(ContractKind::Core, "StreamCreated"),
                            word(id),
                            call.from.into_word(),
                            recipient.into_word(),
                        ],
                        "data": Bytes::from(data),
                    }),
                ])
            }
            (ContractKind::Core, "withdrawFromStream") => {
                let (id, amount) = (call.u256(0), call.u256(1));
                let recipient = self.owner_of(id)?;
                let stream = self
                    .streams
                    .get_mut(&id)
                    .ok_or_else(|| revert_msg("Stream does not exist"))?;
                if call.from != recipient {
                    return Err(revert_msg("Caller is not the stream recipient"));
                }
                if amount > stream.remaining {
                    return Err(revert_msg("Amount exceeds available balance"));
                }
                stream.remaining -= amount;
                stream.withdrawn += amount;
                Ok(vec![])
            }
            (ContractKind::Marketplace, "listNFT") => {
                let (id, price) = (call.u256(0), call.u256(1));
                let owner = self.owner_of(id)?;
                if owner != call.from {
                    return Err(revert_msg("Not the owner"));
                }
                if !self.approved(owner, call.to, id) {
                    return Err(revert_msg("Marketplace not approved"));
                }
                self.listings.insert(id, (call.from, price));
                Ok(vec![json!({
                    "address": call.to,
                    "topics": [
                        event(ContractKind::Marketplace, "Listed"),
                        word(id),
                        call.from.into_word(),
                    ],
                    "data": Bytes::from(uint(price).abi_encode()),
                })])
            }
            (ContractKind::Marketplace, "unlistNFT") => {
                let id = call.u256(0);
                match self.listings.get(&id) {
                    Some((seller, _)) if *seller == call.from => {
                        self.listings.remove(&id);
                        Ok(vec![])
                    }
                    _ => Err(revert_msg("Not the seller")),
                }
            }
            (ContractKind::Marketplace, "buyNFT") => {
                let id = call.u256(0);
                let (_, price) = *self
                    .listings
                    .get(&id)
                    .ok_or_else(|| revert_msg("Not listed"))?;
                if call.value != price {
                    return Err(revert_msg("Incorrect price"));
                }
                self.listings.remove(&id);
                self.owners.insert(id, call.from);
                self.approvals.remove(&id);
                Ok(vec![])
            }
            _ => Err(Failure::Revert(Bytes::new())),
        }
    }

    /// Answer an `eth_call` to a view function.
    fn view(&self, call: &Call<'_>) -> Result<Vec<DynSolValue>, Failure> {
        let addr = DynSolValue::Address;
        Ok(match (call.kind, call.function) {
            (ContractKind::StreamNft, "coreContract") => vec![addr(self.nft_core)],
            (ContractKind::StreamNft, "owner") => vec![addr(self.nft_owner)],
            (ContractKind::StreamNft, "ownerOf") => vec![addr(self.owner_of(call.u256(0))?)],
            (ContractKind::StreamNft, "getApproved") => {
                let id = call.u256(0);
                self.owner_of(id)?;
                vec![addr(self.approvals.get(&id).copied().unwrap_or_default())]
            }
            (ContractKind::StreamNft, "name") => {
                vec![DynSolValue::String("ChronoFlow Stream".into())]
            }
            (ContractKind::StreamNft, "symbol") => vec![DynSolValue::String("CFS".into())],
            (ContractKind::Core, "nextStreamId") => vec![uint(self.next_stream_id)],
            (ContractKind::Core, "streamNFT") => vec![addr(self.core_nft)],
            (ContractKind::Core, "streams") => {
                let s = self.streams.get(&call.u256(0)).cloned().unwrap_or_default();
                vec![
                    addr(s.payer),
                    addr(s.recipient),
                    uint(s.deposit),
                    addr(s.token),
                    uint(s.start),
                    uint(s.stop),
                    uint(s.remaining),
                    uint(s.withdrawn),
                ]
            }
            (ContractKind::Core, "streamableBalanceOf") => {
                let s = self
                    .streams
                    .get(&call.u256(0))
                    .ok_or_else(|| revert_msg("Stream does not exist"))?;
                vec![uint(s.remaining)]
            }
            (ContractKind::Marketplace, "streamNFT") => vec![addr(self.market_nft)],
            (ContractKind::Marketplace, "listings") => {
                let (seller, price) = self
                    .listings
                    .get(&call.u256(0))
                    .copied()
                    .unwrap_or_default();
                vec![addr(seller), uint(price)]
            }
            _ => return Err(Failure::Revert(Bytes::new())),
        })
    }
}

/// The simulated node.
pub struct SimNode {
    chain: Mutex<Chain>,
    requests: AtomicUsize,
    accounts: Vec<Address>,
    omit_contract_address: AtomicBool,
}

impl SimNode {
    pub fn new() -> std::sync::Arc<Self> {
        Self::with_accounts(vec![DEPLOYER, ALICE, BOB])
    }

    /// A node whose `eth_accounts` lists exactly `accounts`.
    pub fn with_accounts(accounts: Vec<Address>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            chain: Mutex::new(Chain::new()),
            requests: AtomicUsize::new(0),
            accounts,
            omit_contract_address: AtomicBool::new(false),
        })
    }

    /// Leave `contractAddress` out of later creation receipts.
    pub fn omit_contract_address(&self) {
        self.omit_contract_address.store(true, Ordering::SeqCst);
    }

    /// Number of requests answered so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn code_at(&self, address: Address) -> Option<ContractKind> {
        self.chain.lock().unwrap().contracts.get(&address).copied()
    }

    fn handle(&self, method: &str, params: &[Value]) -> Result<Value, JsonRpcError> {
        match method {
            "eth_chainId" => Ok(json!(format!("0x{CHAIN_ID:x}"))),
            "eth_accounts" => Ok(json!(self.accounts)),
            "eth_sendTransaction" => self.send_transaction(tx_param(params)?),
            "eth_call" => self.call(tx_param(params)?),
            "eth_getTransactionReceipt" => {
                let hash: B256 = serde_json::from_value(params[0].clone()).map_err(invalid)?;
                let mut chain = self.chain.lock().unwrap();
                if chain.polled.insert(hash) {
                    return Ok(Value::Null);
                }
                Ok(chain.receipts.get(&hash).cloned().unwrap_or(Value::Null))
            }
            other => Err(JsonRpcError {
                code: -32601,
                message: format!("method {other} not supported"),
                data: None,
            }),
        }
    }

    fn send_transaction(&self, tx: TransactionRequest) -> Result<Value, JsonRpcError> {
        let from = tx.from.ok_or_else(|| invalid("missing from"))?;
        if !self.accounts.contains(&from) {
            return Err(invalid("unknown account"));
        }
        let data = tx.data.unwrap_or_default();
        let mut chain = self.chain.lock().unwrap();

        let (outcome, created) = match tx.to {
            None => match chain.create(from, &data) {
                Ok(address) => (Ok(vec![]), Some(address)),
                Err(e) => (Err(e), None),
            },
            Some(to) => match chain.resolve(to, &data) {
                Some((kind, function, data)) => {
                    let call = Call {
                        from,
                        to,
                        kind,
                        function,
                        data,
                        value: tx.value.unwrap_or_default(),
                    };
                    (chain.execute(&call), None)
                }
                None => (Err(Failure::Revert(Bytes::new())), None),
            },
        };

        let logs = match outcome {
            Ok(logs) => logs,
            Err(Failure::Revert(data)) => return Err(execution_reverted(data)),
            Err(Failure::Mined) => {
                let hash = chain.new_hash();
                let receipt = json!({
                    "transactionHash": hash,
                    "blockNumber": format!("0x{:x}", chain.next_tx),
                    "status": "0x0",
                    "logs": [],
                });
                chain.receipts.insert(hash, receipt);
                return Ok(json!(hash));
            }
        };

        let created = created.filter(|_| !self.omit_contract_address.load(Ordering::SeqCst));
        let hash = chain.new_hash();
        let receipt = json!({
            "transactionHash": hash,
            "blockNumber": format!("0x{:x}", chain.next_tx),
            "contractAddress": created,
            "status": "0x1",
            "gasUsed": "0x5208",
            "logs": logs,
        });
        chain.receipts.insert(hash, receipt);
        Ok(json!(hash))
    }

    fn call(&self, tx: TransactionRequest) -> Result<Value, JsonRpcError> {
        let to = tx.to.ok_or_else(|| invalid("eth_call without to"))?;
        let data = tx.data.unwrap_or_default();
        let chain = self.chain.lock().unwrap();
        let Some((kind, function, data)) = chain.resolve(to, &data) else {
            // No code or unknown selector: empty success, like a real node.
            return Ok(json!(Bytes::new()));
        };
        let call = Call {
            from: tx.from.unwrap_or_default(),
            to,
            kind,
            function,
            data,
            value: U256::ZERO,
        };
        match chain.view(&call) {
            Ok(values) => Ok(json!(Bytes::from(
                DynSolValue::Tuple(values).abi_encode_params()
            ))),
            Err(Failure::Revert(data)) => Err(execution_reverted(data)),
            Err(Failure::Mined) => Err(execution_reverted(Bytes::new())),
        }
    }
}

fn tx_param(params: &[Value]) -> Result<TransactionRequest, JsonRpcError> {
    let first = params.first().ok_or_else(|| invalid("missing params"))?;
    serde_json::from_value(first.clone()).map_err(invalid)
}

fn invalid(e: impl std::fmt::Display) -> JsonRpcError {
    JsonRpcError {
        code: -32602,
        message: e.to_string(),
        data: None,
    }
}

fn execution_reverted(data: Bytes) -> JsonRpcError {
    JsonRpcError {
        code: 3,
        message: "execution reverted".into(),
        data: Some(json!(data)),
    }
}

#[async_trait]
impl RpcTransport for SimNode {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(match self.handle(&req.method, &req.params) {
            Ok(v) => JsonRpcResponse::success(req.id, v),
            Err(e) => JsonRpcResponse::failure(req.id, e),
        })
    }

    fn url(&self) -> &str {
        "sim://chronoflow"
    }
}
