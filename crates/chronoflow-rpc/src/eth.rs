//! Typed `eth_*` calls over an [`RpcTransport`].

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::HttpTransport;
use crate::request::JsonRpcRequest;
use crate::transport::RpcTransport;

/// Transaction fields for `eth_call`, `eth_estimateGas` and `eth_sendTransaction`.
///
/// A request without `to` is a contract creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
}

impl TransactionRequest {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            data: Some(data.into()),
            ..Default::default()
        }
    }

    pub fn create(from: Address, init_code: impl Into<Bytes>) -> Self {
        Self {
            from: Some(from),
            data: Some(init_code.into()),
            ..Default::default()
        }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// An event log entry of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// The subset of a transaction receipt ChronoFlow needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `0x1` on success, `0x0` on revert.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    /// Receipts without a status field predate EIP-658 and count as success.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s.to::<u64>() == 1)
    }

    /// Logs emitted by `address`.
    pub fn logs_from(&self, address: Address) -> impl Iterator<Item = &Log> {
        self.logs.iter().filter(move |l| l.address == address)
    }
}

/// Typed Ethereum JSON-RPC client.
///
/// Cheap to clone; clones share the transport and the request-id counter.
#[derive(Clone)]
pub struct EthClient {
    transport: Arc<dyn RpcTransport>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for EthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthClient")
            .field("url", &self.transport.url())
            .finish()
    }
}

impl EthClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Client over an HTTP transport with default settings.
    pub fn http(url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::default_for(url)?)))
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// Call `method` and deserialize the result.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let resp = self
            .transport
            .send(JsonRpcRequest::new(id, method, params))
            .await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        serde_json::from_value(result).map_err(TransportError::Deserialization)
    }

    pub async fn chain_id(&self) -> Result<u64, TransportError> {
        let id: U64 = self.request("eth_chainId", vec![]).await?;
        Ok(id.to::<u64>())
    }

    pub async fn block_number(&self) -> Result<u64, TransportError> {
        let n: U64 = self.request("eth_blockNumber", vec![]).await?;
        Ok(n.to::<u64>())
    }

    /// Accounts managed by the node.
    pub async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        self.request("eth_accounts", vec![]).await
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes, TransportError> {
        self.request("eth_getCode", vec![json!(address), json!("latest")])
            .await
    }

    /// Execute a read-only call against the latest block.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, TransportError> {
        self.request("eth_call", vec![serde_json::to_value(tx)?, json!("latest")])
            .await
    }

    /// Submit a transaction signed by a node-managed account.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, TransportError> {
        self.request("eth_sendTransaction", vec![serde_json::to_value(tx)?])
            .await
    }

    /// `None` until the transaction is mined.
    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, TransportError> {
        self.request("eth_getTransactionReceipt", vec![json!(hash)])
            .await
    }

    /// Poll until the receipt for `hash` is available.
    ///
    /// There is no deadline: a transaction that is never mined is polled forever.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt, TransportError> {
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                tracing::debug!(
                    tx = %hash,
                    block = ?receipt.block_number,
                    success = receipt.succeeded(),
                    "receipt available"
                );
                return Ok(receipt);
            }
            tracing::trace!(tx = %hash, "receipt pending");
            tokio::time::sleep(poll_interval).await;
        }
    }
}
