//! Generic contract handle: one interface bound to one address.

use alloy_json_abi::Function;
use alloy_primitives::{Address, B256, U256};
use chronoflow_core::codec::{self, DecodedLog};
use chronoflow_core::registry::is_read_only;
use chronoflow_core::revert::decode_revert;
use chronoflow_core::{ContractKind, DynSolValue, Interface};
use chronoflow_rpc::{EthClient, TransactionReceipt, TransactionRequest, TransportError};
use std::time::Duration;

use crate::client::Client;
use crate::error::ClientError;

/// A callable handle for one deployed contract.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    client: Client,
    kind: ContractKind,
    address: Address,
}

impl ContractHandle {
    /// Bind `client` to the interface of `kind` at `address`. Never fails.
    pub fn new(client: Client, kind: ContractKind, address: Address) -> Self {
        Self {
            client,
            kind,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    pub fn interface(&self) -> &'static Interface {
        self.kind.interface()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn function(&self, name: &str, arity: usize) -> Result<&'static Function, ClientError> {
        Ok(self.interface().function(name, arity)?)
    }

    /// Call a `view`/`pure` function with `eth_call`. No account is needed.
    pub async fn read(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ClientError> {
        let func = self.function(function, args.len())?;
        if !is_read_only(func) {
            return Err(ClientError::NotReadOnly {
                contract: self.kind.name(),
                function: func.name.clone(),
            });
        }
        self.call(func, args).await
    }

    /// [`read`](Self::read) a function with exactly one output.
    pub async fn read_one(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<DynSolValue, ClientError> {
        let values = self.read(function, args).await?;
        Ok(codec::single(values, function)?)
    }

    /// Dry-run a state-mutating function with `eth_call` from the client's
    /// account, returning its outputs or the decoded revert reason.
    pub async fn simulate(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ClientError> {
        let func = self.function(function, args.len())?;
        self.require_account(func)?;
        self.call(func, args).await
    }

    async fn call(
        &self,
        func: &Function,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, ClientError> {
        let calldata = codec::encode_call(func, args)?;
        let mut tx = TransactionRequest::call(self.address, calldata);
        tx.from = self.client.account();

        tracing::debug!(
            contract = self.kind.name(),
            address = %self.address,
            function = %func.name,
            "eth_call"
        );
        let output = self
            .client
            .eth()
            .call(&tx)
            .await
            .map_err(|e| self.map_revert(func, e))?;
        Ok(codec::decode_output(func, &output)?)
    }

    /// Send a non-payable transaction.
    pub async fn write(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<PendingTransaction, ClientError> {
        self.submit(function, args, None).await
    }

    /// Send a payable transaction carrying `value` wei.
    pub async fn write_payable(
        &self,
        function: &str,
        args: &[DynSolValue],
        value: U256,
    ) -> Result<PendingTransaction, ClientError> {
        self.submit(function, args, Some(value)).await
    }

    async fn submit(
        &self,
        function: &str,
        args: &[DynSolValue],
        value: Option<U256>,
    ) -> Result<PendingTransaction, ClientError> {
        let func = self.function(function, args.len())?;
        if is_read_only(func) {
            return Err(ClientError::NotMutating {
                contract: self.kind.name(),
                function: func.name.clone(),
            });
        }
        let from = self.require_account(func)?;
        if value.is_some_and(|v| !v.is_zero())
            && func.state_mutability != alloy_json_abi::StateMutability::Payable
        {
            return Err(ClientError::NotPayable {
                contract: self.kind.name(),
                function: func.name.clone(),
            });
        }

        let calldata = codec::encode_call(func, args)?;
        let mut tx = TransactionRequest::call(self.address, calldata).with_from(from);
        tx.value = value;

        let hash = self
            .client
            .eth()
            .send_transaction(&tx)
            .await
            .map_err(|e| self.map_revert(func, e))?;
        tracing::info!(
            contract = self.kind.name(),
            address = %self.address,
            function = %func.name,
            tx = %hash,
            "transaction sent"
        );

        Ok(PendingTransaction {
            eth: self.client.eth().clone(),
            contract: self.kind.name(),
            function: func.name.clone(),
            hash,
            poll_interval: self.client.poll_interval(),
        })
    }

    fn require_account(&self, func: &Function) -> Result<Address, ClientError> {
        self.client
            .account()
            .ok_or_else(|| ClientError::MissingAccount {
                contract: self.kind.name(),
                function: func.name.clone(),
            })
    }

    /// Turn an execution error carrying revert data into a decoded reason.
    fn map_revert(&self, func: &Function, err: TransportError) -> ClientError {
        match err.rpc_error().and_then(|e| e.revert_data()) {
            Some(data) => ClientError::CallReverted {
                contract: self.kind.name(),
                function: func.name.clone(),
                reason: decode_revert(&data, Some(self.interface())),
            },
            None => ClientError::Transport(err),
        }
    }

    /// Decode the receipt logs emitted by this contract. Unknown events are skipped.
    pub fn decode_logs(
        &self,
        receipt: &TransactionReceipt,
    ) -> Result<Vec<DecodedLog>, ClientError> {
        let mut out = Vec::new();
        for log in receipt.logs_from(self.address) {
            if let Some(decoded) = codec::decode_log(self.interface(), &log.topics, &log.data)? {
                out.push(decoded);
            }
        }
        Ok(out)
    }
}

/// A submitted transaction awaiting its receipt.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    eth: EthClient,
    contract: &'static str,
    function: String,
    hash: B256,
    poll_interval: Duration,
}

impl PendingTransaction {
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Wait for the receipt; a mined-but-reverted transaction is an error.
    pub async fn confirm(self) -> Result<TransactionReceipt, ClientError> {
        let receipt = self
            .eth
            .wait_for_receipt(self.hash, self.poll_interval)
            .await?;
        if !receipt.succeeded() {
            return Err(ClientError::TransactionReverted {
                contract: self.contract,
                function: self.function,
                tx: self.hash,
            });
        }
        Ok(receipt)
    }
}
