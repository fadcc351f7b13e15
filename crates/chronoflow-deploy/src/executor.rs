//! Runs a [`DeploymentModule`] step by step.
//!
//! Steps execute strictly in declaration order; each waits for its receipt
//! before the next one starts. The first failure aborts the run and is
//! reported as [`DeployError::StageFailed`] with the contracts created so far.
//! Nothing is retried and nothing is undone.

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use chronoflow_core::codec;
use chronoflow_core::{ContractKind, DynSolValue, Interface};
use chronoflow_rpc::{EthClient, TransactionRequest};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::artifacts::ArtifactStore;
use crate::error::{Created, DeployError, StepError};
use crate::module::{Arg, ContractFuture, DeploymentModule, Step};

/// Chain-facing side of the executor.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Submit a contract creation and return the new contract's address once mined.
    async fn create(&self, kind: ContractKind, init_code: Bytes) -> Result<Address, StepError>;

    /// Submit a call and return its transaction hash once mined.
    async fn send(&self, to: Address, calldata: Bytes) -> Result<B256, StepError>;
}

/// [`Deployer`] over JSON-RPC, signing with a node-managed account.
#[derive(Debug, Clone)]
pub struct RpcDeployer {
    eth: EthClient,
    from: Address,
    poll_interval: Duration,
}

impl RpcDeployer {
    pub fn new(eth: EthClient, from: Address, poll_interval: Duration) -> Self {
        Self {
            eth,
            from,
            poll_interval,
        }
    }

    /// Use `from` if given, else the node's first account.
    pub async fn connect(
        eth: EthClient,
        from: Option<Address>,
        poll_interval: Duration,
    ) -> Result<Self, DeployError> {
        let from = match from {
            Some(a) => a,
            None => *eth
                .accounts()
                .await?
                .first()
                .ok_or(DeployError::NoAccount)?,
        };
        tracing::info!(url = eth.url(), %from, "deploying account");
        Ok(Self::new(eth, from, poll_interval))
    }

    pub fn account(&self) -> Address {
        self.from
    }

    pub fn eth(&self) -> &EthClient {
        &self.eth
    }

    async fn submit(
        &self,
        tx: TransactionRequest,
    ) -> Result<chronoflow_rpc::TransactionReceipt, StepError> {
        let hash = self.eth.send_transaction(&tx).await?;
        tracing::debug!(tx = %hash, "submitted");
        let receipt = self.eth.wait_for_receipt(hash, self.poll_interval).await?;
        if !receipt.succeeded() {
            return Err(StepError::Reverted { tx: hash });
        }
        Ok(receipt)
    }
}

#[async_trait]
impl Deployer for RpcDeployer {
    async fn create(&self, kind: ContractKind, init_code: Bytes) -> Result<Address, StepError> {
        tracing::debug!(contract = kind.name(), size = init_code.len(), "creating");
        let receipt = self
            .submit(TransactionRequest::create(self.from, init_code))
            .await?;
        receipt
            .contract_address
            .ok_or(StepError::NoContractAddress {
                tx: receipt.transaction_hash,
            })
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<B256, StepError> {
        let receipt = self
            .submit(TransactionRequest::call(to, calldata).with_from(self.from))
            .await?;
        Ok(receipt.transaction_hash)
    }
}

/// Addresses and transactions produced by one run.
#[derive(Debug, Clone, Default)]
pub struct DeploymentResult {
    pub module: String,
    /// Future id to address.
    pub contracts: BTreeMap<String, Address>,
    /// Call step id to transaction hash.
    pub calls: BTreeMap<String, B256>,
}

impl DeploymentResult {
    pub fn address(&self, future: &ContractFuture) -> Option<Address> {
        self.contracts.get(future.id()).copied()
    }
}

/// Executes modules against a [`Deployer`].
pub struct Executor<D> {
    artifacts: ArtifactStore,
    deployer: D,
}

impl<D: Deployer> Executor<D> {
    pub fn new(artifacts: ArtifactStore, deployer: D) -> Self {
        Self {
            artifacts,
            deployer,
        }
    }

    pub fn deployer(&self) -> &D {
        &self.deployer
    }

    /// Run every step of `module` in order.
    pub async fn run(&self, module: &DeploymentModule) -> Result<DeploymentResult, DeployError> {
        let mut result = DeploymentResult {
            module: module.name().to_string(),
            ..Default::default()
        };
        let mut completed: Vec<Created> = Vec::new();

        for (index, step) in module.steps().iter().enumerate() {
            let stage = index + 1;
            tracing::info!(stage, step = step.id(), "running");

            let outcome = match step {
                Step::Deploy { future, args } => {
                    let args = resolve(step, args, &result)?;
                    self.create(future, &args).await.map(|address| {
                        tracing::info!(
                            stage,
                            contract = future.kind().name(),
                            %address,
                            "deployed"
                        );
                        result.contracts.insert(future.id().to_string(), address);
                        completed.push(Created {
                            future: future.id().to_string(),
                            address,
                        });
                    })
                }
                Step::Call {
                    id,
                    target,
                    function,
                    args,
                } => {
                    let to = lookup(step, target, &result)?;
                    let args = resolve(step, args, &result)?;
                    self.call(target.kind(), to, function, &args).await.map(|tx| {
                        tracing::info!(stage, %to, function = %function, %tx, "called");
                        result.calls.insert(id.clone(), tx);
                    })
                }
            };

            if let Err(source) = outcome {
                tracing::error!(
                    stage,
                    step = step.id(),
                    error = %source,
                    created = completed.len(),
                    "deployment aborted"
                );
                return Err(DeployError::StageFailed {
                    stage,
                    future: step.id().to_string(),
                    source,
                    completed,
                });
            }
        }
        Ok(result)
    }

    async fn create(
        &self,
        future: &ContractFuture,
        args: &[DynSolValue],
    ) -> Result<Address, StepError> {
        let kind = future.kind();
        let mut init_code = self.artifacts.bytecode(kind)?.to_vec();
        init_code.extend(codec::encode_constructor(Interface::get(kind), args)?);
        self.deployer.create(kind, init_code.into()).await
    }

    async fn call(
        &self,
        kind: ContractKind,
        to: Address,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<B256, StepError> {
        let func = Interface::get(kind).function(function, args.len())?;
        let calldata = codec::encode_call(func, args)?;
        self.deployer.send(to, calldata.into()).await
    }
}

fn lookup(
    step: &Step,
    future: &ContractFuture,
    result: &DeploymentResult,
) -> Result<Address, DeployError> {
    result
        .address(future)
        .ok_or_else(|| DeployError::UnresolvedFuture {
            step: step.id().to_string(),
            future: future.id().to_string(),
        })
}

fn resolve(
    step: &Step,
    args: &[Arg],
    result: &DeploymentResult,
) -> Result<Vec<DynSolValue>, DeployError> {
    args.iter()
        .map(|arg| match arg {
            Arg::Value(v) => Ok(v.clone()),
            Arg::Contract(f) => lookup(step, f, result).map(DynSolValue::Address),
        })
        .collect()
}
