//! Deployment error types.

use alloy_primitives::{Address, B256};
use chronoflow_client::ClientError;
use chronoflow_core::{CodecError, ConfigError};
use chronoflow_rpc::TransportError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or reading compiled contract artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no artifact for {contract} under {dir}")]
    NotFound {
        contract: &'static str,
        dir: PathBuf,
    },

    #[error("artifact for {contract} has no creation bytecode")]
    MissingBytecode { contract: &'static str },

    #[error("artifact for {contract} has unlinked library placeholders")]
    UnlinkedLibraries { contract: &'static str },

    #[error("invalid bytecode for {contract}: {reason}")]
    InvalidBytecode {
        contract: &'static str,
        reason: String,
    },
}

/// Why a single deployment step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("transaction {tx} reverted")]
    Reverted { tx: B256 },

    #[error("receipt of creation transaction {tx} has no contract address")]
    NoContractAddress { tx: B256 },
}

/// A contract created before a deployment failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub future: String,
    pub address: Address,
}

#[derive(Debug, Error)]
pub enum DeployError {
    /// A stage failed; later stages were not run and nothing was rolled back.
    #[error(
        "stage {stage} ({future}) failed: {source}; already created: [{}]",
        created_list(completed)
    )]
    StageFailed {
        stage: usize,
        future: String,
        #[source]
        source: StepError,
        completed: Vec<Created>,
    },

    /// An argument refers to a step that has not run.
    #[error("{step} references {future} before it is deployed")]
    UnresolvedFuture { step: String, future: String },

    #[error("future id {0} is declared twice")]
    DuplicateFuture(String),

    #[error("{step}: {reason}")]
    InvalidStep { step: String, reason: String },

    #[error("no deploying account: set deploy.from or unlock an account on the node")]
    NoAccount,

    #[error("deployment produced no address for {0}")]
    MissingContract(&'static str),

    #[error("link check failed: {what} is {actual}, expected {expected}")]
    LinkMismatch {
        what: &'static str,
        expected: Address,
        actual: Address,
    },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DeployError {
    /// Contracts already on-chain when a stage failed.
    pub fn completed(&self) -> &[Created] {
        match self {
            Self::StageFailed { completed, .. } => completed,
            _ => &[],
        }
    }
}

fn created_list(completed: &[Created]) -> String {
    completed
        .iter()
        .map(|c| format!("{} at {}", c.future, c.address))
        .collect::<Vec<_>>()
        .join(", ")
}
