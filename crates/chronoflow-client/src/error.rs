//! Client error types.

use alloy_primitives::B256;
use chronoflow_core::{CodecError, ConfigError, RevertReason};
use chronoflow_rpc::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A state-mutating call was attempted through a public client.
    #[error("{contract}.{function} mutates state and needs a wallet-bound client")]
    MissingAccount {
        contract: &'static str,
        function: String,
    },

    #[error("{contract}.{function} is not a read-only function")]
    NotReadOnly {
        contract: &'static str,
        function: String,
    },

    #[error("{contract}.{function} is read-only; call it with read()")]
    NotMutating {
        contract: &'static str,
        function: String,
    },

    #[error("{contract}.{function} is not payable")]
    NotPayable {
        contract: &'static str,
        function: String,
    },

    /// `eth_call` reverted; the payload was decoded against the interface.
    #[error("{contract}.{function} {reason}")]
    CallReverted {
        contract: &'static str,
        function: String,
        reason: RevertReason,
    },

    /// The transaction was mined with status 0.
    #[error("{contract}.{function} transaction {tx} reverted")]
    TransactionReverted {
        contract: &'static str,
        function: String,
        tx: B256,
    },

    #[error("expected {event} event in transaction {tx}")]
    MissingEvent { event: &'static str, tx: B256 },
}

impl ClientError {
    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            Self::CallReverted { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
