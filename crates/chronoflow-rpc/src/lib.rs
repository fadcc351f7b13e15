//! chronoflow-rpc: the network client underneath ChronoFlow handles.
//!
//! - [`RpcTransport`]: async trait every transport implements
//! - [`HttpTransport`]: `reqwest`-backed HTTP JSON-RPC transport
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`EthClient`]: typed `eth_*` calls over any transport
//! - [`TransportError`]: structured error type
//!
//! Retries, backoff and timeouts beyond the HTTP client's per-request
//! timeout are left to the node and the caller.

pub mod error;
pub mod eth;
pub mod http;
pub mod request;
pub mod transport;

pub use error::TransportError;
pub use eth::{EthClient, Log, TransactionReceipt, TransactionRequest};
pub use http::{HttpConfig, HttpTransport};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::RpcTransport;
