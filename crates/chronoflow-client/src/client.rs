//! Public and wallet-bound clients.

use alloy_primitives::Address;
use chronoflow_core::NetworkConfig;
use chronoflow_rpc::{EthClient, HttpTransport, RpcTransport};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ClientError;

/// Default receipt polling interval for writes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A connection to a node, optionally bound to a signing account.
///
/// The account must be managed by the node (e.g. an unlocked dev account):
/// writes are submitted with `eth_sendTransaction` and signed node-side.
#[derive(Debug, Clone)]
pub struct Client {
    eth: EthClient,
    account: Option<Address>,
    poll_interval: Duration,
}

impl Client {
    /// Read-only client.
    pub fn public(transport: Arc<dyn RpcTransport>) -> Self {
        Self::from_eth(EthClient::new(transport), None)
    }

    /// Client able to send transactions from `account`.
    pub fn wallet(transport: Arc<dyn RpcTransport>, account: Address) -> Self {
        Self::from_eth(EthClient::new(transport), Some(account))
    }

    pub fn from_eth(eth: EthClient, account: Option<Address>) -> Self {
        Self {
            eth,
            account,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Read-only client over HTTP to `network`'s endpoint.
    pub fn connect(network: &NetworkConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::default_for(network.rpc_url.clone())?;
        tracing::debug!(network = %network.name, url = %network.rpc_url, "connected public client");
        Ok(Self::public(Arc::new(transport)))
    }

    /// Wallet-bound client over HTTP to `network`'s endpoint.
    pub fn connect_wallet(network: &NetworkConfig, account: Address) -> Result<Self, ClientError> {
        let transport = HttpTransport::default_for(network.rpc_url.clone())?;
        tracing::debug!(
            network = %network.name,
            url = %network.rpc_url,
            %account,
            "connected wallet client"
        );
        Ok(Self::wallet(Arc::new(transport), account))
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Same connection, bound to `account`.
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn eth(&self) -> &EthClient {
        &self.eth
    }
}
