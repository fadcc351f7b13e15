use alloy_primitives::{Address, U256};
use chronoflow_core::codec;
use chronoflow_core::{ContractKind, DynSolValue, ListingRecord};
use chronoflow_rpc::TransactionReceipt;

use crate::client::Client;
use crate::error::ClientError;
use crate::handle::ContractHandle;

/// Typed handle for `ChronoFlowMarketplace`.
#[derive(Debug, Clone)]
pub struct Marketplace {
    inner: ContractHandle,
}

impl Marketplace {
    pub fn at(client: Client, address: Address) -> Self {
        Self {
            inner: ContractHandle::new(client, ContractKind::Marketplace, address),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.inner
    }

    pub async fn stream_nft(&self) -> Result<Address, ClientError> {
        let v = self.inner.read_one("streamNFT", &[]).await?;
        Ok(codec::as_address(&v, "streamNFT")?)
    }

    /// Current listing of `token_id`; inactive listings have a zero seller.
    pub async fn listings(&self, token_id: U256) -> Result<ListingRecord, ClientError> {
        let values = self
            .inner
            .read("listings", &[DynSolValue::Uint(token_id, 256)])
            .await?;
        Ok(ListingRecord::from_outputs(&values)?)
    }

    /// List a stream token for `price` wei. The marketplace must be approved
    /// on the NFT first.
    pub async fn list_nft(
        &self,
        token_id: U256,
        price: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.inner
            .write(
                "listNFT",
                &[DynSolValue::Uint(token_id, 256), DynSolValue::Uint(price, 256)],
            )
            .await?
            .confirm()
            .await
    }

    pub async fn unlist_nft(&self, token_id: U256) -> Result<TransactionReceipt, ClientError> {
        self.inner
            .write("unlistNFT", &[DynSolValue::Uint(token_id, 256)])
            .await?
            .confirm()
            .await
    }

    /// Buy a listed token, paying `value` wei.
    pub async fn buy_nft(
        &self,
        token_id: U256,
        value: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.inner
            .write_payable("buyNFT", &[DynSolValue::Uint(token_id, 256)], value)
            .await?
            .confirm()
            .await
    }
}
