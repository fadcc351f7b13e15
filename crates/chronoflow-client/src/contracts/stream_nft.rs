use alloy_primitives::{Address, B256, U256};
use chronoflow_core::codec;
use chronoflow_core::{ContractKind, DynSolValue};
use chronoflow_rpc::TransactionReceipt;

use crate::client::Client;
use crate::error::ClientError;
use crate::handle::ContractHandle;

/// Typed handle for `StreamNFT`, the ERC-721 whose token ids are stream ids.
#[derive(Debug, Clone)]
pub struct StreamNft {
    inner: ContractHandle,
}

fn uint(v: U256) -> DynSolValue {
    DynSolValue::Uint(v, 256)
}

impl StreamNft {
    pub fn at(client: Client, address: Address) -> Self {
        Self {
            inner: ContractHandle::new(client, ContractKind::StreamNft, address),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.inner
    }

    async fn read_address(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<Address, ClientError> {
        let v = self.inner.read_one(function, args).await?;
        Ok(codec::as_address(&v, function)?)
    }

    async fn read_uint(&self, function: &str, args: &[DynSolValue]) -> Result<U256, ClientError> {
        let v = self.inner.read_one(function, args).await?;
        Ok(codec::as_uint(&v, function)?)
    }

    async fn read_string(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<String, ClientError> {
        let v = self.inner.read_one(function, args).await?;
        Ok(codec::as_string(&v, function)?)
    }

    async fn send(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<TransactionReceipt, ClientError> {
        self.inner.write(function, args).await?.confirm().await
    }

    pub async fn name(&self) -> Result<String, ClientError> {
        self.read_string("name", &[]).await
    }

    pub async fn symbol(&self) -> Result<String, ClientError> {
        self.read_string("symbol", &[]).await
    }

    pub async fn token_uri(&self, stream_id: U256) -> Result<String, ClientError> {
        self.read_string("tokenURI", &[uint(stream_id)]).await
    }

    /// The `ChronoFlowCore` allowed to mint and burn.
    pub async fn core_contract(&self) -> Result<Address, ClientError> {
        self.read_address("coreContract", &[]).await
    }

    pub async fn owner(&self) -> Result<Address, ClientError> {
        self.read_address("owner", &[]).await
    }

    pub async fn owner_of(&self, token_id: U256) -> Result<Address, ClientError> {
        self.read_address("ownerOf", &[uint(token_id)]).await
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, ClientError> {
        self.read_uint("balanceOf", &[DynSolValue::Address(owner)]).await
    }

    pub async fn get_approved(&self, token_id: U256) -> Result<Address, ClientError> {
        self.read_address("getApproved", &[uint(token_id)]).await
    }

    /// ERC-165 check for `interface_id`.
    pub async fn supports_interface(&self, interface_id: [u8; 4]) -> Result<bool, ClientError> {
        let mut word = B256::ZERO;
        word[..4].copy_from_slice(&interface_id);
        let v = self
            .inner
            .read_one("supportsInterface", &[DynSolValue::FixedBytes(word, 4)])
            .await?;
        Ok(codec::as_bool(&v, "supportsInterface")?)
    }

    pub async fn is_approved_for_all(
        &self,
        owner: Address,
        operator: Address,
    ) -> Result<bool, ClientError> {
        let v = self
            .inner
            .read_one(
                "isApprovedForAll",
                &[DynSolValue::Address(owner), DynSolValue::Address(operator)],
            )
            .await?;
        Ok(codec::as_bool(&v, "isApprovedForAll")?)
    }

    /// Point the NFT at its core contract. Owner only.
    pub async fn set_core_contract(
        &self,
        core: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send("setCoreContract", &[DynSolValue::Address(core)])
            .await
    }

    /// Mint `stream_id` to `recipient`. Only the core contract may call this.
    pub async fn mint(
        &self,
        recipient: Address,
        stream_id: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send("mint", &[DynSolValue::Address(recipient), uint(stream_id)])
            .await
    }

    /// Burn `stream_id`. Only the core contract may call this.
    pub async fn burn(&self, stream_id: U256) -> Result<TransactionReceipt, ClientError> {
        self.send("burn", &[uint(stream_id)]).await
    }

    pub async fn approve(
        &self,
        to: Address,
        token_id: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send("approve", &[DynSolValue::Address(to), uint(token_id)])
            .await
    }

    pub async fn set_approval_for_all(
        &self,
        operator: Address,
        approved: bool,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send(
            "setApprovalForAll",
            &[DynSolValue::Address(operator), DynSolValue::Bool(approved)],
        )
        .await
    }

    pub async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send(
            "transferFrom",
            &[DynSolValue::Address(from), DynSolValue::Address(to), uint(token_id)],
        )
        .await
    }

    /// The three-argument `safeTransferFrom` overload.
    pub async fn safe_transfer_from(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send(
            "safeTransferFrom",
            &[DynSolValue::Address(from), DynSolValue::Address(to), uint(token_id)],
        )
        .await
    }

    /// The four-argument overload, passing `data` to the receiver hook.
    pub async fn safe_transfer_from_with_data(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
        data: Vec<u8>,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send(
            "safeTransferFrom",
            &[
                DynSolValue::Address(from),
                DynSolValue::Address(to),
                uint(token_id),
                DynSolValue::Bytes(data),
            ],
        )
        .await
    }

    pub async fn transfer_ownership(
        &self,
        new_owner: Address,
    ) -> Result<TransactionReceipt, ClientError> {
        self.send("transferOwnership", &[DynSolValue::Address(new_owner)])
            .await
    }

    pub async fn renounce_ownership(&self) -> Result<TransactionReceipt, ClientError> {
        self.send("renounceOwnership", &[]).await
    }
}
