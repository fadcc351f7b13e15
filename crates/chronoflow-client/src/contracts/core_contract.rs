use alloy_primitives::{Address, B256, U256};
use chronoflow_core::codec;
use chronoflow_core::{ContractKind, CreateStreamParams, DynSolValue, StreamRecord};
use chronoflow_rpc::TransactionReceipt;

use crate::client::Client;
use crate::error::ClientError;
use crate::handle::ContractHandle;

/// Typed handle for `ChronoFlowCore`.
#[derive(Debug, Clone)]
pub struct ChronoFlowCore {
    inner: ContractHandle,
}

/// Result of a confirmed `createStream`.
#[derive(Debug, Clone)]
pub struct CreatedStream {
    pub stream_id: U256,
    pub receipt: TransactionReceipt,
}

impl CreatedStream {
    pub fn tx(&self) -> B256 {
        self.receipt.transaction_hash
    }
}

impl ChronoFlowCore {
    pub fn at(client: Client, address: Address) -> Self {
        Self {
            inner: ContractHandle::new(client, ContractKind::Core, address),
        }
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    pub fn handle(&self) -> &ContractHandle {
        &self.inner
    }

    /// Id the next `createStream` will assign.
    pub async fn next_stream_id(&self) -> Result<U256, ClientError> {
        let v = self.inner.read_one("nextStreamId", &[]).await?;
        Ok(codec::as_uint(&v, "nextStreamId")?)
    }

    /// Address of the linked `StreamNFT`.
    pub async fn stream_nft(&self) -> Result<Address, ClientError> {
        let v = self.inner.read_one("streamNFT", &[]).await?;
        Ok(codec::as_address(&v, "streamNFT")?)
    }

    /// The stored record for `stream_id`. Unknown ids read back zeroed.
    pub async fn streams(&self, stream_id: U256) -> Result<StreamRecord, ClientError> {
        let values = self
            .inner
            .read("streams", &[DynSolValue::Uint(stream_id, 256)])
            .await?;
        Ok(StreamRecord::from_outputs(&values)?)
    }

    pub async fn streamable_balance_of(&self, stream_id: U256) -> Result<U256, ClientError> {
        let v = self
            .inner
            .read_one("streamableBalanceOf", &[DynSolValue::Uint(stream_id, 256)])
            .await?;
        Ok(codec::as_uint(&v, "streamableBalanceOf")?)
    }

    /// Create a stream and wait for it to be mined.
    ///
    /// The new id is taken from the `StreamCreated` event in the receipt.
    pub async fn create_stream(
        &self,
        params: &CreateStreamParams,
    ) -> Result<CreatedStream, ClientError> {
        let receipt = self
            .inner
            .write("createStream", &params.to_args())
            .await?
            .confirm()
            .await?;

        let created = self
            .inner
            .decode_logs(&receipt)?
            .into_iter()
            .find(|log| log.event == "StreamCreated")
            .ok_or(ClientError::MissingEvent {
                event: "StreamCreated",
                tx: receipt.transaction_hash,
            })?;
        let stream_id = created
            .field("streamId")
            .ok_or(ClientError::MissingEvent {
                event: "StreamCreated",
                tx: receipt.transaction_hash,
            })
            .and_then(|v| Ok(codec::as_uint(v, "streamId")?))?;

        tracing::info!(stream_id = %stream_id, tx = %receipt.transaction_hash, "stream created");
        Ok(CreatedStream { stream_id, receipt })
    }

    pub async fn withdraw_from_stream(
        &self,
        stream_id: U256,
        amount: U256,
    ) -> Result<TransactionReceipt, ClientError> {
        self.inner
            .write(
                "withdrawFromStream",
                &[DynSolValue::Uint(stream_id, 256), DynSolValue::Uint(amount, 256)],
            )
            .await?
            .confirm()
            .await
    }
}
